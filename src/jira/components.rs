use std::sync::Arc;

use url::form_urlencoded;

use crate::cache::CacheLayer;
use crate::error::{JiraError, Result};

use super::api_types::{ApiComponent, ApiComponentCreateRequest};
use super::cache::JiraCacheKey;
use super::client::JiraRestClient;
use super::transport::Method;
use super::types::{ProjectComponent, ProjectComponentCreationInfo};

const COMPONENT_PATH: &str = "/rest/api/2/component";

/// Project components, cached per project key.
#[derive(Clone)]
pub struct ProjectComponentService {
  client: Arc<JiraRestClient>,
  cache: CacheLayer<ProjectComponent>,
}

impl ProjectComponentService {
  pub fn new(client: Arc<JiraRestClient>) -> Self {
    Self {
      client,
      cache: CacheLayer::new(),
    }
  }

  pub(crate) fn cache(&self) -> &CacheLayer<ProjectComponent> {
    &self.cache
  }

  /// Create a component and add it to its project's cached components.
  pub async fn create(&self, info: &ProjectComponentCreationInfo) -> Result<ProjectComponent> {
    if info.name.is_empty() {
      return Err(JiraError::invalid_usage("Component name must be supplied."));
    }
    if info.project_key.is_empty() {
      return Err(JiraError::invalid_usage("Project key must be supplied."));
    }

    let body = serde_json::to_value(ApiComponentCreateRequest::from(info))
      .map_err(|e| JiraError::invalid_usage(format!("Invalid component: {}", e)))?;
    let created: ApiComponent = self
      .client
      .execute_as(Method::Post, COMPONENT_PATH, Some(body.into()))
      .await?;

    let component = created.into_component(&info.project_key);
    self
      .cache
      .storage()
      .add(&JiraCacheKey::project(&info.project_key), component.clone());

    Ok(component)
  }

  /// Delete a component, optionally moving its issues to another component.
  ///
  /// Only the id is known here, so the component is dropped from every
  /// project's cached collection.
  pub async fn delete(&self, component_id: &str, move_issues_to: Option<&str>) -> Result<()> {
    let path = delete_path(component_id, move_issues_to);
    self.client.execute(Method::Delete, &path, None).await?;
    self.cache.storage().remove_everywhere(component_id);
    Ok(())
  }

  /// Get the components of a project.
  pub async fn get_for_project(&self, project_key: &str) -> Result<Vec<ProjectComponent>> {
    let result = self
      .cache
      .fetch_list(&JiraCacheKey::project(project_key), || async move {
        let path = format!("/rest/api/2/project/{}/components", project_key);
        let components: Vec<ApiComponent> =
          self.client.execute_as(Method::Get, &path, None).await?;
        Ok::<_, JiraError>(
          components
            .into_iter()
            .map(|c| c.into_component(project_key))
            .collect(),
        )
      })
      .await?;

    Ok(result.data)
  }
}

fn delete_path(component_id: &str, move_issues_to: Option<&str>) -> String {
  match move_issues_to.filter(|m| !m.is_empty()) {
    Some(target) => {
      format!(
        "{}/{}?moveIssuesTo={}",
        COMPONENT_PATH,
        component_id,
        escape_query_value(target)
      )
    }
    None => format!("{}/{}", COMPONENT_PATH, component_id),
  }
}

/// Percent-escape a query value. Form encoding writes a space as `+` and a
/// literal `+` as `%2B`, so every remaining `+` stands for a space.
fn escape_query_value(value: &str) -> String {
  form_urlencoded::byte_serialize(value.as_bytes())
    .collect::<String>()
    .replace('+', "%20")
}
