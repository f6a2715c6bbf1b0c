use std::sync::Arc;

use crate::cache::CacheLayer;
use crate::error::{JiraError, Result};

use super::api_types::{ApiIssueType, ApiProject};
use super::cache::JiraCacheKey;
use super::client::JiraRestClient;
use super::transport::Method;
use super::types::IssueType;

/// Issue type lookups, cached globally and per project.
#[derive(Clone)]
pub struct IssueTypeService {
  client: Arc<JiraRestClient>,
  cache: CacheLayer<IssueType>,
}

impl IssueTypeService {
  pub fn new(client: Arc<JiraRestClient>) -> Self {
    Self {
      client,
      cache: CacheLayer::new(),
    }
  }

  pub(crate) fn cache(&self) -> &CacheLayer<IssueType> {
    &self.cache
  }

  /// Get every issue type defined on the server.
  pub async fn get_all(&self) -> Result<Vec<IssueType>> {
    let result = self
      .cache
      .fetch_list(&JiraCacheKey::Global, || async move {
        let types: Vec<ApiIssueType> = self
          .client
          .execute_as(Method::Get, "/rest/api/2/issuetype", None)
          .await?;
        Ok::<_, JiraError>(types.into_iter().map(IssueType::from).collect())
      })
      .await?;

    Ok(result.data)
  }

  /// Get the issue types available in a project.
  ///
  /// An unknown project surfaces as `NotFound`.
  pub async fn get_for_project(&self, project_key: &str) -> Result<Vec<IssueType>> {
    let result = self
      .cache
      .fetch_list(&JiraCacheKey::project(project_key), || async move {
        let path = format!("/rest/api/2/project/{}", project_key);
        let project: ApiProject = self.client.execute_as(Method::Get, &path, None).await?;
        Ok::<_, JiraError>(project.issue_types.into_iter().map(IssueType::from).collect())
      })
      .await?;

    Ok(result.data)
  }
}
