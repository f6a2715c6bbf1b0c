//! Custom field lookups, globally or scoped to a project and issue type.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{dedup_first_wins, CacheLayer};
use crate::error::{JiraError, Result};

use super::api_types::{ApiCreateMetaField, ApiCreateMetaResponse, ApiField};
use super::cache::JiraCacheKey;
use super::client::JiraRestClient;
use super::issue_types::IssueTypeService;
use super::transport::Method;
use super::types::{CustomField, CustomFieldFetchOptions};

#[derive(Clone)]
pub struct IssueFieldService {
  client: Arc<JiraRestClient>,
  issue_types: IssueTypeService,
  cache: CacheLayer<CustomField>,
}

impl IssueFieldService {
  pub fn new(client: Arc<JiraRestClient>, issue_types: IssueTypeService) -> Self {
    Self {
      client,
      issue_types,
      cache: CacheLayer::new(),
    }
  }

  pub(crate) fn cache(&self) -> &CacheLayer<CustomField> {
    &self.cache
  }

  /// Get every custom field defined on the server.
  pub async fn get_custom_fields(&self) -> Result<Vec<CustomField>> {
    let result = self
      .cache
      .fetch_list(&JiraCacheKey::Global, || async move {
        let fields: Vec<ApiField> = self
          .client
          .execute_as(Method::Get, "/rest/api/2/field", None)
          .await?;
        Ok::<_, JiraError>(
          fields
            .into_iter()
            .filter(|f| f.custom)
            .map(CustomField::from)
            .collect(),
        )
      })
      .await?;

    Ok(result.data)
  }

  /// Get custom fields filtered by project and issue type.
  ///
  /// - no filter: all custom fields on the server
  /// - project and issue type: fields offered when creating that issue type
  /// - project only: union over every issue type of the project
  /// - issue type only: rejected, an issue type id means nothing without a
  ///   project
  pub async fn get_custom_fields_with(
    &self,
    options: &CustomFieldFetchOptions,
  ) -> Result<Vec<CustomField>> {
    match (options.project_key(), options.issue_type_id()) {
      (None, None) => self.get_custom_fields().await,
      (Some(project_key), Some(issue_type_id)) => {
        self
          .get_custom_fields_for_issue_type(project_key, issue_type_id)
          .await
      }
      (Some(project_key), None) => self.merge_project_issue_type_fields(project_key).await,
      (None, Some(issue_type_id)) => Err(JiraError::invalid_usage(format!(
        "Issue type '{}' was given without a project key",
        issue_type_id
      ))),
    }
  }

  /// Get the custom fields of every issue type in a project, merged by id.
  ///
  /// Only the per-issue-type results are cached; the merge is recomputed
  /// from them on each call. An empty key means no project, which yields the
  /// server-wide custom fields.
  pub async fn get_custom_fields_for_project(&self, project_key: &str) -> Result<Vec<CustomField>> {
    self
      .get_custom_fields_with(&CustomFieldFetchOptions::for_project(project_key))
      .await
  }

  async fn merge_project_issue_type_fields(&self, project_key: &str) -> Result<Vec<CustomField>> {
    let issue_types = self
      .issue_types
      .get_for_project(project_key)
      .await
      .map_err(|e| translate_not_found(e, project_key))?;

    debug!(
      project = project_key,
      issue_types = issue_types.len(),
      "resolving project custom fields per issue type"
    );

    let mut fields = Vec::new();
    for issue_type in &issue_types {
      fields.extend(
        self
          .get_custom_fields_for_issue_type(project_key, &issue_type.id)
          .await?,
      );
    }

    Ok(dedup_first_wins(fields))
  }

  async fn get_custom_fields_for_issue_type(
    &self,
    project_key: &str,
    issue_type_id: &str,
  ) -> Result<Vec<CustomField>> {
    let key = JiraCacheKey::project_issue_type(project_key, issue_type_id);
    let result = self
      .cache
      .fetch_list(&key, || async move {
        let path = format!(
          "/rest/api/2/issue/createmeta/{}/issuetypes/{}",
          project_key, issue_type_id
        );
        let meta: ApiCreateMetaResponse = self
          .client
          .execute_as(Method::Get, &path, None)
          .await
          .map_err(|e| translate_not_found(e, project_key))?;

        Ok::<_, JiraError>(dedup_first_wins(
          meta
            .values
            .into_iter()
            .filter_map(ApiCreateMetaField::into_custom_field),
        ))
      })
      .await?;

    Ok(result.data)
  }
}

fn translate_not_found(err: JiraError, project_key: &str) -> JiraError {
  match err {
    JiraError::NotFound(_) => JiraError::project_not_found(project_key),
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;
  use crate::jira::client::ClientSettings;
  use crate::jira::testing::FakeTransport;

  const FIELDS: &str = "/rest/api/2/field";
  const PROJECT: &str = "/rest/api/2/project/TEST";
  const META_1: &str = "/rest/api/2/issue/createmeta/TEST/issuetypes/1";
  const META_2: &str = "/rest/api/2/issue/createmeta/TEST/issuetypes/2";

  fn service(transport: &Arc<FakeTransport>) -> IssueFieldService {
    let client = Arc::new(JiraRestClient::new(
      transport.clone(),
      ClientSettings::default(),
    ));
    IssueFieldService::new(client.clone(), IssueTypeService::new(client))
  }

  fn ids(fields: &[CustomField]) -> Vec<&str> {
    fields.iter().map(|f| f.id.as_str()).collect()
  }

  fn two_issue_type_project(transport: &FakeTransport) {
    transport.respond(
      Method::Get,
      PROJECT,
      200,
      r#"{"issueTypes":[{"id":"1","name":"Bug"},{"id":"2","name":"Task"}]}"#,
    );
    transport.respond(
      Method::Get,
      META_1,
      200,
      r#"{"values":[{"fieldId":"customfield_100","name":"Points"},{"fieldId":"summary","name":"Summary"}]}"#,
    );
    transport.respond(
      Method::Get,
      META_2,
      200,
      r#"{"values":[{"fieldId":"customfield_100","name":"Points (task)"},{"fieldId":"customfield_200","name":"Team"}]}"#,
    );
  }

  #[tokio::test]
  async fn test_global_fields_keep_only_custom_and_fetch_once() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      FIELDS,
      200,
      r#"[
        {"id":"summary","name":"Summary","custom":false},
        {"id":"customfield_1","name":"Points","custom":true,"schema":{"type":"number"}},
        {"id":"customfield_2","name":"Team","custom":true}
      ]"#,
    );
    let service = service(&transport);

    let first = service.get_custom_fields().await.unwrap();
    let second = service.get_custom_fields().await.unwrap();

    assert_eq!(ids(&first), vec!["customfield_1", "customfield_2"]);
    assert_eq!(first, second);
    assert_eq!(transport.count(Method::Get, FIELDS), 1);
  }

  #[tokio::test]
  async fn test_empty_options_use_global_fields() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, FIELDS, 200, "[]");
    let service = service(&transport);

    let options = CustomFieldFetchOptions {
      project_key: Some(String::new()),
      issue_type_id: Some(String::new()),
    };
    assert!(service.get_custom_fields_with(&options).await.unwrap().is_empty());
    assert_eq!(transport.count(Method::Get, FIELDS), 1);
  }

  #[tokio::test]
  async fn test_empty_project_key_uses_global_fields() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      FIELDS,
      200,
      r#"[{"id":"customfield_1","name":"Points","custom":true},{"id":"summary","name":"Summary","custom":false}]"#,
    );
    let service = service(&transport);

    let fields = service.get_custom_fields_for_project("").await.unwrap();
    assert_eq!(ids(&fields), vec!["customfield_1"]);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.count(Method::Get, FIELDS), 1);
  }

  #[tokio::test]
  async fn test_issue_type_fields_map_field_id_and_drop_system_fields() {
    let transport = FakeTransport::new();
    two_issue_type_project(&transport);
    let service = service(&transport);

    let fields = service
      .get_custom_fields_with(&CustomFieldFetchOptions::for_issue_type("TEST", "1"))
      .await
      .unwrap();

    assert_eq!(ids(&fields), vec!["customfield_100"]);
    assert_eq!(fields[0].name, "Points");
  }

  #[tokio::test]
  async fn test_issue_type_fields_dedup_first_wins() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      META_1,
      200,
      r#"{"values":[{"fieldId":"customfield_1","name":"first"},{"fieldId":"customfield_1","name":"second"}]}"#,
    );

    let fields = service(&transport)
      .get_custom_fields_with(&CustomFieldFetchOptions::for_issue_type("TEST", "1"))
      .await
      .unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "first");
  }

  #[tokio::test]
  async fn test_project_fan_out_merges_and_caches_per_issue_type() {
    let transport = FakeTransport::new();
    two_issue_type_project(&transport);
    let service = service(&transport);

    let fields = service.get_custom_fields_for_project("TEST").await.unwrap();

    assert_eq!(ids(&fields), vec!["customfield_100", "customfield_200"]);
    assert_eq!(fields[0].name, "Points");

    let storage = service.cache().storage();
    assert_eq!(ids(&storage.get("TEST::1").unwrap()), vec!["customfield_100"]);
    assert_eq!(
      ids(&storage.get("TEST::2").unwrap()),
      vec!["customfield_100", "customfield_200"]
    );
    // The merged result is not cached under the project key
    assert!(!storage.is_populated("TEST"));
    assert!(!storage.is_populated(&JiraCacheKey::Global));

    // A second call is served entirely from cache
    service.get_custom_fields_for_project("TEST").await.unwrap();
    assert_eq!(transport.count(Method::Get, META_1), 1);
    assert_eq!(transport.count(Method::Get, META_2), 1);
    assert_eq!(transport.count(Method::Get, PROJECT), 1);
  }

  #[tokio::test]
  async fn test_project_and_global_caches_are_independent() {
    let transport = FakeTransport::new();
    two_issue_type_project(&transport);
    transport.respond(Method::Get, FIELDS, 200, r#"[{"id":"customfield_9","custom":true}]"#);
    let service = service(&transport);

    service
      .get_custom_fields_with(&CustomFieldFetchOptions::for_issue_type("TEST", "1"))
      .await
      .unwrap();
    assert!(!service.cache().storage().is_populated(&JiraCacheKey::Global));

    let global = service.get_custom_fields().await.unwrap();
    assert_eq!(ids(&global), vec!["customfield_9"]);
    assert_eq!(transport.count(Method::Get, FIELDS), 1);
  }

  #[tokio::test]
  async fn test_createmeta_404_is_project_not_found() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      "/rest/api/2/issue/createmeta/NOPE/issuetypes/1",
      404,
      r#"{"errorMessages":["no project"]}"#,
    );

    let err = service(&transport)
      .get_custom_fields_with(&CustomFieldFetchOptions::for_issue_type("NOPE", "1"))
      .await
      .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidUsage);
    assert!(err.to_string().contains("'NOPE' was not found"));
  }

  #[tokio::test]
  async fn test_project_lookup_404_is_project_not_found() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/rest/api/2/project/NOPE", 404, "");

    let err = service(&transport)
      .get_custom_fields_for_project("NOPE")
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUsage);
  }

  #[tokio::test]
  async fn test_fan_out_failure_propagates() {
    let transport = FakeTransport::new();
    two_issue_type_project(&transport);
    transport.respond(Method::Get, META_2, 500, "boom");
    let service = service(&transport);

    let err = service.get_custom_fields_for_project("TEST").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);

    // The issue type that succeeded stays cached, the failed one does not
    let storage = service.cache().storage();
    assert!(storage.is_populated("TEST::1"));
    assert!(!storage.is_populated("TEST::2"));
  }

  #[tokio::test]
  async fn test_issue_type_without_project_is_rejected() {
    let transport = FakeTransport::new();
    let options = CustomFieldFetchOptions {
      project_key: None,
      issue_type_id: Some("1".to_string()),
    };

    let err = service(&transport)
      .get_custom_fields_with(&options)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUsage);
    assert!(transport.requests().is_empty());
  }

  #[tokio::test]
  async fn test_missing_values_is_decode_failure() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, META_1, 200, "{}");

    let err = service(&transport)
      .get_custom_fields_with(&CustomFieldFetchOptions::for_issue_type("TEST", "1"))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
  }

  #[tokio::test]
  async fn test_concurrent_lookups_of_same_key_fetch_once() {
    let transport = FakeTransport::new();
    two_issue_type_project(&transport);
    let service = service(&transport);
    let options = CustomFieldFetchOptions::for_issue_type("TEST", "2");

    let (a, b, c) = tokio::join!(
      service.get_custom_fields_with(&options),
      service.get_custom_fields_with(&options),
      service.get_custom_fields_with(&options),
    );

    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap(), c.unwrap());
    assert_eq!(transport.count(Method::Get, META_2), 1);
  }
}
