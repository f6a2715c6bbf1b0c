use std::sync::Arc;

use crate::error::{JiraError, Result};

use super::api_types::{ApiRemoteLink, ApiRemoteLinkObject};
use super::client::JiraRestClient;
use super::transport::Method;
use super::types::RemoteLink;

/// Links from issues to external resources. Not cached.
#[derive(Clone)]
pub struct IssueRemoteLinkService {
  client: Arc<JiraRestClient>,
}

impl IssueRemoteLinkService {
  pub fn new(client: Arc<JiraRestClient>) -> Self {
    Self { client }
  }

  /// Add a remote link to an issue. `summary` is left out of the payload when
  /// empty.
  pub async fn create(
    &self,
    issue_key: &str,
    remote_url: &str,
    title: &str,
    summary: Option<&str>,
  ) -> Result<()> {
    if title.is_empty() {
      return Err(JiraError::invalid_usage("Title must be supplied."));
    }
    if remote_url.is_empty() {
      return Err(JiraError::invalid_usage("Remote URL must be supplied."));
    }

    let link = ApiRemoteLink {
      object: ApiRemoteLinkObject {
        url: remote_url.to_string(),
        title: Some(title.to_string()),
        summary: summary.filter(|s| !s.is_empty()).map(String::from),
      },
    };
    let body = serde_json::to_value(&link)
      .map_err(|e| JiraError::invalid_usage(format!("Invalid remote link: {}", e)))?;

    self
      .client
      .execute(Method::Post, &remote_link_path(issue_key), Some(body.into()))
      .await?;
    Ok(())
  }

  /// List the remote links of an issue.
  pub async fn list(&self, issue_key: &str) -> Result<Vec<RemoteLink>> {
    let links: Vec<ApiRemoteLink> = self
      .client
      .execute_as(Method::Get, &remote_link_path(issue_key), None)
      .await?;
    Ok(links.into_iter().map(RemoteLink::from).collect())
  }
}

fn remote_link_path(issue_key: &str) -> String {
  format!("/rest/api/2/issue/{}/remotelink", issue_key)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::error::ErrorKind;
  use crate::jira::client::ClientSettings;
  use crate::jira::testing::FakeTransport;

  const PATH: &str = "/rest/api/2/issue/TEST-1/remotelink";

  fn service(transport: &Arc<FakeTransport>) -> IssueRemoteLinkService {
    IssueRemoteLinkService::new(Arc::new(JiraRestClient::new(
      transport.clone(),
      ClientSettings::default(),
    )))
  }

  fn sent_body(transport: &FakeTransport) -> serde_json::Value {
    let requests = transport.requests();
    serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap()
  }

  #[tokio::test]
  async fn test_create_omits_empty_summary() {
    let transport = FakeTransport::new();
    transport.respond(Method::Post, PATH, 201, r#"{"id":10000}"#);

    service(&transport)
      .create("TEST-1", "https://example.com", "Example", Some(""))
      .await
      .unwrap();

    assert_eq!(
      sent_body(&transport),
      json!({"object": {"url": "https://example.com", "title": "Example"}})
    );
  }

  #[tokio::test]
  async fn test_create_with_summary() {
    let transport = FakeTransport::new();
    transport.respond(Method::Post, PATH, 201, "");

    service(&transport)
      .create("TEST-1", "https://example.com", "Example", Some("Details"))
      .await
      .unwrap();

    assert_eq!(sent_body(&transport)["object"]["summary"], "Details");
  }

  #[tokio::test]
  async fn test_create_requires_title_and_url() {
    let transport = FakeTransport::new();
    let service = service(&transport);

    let err = service
      .create("TEST-1", "https://example.com", "", None)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUsage);

    let err = service.create("TEST-1", "", "Example", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidUsage);
    assert!(transport.requests().is_empty());
  }

  #[tokio::test]
  async fn test_list_maps_link_objects() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      PATH,
      200,
      r#"[
        {"id":1,"object":{"url":"https://a","title":"A","summary":"first"}},
        {"id":2,"object":{"url":"https://b"}}
      ]"#,
    );

    let links = service(&transport).list("TEST-1").await.unwrap();
    assert_eq!(
      links,
      vec![
        RemoteLink {
          url: "https://a".to_string(),
          title: Some("A".to_string()),
          summary: Some("first".to_string()),
        },
        RemoteLink {
          url: "https://b".to_string(),
          title: None,
          summary: None,
        },
      ]
    );
  }

  #[tokio::test]
  async fn test_list_without_url_is_decode_failure() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, PATH, 200, r#"[{"object":{"title":"A"}}]"#);

    let err = service(&transport).list("TEST-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
  }
}
