//! Jira REST client: request execution, response validation and the
//! cached domain services built on top of it.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod components;
pub mod fields;
pub mod issue_types;
pub mod remote_links;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tracing::debug;

use crate::config::Config;

use self::client::{ClientSettings, JiraRestClient};
use self::components::ProjectComponentService;
use self::fields::IssueFieldService;
use self::issue_types::IssueTypeService;
use self::remote_links::IssueRemoteLinkService;
use self::transport::{ReqwestTransport, Transport};

/// Entry point to a Jira server.
///
/// Owns one request executor and one set of caches. Clones share both, so a
/// clone sees entries populated through the original.
#[derive(Clone)]
pub struct Jira {
  client: Arc<JiraRestClient>,
  fields: IssueFieldService,
  issue_types: IssueTypeService,
  components: ProjectComponentService,
  remote_links: IssueRemoteLinkService,
}

impl Jira {
  /// Connect using the configured url, credentials and timeout.
  pub fn new(config: &Config) -> Result<Self> {
    let credentials = config.jira.credentials(Config::get_api_token())?;
    debug!(?credentials, "resolved Jira credentials");

    let transport = ReqwestTransport::new(&config.jira.url, credentials, config.jira.timeout())
      .map_err(|e| eyre!("Failed to create Jira client: {}", e))?;
    let base_url = transport.base_url().to_string();

    let jira = Self::with_transport(
      Arc::new(transport),
      ClientSettings {
        enable_request_trace: config.jira.enable_request_trace,
      },
    );
    debug!(
      url = %base_url,
      request_trace = jira.client.settings().enable_request_trace,
      "created Jira client"
    );

    Ok(jira)
  }

  /// Build on top of any transport.
  pub fn with_transport(transport: Arc<dyn Transport>, settings: ClientSettings) -> Self {
    let client = Arc::new(JiraRestClient::new(transport, settings));
    let issue_types = IssueTypeService::new(Arc::clone(&client));

    Self {
      fields: IssueFieldService::new(Arc::clone(&client), issue_types.clone()),
      components: ProjectComponentService::new(Arc::clone(&client)),
      remote_links: IssueRemoteLinkService::new(Arc::clone(&client)),
      issue_types,
      client,
    }
  }

  /// The underlying request executor, for calls no service covers.
  pub fn rest_client(&self) -> &JiraRestClient {
    &self.client
  }

  pub fn fields(&self) -> &IssueFieldService {
    &self.fields
  }

  pub fn issue_types(&self) -> &IssueTypeService {
    &self.issue_types
  }

  pub fn components(&self) -> &ProjectComponentService {
    &self.components
  }

  pub fn remote_links(&self) -> &IssueRemoteLinkService {
    &self.remote_links
  }

  /// Forget every cached collection.
  pub fn clear_cache(&self) {
    self.fields.cache().storage().clear();
    self.issue_types.cache().storage().clear();
    self.components.cache().storage().clear();
  }
}
