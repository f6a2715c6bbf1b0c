//! Error types for Jira REST operations.
//!
//! Every failure the request executor or a service can produce is a variant
//! of [`JiraError`]. Use [`JiraError::kind`] when only the category matters.

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::jira::transport::TransportError;

pub type Result<T, E = JiraError> = std::result::Result<T, E>;

/// Fieldless category of a [`JiraError`], convenient for matching in callers
/// and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidUsage,
  TransportFailure,
  AuthenticationFailure,
  NotFound,
  ServerError,
  MalformedResponse,
  ServerReportedError,
  DecodeFailure,
  FileWrite,
  Cache,
}

#[derive(Debug, Error)]
pub enum JiraError {
  /// The caller broke a precondition; no request was sent.
  #[error("Invalid usage: {0}")]
  InvalidUsage(String),

  /// No response was obtained from the server.
  #[error("Error Message: {0}")]
  TransportFailure(String),

  /// 401 or 403.
  #[error("Authentication failed. Response Content: {0}")]
  AuthenticationFailure(String),

  /// 404.
  #[error("Resource not found. Response Content: {0}")]
  NotFound(String),

  #[error("Response Status Code: {status}. Response Content: {body}")]
  ServerError { status: u16, body: String },

  #[error("{message}. Content: {content}")]
  MalformedResponse {
    message: &'static str,
    content: String,
    #[source]
    source: Option<serde_json::Error>,
  },

  /// The response was valid JSON but carried an `errorMessages` field.
  #[error("Response reported error(s) from JIRA: {0}")]
  ServerReportedError(serde_json::Value),

  #[error("Failed to decode response: {0}")]
  DecodeFailure(#[source] serde_json::Error),

  /// A download arrived but could not be saved.
  #[error("Failed to write '{}': {source}", path.display())]
  FileWrite {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Cache(#[from] CacheError),
}

impl JiraError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidUsage(_) => ErrorKind::InvalidUsage,
      Self::TransportFailure(_) => ErrorKind::TransportFailure,
      Self::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::ServerError { .. } => ErrorKind::ServerError,
      Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
      Self::ServerReportedError(_) => ErrorKind::ServerReportedError,
      Self::DecodeFailure(_) => ErrorKind::DecodeFailure,
      Self::FileWrite { .. } => ErrorKind::FileWrite,
      Self::Cache(_) => ErrorKind::Cache,
    }
  }

  pub fn invalid_usage(message: impl Into<String>) -> Self {
    Self::InvalidUsage(message.into())
  }

  pub(crate) fn project_not_found(project_key: &str) -> Self {
    Self::InvalidUsage(format!(
      "Project with key '{}' was not found on the Jira server.",
      project_key
    ))
  }
}

impl From<TransportError> for JiraError {
  fn from(err: TransportError) -> Self {
    JiraError::TransportFailure(err.to_string())
  }
}
