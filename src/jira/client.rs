use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{JiraError, Result};

use super::transport::{Method, RawRequest, RawResponse, Transport, TransportError};

/// Request body, either pre-serialized text or a JSON value to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
  Text(String),
  Json(Value),
}

impl RequestBody {
  fn to_wire(&self) -> Result<String> {
    match self {
      RequestBody::Text(text) => Ok(text.clone()),
      RequestBody::Json(value) => serde_json::to_string(value)
        .map_err(|e| JiraError::invalid_usage(format!("Request body is not serializable: {}", e))),
    }
  }

  /// Indented rendering for request tracing, nulls dropped.
  fn to_trace(&self) -> String {
    let value = match self {
      RequestBody::Json(value) => Some(value.clone()),
      RequestBody::Text(text) => serde_json::from_str::<Value>(text).ok(),
    };
    match value {
      Some(mut value) => {
        strip_nulls(&mut value);
        serde_json::to_string_pretty(&value).unwrap_or_default()
      }
      None => self.to_wire().unwrap_or_default(),
    }
  }
}

impl From<String> for RequestBody {
  fn from(text: String) -> Self {
    RequestBody::Text(text)
  }
}

impl From<&str> for RequestBody {
  fn from(text: &str) -> Self {
    RequestBody::Text(text.to_string())
  }
}

impl From<Value> for RequestBody {
  fn from(value: Value) -> Self {
    RequestBody::Json(value)
  }
}

/// Settings for [`JiraRestClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
  /// Emit trace records for every request and response
  pub enable_request_trace: bool,
}

/// Executes Jira REST requests and validates the responses.
///
/// Every call goes out exactly once; failures are classified into a
/// [`JiraError`] and returned without retry.
#[derive(Clone)]
pub struct JiraRestClient {
  transport: Arc<dyn Transport>,
  settings: ClientSettings,
}

impl JiraRestClient {
  pub fn new(transport: Arc<dyn Transport>, settings: ClientSettings) -> Self {
    Self {
      transport,
      settings,
    }
  }

  pub fn settings(&self) -> &ClientSettings {
    &self.settings
  }

  /// Execute a request and return the validated JSON response.
  ///
  /// A `GET` with a body is rejected before anything is sent. An empty
  /// response body yields an empty JSON object.
  pub async fn execute(
    &self,
    method: Method,
    path: &str,
    body: Option<RequestBody>,
  ) -> Result<Value> {
    if method.is_read_only() && body.is_some() {
      return Err(JiraError::invalid_usage(format!(
        "{} requests are not allowed to have a request body. Resource: {}",
        method, path
      )));
    }

    let mut request = RawRequest::new(method, path);
    if let Some(body) = &body {
      request.body = Some(body.to_wire()?);
    }

    self.log_request(method, path, body.as_ref());
    let response = self.transport.send(request).await;
    self.validate_response(method, path, response)
  }

  /// Execute a request and deserialize the JSON response into `T`.
  pub async fn execute_as<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<RequestBody>,
  ) -> Result<T> {
    let value = self.execute(method, path, body).await?;
    serde_json::from_value(value).map_err(JiraError::DecodeFailure)
  }

  /// Execute a prepared request with the same validation, returning the raw
  /// response on success.
  pub async fn execute_raw(&self, request: RawRequest) -> Result<RawResponse> {
    if request.method.is_read_only() && request.body.is_some() {
      return Err(JiraError::invalid_usage(format!(
        "{} requests are not allowed to have a request body. Resource: {}",
        request.method, request.path
      )));
    }

    let method = request.method;
    let path = request.path.clone();
    let body = request.body.clone().map(RequestBody::Text);
    self.log_request(method, &path, body.as_ref());

    let response = self.transport.send(request).await?;
    self.validate_response(method, &path, Ok(response.clone()))?;
    Ok(response)
  }

  /// Download a resource, such as an attachment's content url, as bytes.
  ///
  /// Error statuses are classified as for [`JiraRestClient::execute`]; a
  /// successful body is returned untouched.
  pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
    self.log_request(Method::Get, path, None);
    let response = self.transport.download(path).await?;

    if self.settings.enable_request_trace {
      debug!(
        target: "jira_remote::trace",
        "[{}] Response for Url: {}\n<{} bytes>", Method::Get, path, response.body.len()
      );
    }

    if let Some(err) = status_error(response.status, || {
      String::from_utf8_lossy(&response.body).trim().to_string()
    }) {
      return Err(err);
    }
    Ok(response.body)
  }

  /// Download a resource into `destination`, replacing any existing file.
  pub async fn download_to(&self, path: &str, destination: &Path) -> Result<()> {
    let data = self.download(path).await?;
    tokio::fs::write(destination, &data)
      .await
      .map_err(|source| JiraError::FileWrite {
        path: destination.to_path_buf(),
        source,
      })?;

    debug!(url = path, file = %destination.display(), bytes = data.len(), "saved download");
    Ok(())
  }

  fn log_request(&self, method: Method, path: &str, body: Option<&RequestBody>) {
    if !self.settings.enable_request_trace {
      return;
    }

    debug!(target: "jira_remote::trace", "[{}] Request Url: {}", method, path);
    if let Some(body) = body {
      debug!(target: "jira_remote::trace", "[{}] Request Data: {}", method, body.to_trace());
    }
  }

  fn validate_response(
    &self,
    method: Method,
    path: &str,
    response: std::result::Result<RawResponse, TransportError>,
  ) -> Result<Value> {
    let response = response.map_err(|e| JiraError::TransportFailure(e.to_string()))?;
    let content = response.body.trim();

    if self.settings.enable_request_trace {
      debug!(
        target: "jira_remote::trace",
        "[{}] Response for Url: {}\n{}", method, path, content
      );
    }

    classify_response(response.status, content)
  }
}

/// Turn a status code and trimmed body into a JSON value or a typed failure.
fn classify_response(status: u16, content: &str) -> Result<Value> {
  if let Some(err) = status_error(status, || content.to_string()) {
    return Err(err);
  }

  if content.is_empty() {
    return Ok(Value::Object(serde_json::Map::new()));
  }

  if !content.starts_with('{') && !content.starts_with('[') {
    return Err(JiraError::MalformedResponse {
      message: "Response was not recognized as JSON",
      content: content.to_string(),
      source: None,
    });
  }

  let parsed: Value =
    serde_json::from_str(content).map_err(|e| JiraError::MalformedResponse {
      message: "Failed to parse response as JSON",
      content: content.to_string(),
      source: Some(e),
    })?;

  if let Some(errors) = parsed.as_object().and_then(|o| o.get("errorMessages")) {
    return Err(JiraError::ServerReportedError(errors.clone()));
  }

  Ok(parsed)
}

/// Failure for an error status; `content` renders the body only when needed.
fn status_error(status: u16, content: impl FnOnce() -> String) -> Option<JiraError> {
  match status {
    401 | 403 => Some(JiraError::AuthenticationFailure(content())),
    404 => Some(JiraError::NotFound(content())),
    s if s >= 400 => Some(JiraError::ServerError {
      status: s,
      body: content(),
    }),
    _ => None,
  }
}

fn strip_nulls(value: &mut Value) {
  match value {
    Value::Object(map) => {
      map.retain(|_, v| !v.is_null());
      map.values_mut().for_each(strip_nulls);
    }
    Value::Array(items) => items.iter_mut().for_each(strip_nulls),
    _ => {}
  }
}
