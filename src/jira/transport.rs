//! HTTP transport: send a request, get back a status code and a body, or
//! download a resource as raw bytes.
//!
//! The request executor only sees the [`Transport`] trait. [`ReqwestTransport`]
//! is the production implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
    }
  }

  /// Read-only methods must never carry a request body.
  pub fn is_read_only(&self) -> bool {
    matches!(self, Method::Get)
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    }
  }
}

/// Outgoing request with a server-relative path (may include a query string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
  pub method: Method,
  pub path: String,
  pub body: Option<String>,
}

impl RawRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      body: None,
    }
  }

  pub fn with_body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

/// Response to a download, body kept as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// No response could be obtained.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
  fn from(err: reqwest::Error) -> Self {
    TransportError(err.to_string())
  }
}

#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError>;

  /// `GET` a resource as bytes. `path` is server-relative or an absolute url.
  ///
  /// The default goes through [`Transport::send`], which only suits text
  /// bodies.
  async fn download(&self, path: &str) -> Result<BinaryResponse, TransportError> {
    let response = self.send(RawRequest::new(Method::Get, path)).await?;
    Ok(BinaryResponse {
      status: response.status,
      body: response.body.into_bytes(),
    })
  }
}

/// Static credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
  Anonymous,
  /// Jira Cloud style: email + API token as password
  Basic { username: String, password: String },
  /// Personal access token
  Bearer(String),
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Credentials::Anonymous => f.write_str("Anonymous"),
      Credentials::Basic { username, .. } => f
        .debug_struct("Basic")
        .field("username", username)
        .finish_non_exhaustive(),
      Credentials::Bearer(_) => f.write_str("Bearer(..)"),
    }
  }
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  base_url: String,
  origin: url::Origin,
  credentials: Credentials,
}

impl ReqwestTransport {
  pub fn new(
    base_url: &str,
    credentials: Credentials,
    timeout: Duration,
  ) -> Result<Self, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .default_headers(headers)
      .build()?;

    let base_url = base_url.trim_end_matches('/').to_string();
    let origin = url::Url::parse(&base_url)
      .map_err(|e| TransportError(format!("Invalid url '{}': {}", base_url, e)))?
      .origin();

    Ok(Self {
      client,
      base_url,
      origin,
      credentials,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url_for(&self, path: &str) -> Result<url::Url, TransportError> {
    let joined = if path.starts_with("http://") || path.starts_with("https://") {
      path.to_string()
    } else {
      format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    };
    url::Url::parse(&joined).map_err(|e| TransportError(format!("Invalid url '{}': {}", joined, e)))
  }

  /// Request builder with credentials attached, unless the url points away
  /// from the configured server.
  fn request(&self, method: Method, url: &url::Url) -> reqwest::RequestBuilder {
    let builder = self.client.request(method.into(), url.clone());
    if url.origin() != self.origin {
      return builder;
    }

    match &self.credentials {
      Credentials::Anonymous => builder,
      Credentials::Basic { username, password } => builder.basic_auth(username, Some(password)),
      Credentials::Bearer(token) => builder.bearer_auth(token),
    }
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
    let url = self.url_for(&request.path)?;
    let method = request.method;

    let mut builder = self.request(method, &url);
    if let Some(body) = request.body {
      builder = builder.header(CONTENT_TYPE, "application/json").body(body);
    }

    debug!(%method, %url, "sending HTTP request");
    let response = builder.send().await?;
    let status = response.status().as_u16();
    debug!(%method, %url, status, "received HTTP response");

    let body = response.text().await?;
    Ok(RawResponse { status, body })
  }

  async fn download(&self, path: &str) -> Result<BinaryResponse, TransportError> {
    let url = self.url_for(path)?;

    debug!(%url, "downloading");
    let response = self
      .request(Method::Get, &url)
      .header(ACCEPT, "*/*")
      .send()
      .await?;
    let status = response.status().as_u16();

    let body = response.bytes().await?.to_vec();
    debug!(%url, status, bytes = body.len(), "download finished");
    Ok(BinaryResponse { status, body })
  }
}
