//! In-memory transport for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::transport::{Method, RawRequest, RawResponse, Transport, TransportError};

enum Canned {
  Response(RawResponse),
  Failure(String),
}

/// Answers requests from canned responses keyed by method and path, and
/// records every request it receives. Unknown routes fail at the transport
/// level so a test notices unexpected calls.
#[derive(Default)]
pub struct FakeTransport {
  routes: Mutex<HashMap<(Method, String), Canned>>,
  requests: Mutex<Vec<RawRequest>>,
}

impl FakeTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
    self.routes.lock().insert(
      (method, path.to_string()),
      Canned::Response(RawResponse {
        status,
        body: body.to_string(),
      }),
    );
  }

  pub fn fail(&self, method: Method, path: &str, message: &str) {
    self
      .routes
      .lock()
      .insert((method, path.to_string()), Canned::Failure(message.to_string()));
  }

  pub fn requests(&self) -> Vec<RawRequest> {
    self.requests.lock().clone()
  }

  /// Number of requests received for a method and path.
  pub fn count(&self, method: Method, path: &str) -> usize {
    self
      .requests
      .lock()
      .iter()
      .filter(|r| r.method == method && r.path == path)
      .count()
  }
}

#[async_trait]
impl Transport for FakeTransport {
  async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
    let key = (request.method, request.path.clone());
    self.requests.lock().push(request);

    // Yield so concurrent callers interleave like real network calls
    tokio::task::yield_now().await;

    match self.routes.lock().get(&key) {
      Some(Canned::Response(response)) => Ok(response.clone()),
      Some(Canned::Failure(message)) => Err(TransportError(message.clone())),
      None => Err(TransportError(format!(
        "no canned response for {} {}",
        key.0, key.1
      ))),
    }
  }
}
