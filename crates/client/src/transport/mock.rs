//! Scripted transport for tests.
//!
//! Tests script responses by path prefix, in order. A gated script holds its
//! response until the test fires the returned trigger, which makes
//! arrival-order races (fast page 2 beating slow page 1, and the like)
//! deterministic instead of timing-dependent.

use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::transport::{Method, Transport, TransportError};

/// A request the mock has seen, for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

struct Script {
    method: Option<Method>,
    path_prefix: String,
    result: Result<Value, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct MockState {
    scripts: Vec<Script>,
    log: Vec<RecordedRequest>,
}

/// In-memory [`Transport`] driven entirely by scripted responses.
///
/// An unscripted request fails with a network error carrying the offending
/// path, so a test that forgets a script fails loudly.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// Create a mock with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for the next request whose path starts with
    /// `path_prefix`.
    pub fn respond(&self, path_prefix: &str, result: Result<Value, TransportError>) {
        self.push(None, path_prefix, result, None);
    }

    /// Script a successful JSON response.
    pub fn respond_ok(&self, path_prefix: &str, body: Value) {
        self.respond(path_prefix, Ok(body));
    }

    /// Script a failure.
    pub fn respond_err(&self, path_prefix: &str, error: TransportError) {
        self.respond(path_prefix, Err(error));
    }

    /// Script a response matched on method as well as path.
    pub fn respond_to(&self, method: Method, path_prefix: &str, result: Result<Value, TransportError>) {
        self.push(Some(method), path_prefix, result, None);
    }

    /// Script a response that is withheld until the returned trigger fires.
    ///
    /// Dropping the trigger also releases the response.
    pub fn respond_gated(
        &self,
        path_prefix: &str,
        result: Result<Value, TransportError>,
    ) -> oneshot::Sender<()> {
        let (trigger, gate) = oneshot::channel();
        self.push(None, path_prefix, result, Some(gate));
        trigger
    }

    /// All requests seen so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    fn push(
        &self,
        method: Option<Method>,
        path_prefix: &str,
        result: Result<Value, TransportError>,
        gate: Option<oneshot::Receiver<()>>,
    ) {
        if let Ok(mut state) = self.state.lock() {
            state.scripts.push(Script {
                method,
                path_prefix: path_prefix.to_owned(),
                result,
                gate,
            });
        }
    }
}

impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let script = {
            let Ok(mut state) = self.state.lock() else {
                return Err(TransportError::Network("mock poisoned".to_owned()));
            };
            state.log.push(RecordedRequest {
                method,
                path: path.to_owned(),
                body,
            });
            let position = state.scripts.iter().position(|script| {
                path.starts_with(&script.path_prefix)
                    && script.method.is_none_or(|m| m == method)
            });
            match position {
                Some(pos) => state.scripts.remove(pos),
                None => {
                    return Err(TransportError::Network(format!(
                        "unscripted request: {method} {path}"
                    )));
                }
            }
        };

        if let Some(gate) = script.gate {
            // A dropped trigger releases the response rather than hanging
            // the test.
            let _ = gate.await;
        }
        script.result
    }
}
