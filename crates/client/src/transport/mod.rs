//! HTTP transport collaborator.
//!
//! The stores never touch `reqwest` directly; they speak to the backend
//! through the [`Transport`] trait. The production implementation is
//! [`rest::RestTransport`]; tests script a [`mock::MockTransport`] instead.
//!
//! Outgoing requests are decorated from a shared [`RequestContext`]: the
//! auth store publishes the bearer token into it, the catalog store
//! publishes the active diet filter (sent as the `type: veg|non-veg`
//! header). This is the one place cross-store state meets the wire, and it
//! is injected explicitly so it can be replaced in tests.

pub mod rest;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use std::future::Future;
use std::sync::{Arc, RwLock};

use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;

use tiffin_core::DietType;

pub use rest::RestTransport;

/// HTTP method subset the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Errors raised by the transport collaborator.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-success status. `message` is the
    /// server-provided message when one was present in the body.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Message suitable for a request envelope / toast.
    ///
    /// Prefers the server-provided message; network and shape problems fall
    /// back to a generic line rather than leaking internals at the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { status, .. } => format!("Request failed (HTTP {status})"),
            Self::Network(_) | Self::Malformed(_) => "Something went wrong. Please try again.".to_owned(),
        }
    }
}

/// The HTTP collaborator contract.
///
/// One call per logical request; no retries, no caching, no cancellation -
/// those concerns live in the stores (logical cancellation) or below the
/// transport (timeouts). Implementations must be cheap to share behind an
/// `Arc`.
pub trait Transport: Send + Sync + 'static {
    /// Issue a request and return the parsed JSON body.
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Shared read-only view the transport takes of cross-store state.
///
/// Writers: the auth store ([`set_bearer`](Self::set_bearer)) and the
/// catalog store ([`set_diet`](Self::set_diet)). Reader: the transport,
/// immediately before each outgoing request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    inner: Arc<RwLock<ContextInner>>,
}

#[derive(Debug, Default)]
struct ContextInner {
    bearer: Option<SecretString>,
    diet: Option<DietType>,
}

impl RequestContext {
    /// Create an empty context (no token, no diet filter).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or clear) the session bearer token.
    pub fn set_bearer(&self, token: Option<SecretString>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.bearer = token;
        }
    }

    /// Publish (or clear) the active diet filter.
    pub fn set_diet(&self, diet: Option<DietType>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.diet = diet;
        }
    }

    /// Current bearer token, if signed in.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        self.inner.read().ok().and_then(|inner| inner.bearer.clone())
    }

    /// Current diet filter, if any.
    #[must_use]
    pub fn diet(&self) -> Option<DietType> {
        self.inner.read().ok().and_then(|inner| inner.diet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_round_trip() {
        let context = RequestContext::new();
        assert!(context.bearer().is_none());
        assert!(context.diet().is_none());

        context.set_bearer(Some(SecretString::from("tok-1")));
        context.set_diet(Some(DietType::NonVeg));

        assert!(context.bearer().is_some());
        assert_eq!(context.diet(), Some(DietType::NonVeg));

        context.set_bearer(None);
        assert!(context.bearer().is_none());
    }

    #[test]
    fn test_transport_error_user_message() {
        let err = TransportError::Status {
            status: 422,
            message: "Phone number already registered".into(),
        };
        assert_eq!(err.user_message(), "Phone number already registered");

        let err = TransportError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Request failed (HTTP 500)");

        let err = TransportError::Network("connection refused".into());
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
