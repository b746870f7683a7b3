//! Persistent key-value collaborator for the session token.
//!
//! The platform shell (mobile keychain, secure storage, a file in dev
//! builds) implements [`TokenStore`]; the auth store uses it to carry the
//! session across process restarts. Storage failures are never fatal - the
//! auth store logs them and carries on with its in-memory state.

use std::future::Future;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by the key-value collaborator.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The underlying store rejected the operation.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Persistent storage for the session token.
pub trait TokenStore: Send + Sync + 'static {
    /// Read the persisted token, if any.
    fn get(&self) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Persist a token, replacing any previous one.
    fn set(&self, token: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove the persisted token.
    fn clear(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// In-memory [`TokenStore`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a token, as if a previous session
    /// persisted one.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_owned())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        self.token
            .lock()
            .map(|token| token.clone())
            .map_err(|_| StorageError::Backend("poisoned".to_owned()))
    }

    async fn set(&self, token: &str) -> Result<(), StorageError> {
        self.token
            .lock()
            .map(|mut slot| *slot = Some(token.to_owned()))
            .map_err(|_| StorageError::Backend("poisoned".to_owned()))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.token
            .lock()
            .map(|mut slot| *slot = None)
            .map_err(|_| StorageError::Backend("poisoned".to_owned()))
    }
}
