//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIFFIN_API_BASE_URL` - Base URL of the Tiffin backend (e.g., <https://api.tiffin.app>)
//!
//! ## Optional
//! - `TIFFIN_API_VERSION` - API version path segment (default: v1)
//! - `TIFFIN_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 15)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Remote API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend, without the version segment.
    pub base_url: Url,
    /// API version path segment (e.g., v1).
    pub api_version: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a configuration from an already-parsed base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_version: DEFAULT_API_VERSION.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TIFFIN_API_BASE_URL` is missing or unparseable,
    /// or if an optional variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = require_env("TIFFIN_API_BASE_URL")?;
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("TIFFIN_API_BASE_URL".into(), e.to_string()))?;

        let api_version =
            optional_env("TIFFIN_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_owned());

        let timeout = match optional_env("TIFFIN_API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar("TIFFIN_API_TIMEOUT_SECS".into(), raw)
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            api_version,
            timeout,
        })
    }

    /// Full URL for an API path (e.g., `/products?page=1`).
    ///
    /// The path is joined under the version segment; a malformed join falls
    /// back to the base URL so the request fails loudly at the transport.
    #[must_use]
    pub fn url_for(&self, path: &str) -> Url {
        let versioned = format!("{}/{}", self.api_version, path.trim_start_matches('/'));
        self.base_url
            .join(&versioned)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
