//! REST transport backed by `reqwest`.
//!
//! Timeouts are enforced here via the configured `reqwest` client; the
//! stores impose none of their own. Auth and diet-filter headers are
//! attached per request from the shared [`RequestContext`].

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{error, instrument};

use crate::config::ApiConfig;
use crate::transport::{Method, RequestContext, Transport, TransportError};

/// Body keys the backend has been seen using for its error message.
const MESSAGE_KEYS: &[&str] = &["message", "error"];

/// Production transport speaking JSON over HTTPS.
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    config: ApiConfig,
    context: RequestContext,
}

impl RestTransport {
    /// Create a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ApiConfig, context: RequestContext) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            context,
        })
    }

    fn decorate(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.context.bearer() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(diet) = self.context.diet() {
            builder = builder.header("type", diet.as_str());
        }
        builder
    }
}

impl Transport for RestTransport {
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = self.config.url_for(path);
        let reqwest_method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.decorate(self.client.request(reqwest_method, url));
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: extract_message(&text),
            });
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            TransportError::Malformed(e.to_string())
        })
    }
}

/// Pull the server's human-facing message out of an error body, if any.
fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };
    MESSAGE_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use tiffin_core::DietType;
    use url::Url;

    fn transport_with(context: RequestContext) -> RestTransport {
        let config = ApiConfig::new(Url::parse("https://api.tiffin.test/").expect("url"));
        RestTransport::new(config, context).expect("transport")
    }

    #[test]
    fn test_extract_message_prefers_message_key() {
        assert_eq!(
            extract_message(r#"{"message": "Invalid OTP", "error": "bad"}"#),
            "Invalid OTP"
        );
        assert_eq!(extract_message(r#"{"error": "bad"}"#), "bad");
        assert_eq!(extract_message("not json"), "");
        assert_eq!(extract_message(r#"{"code": 7}"#), "");
    }

    #[test]
    fn test_decorate_attaches_bearer_and_diet_headers() {
        let context = RequestContext::new();
        context.set_bearer(Some(SecretString::from("tok-99")));
        context.set_diet(Some(DietType::Veg));
        let transport = transport_with(context);

        let request = transport
            .decorate(transport.client.get("https://api.tiffin.test/v1/products"))
            .build()
            .expect("request");

        let auth = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        assert_eq!(auth, Some("Bearer tok-99"));

        let diet = request.headers().get("type").and_then(|v| v.to_str().ok());
        assert_eq!(diet, Some("veg"));
    }

    #[test]
    fn test_decorate_skips_headers_when_unset() {
        let transport = transport_with(RequestContext::new());

        let request = transport
            .decorate(transport.client.get("https://api.tiffin.test/v1/products"))
            .build()
            .expect("request");

        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
        assert!(request.headers().get("type").is_none());
    }
}
