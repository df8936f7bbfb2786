//! HTTP client for the Sonarr/Radarr v3 REST APIs.
//!
//! [`ServiceClient`] wraps `reqwest::Client` for one backend. All responses
//! are returned as `serde_json::Value`; the formatter turns them into text.
//!
//! ## Authentication
//!
//! Every request carries the configured key in the `X-Api-Key` header.
//!
//! ## Error handling
//!
//! Timeouts, connection failures and non-2xx statuses map to distinct
//! [`ClientError`] variants. For non-2xx responses the backend's error
//! message is extracted from the JSON body when possible, otherwise the raw
//! body is used. The API key is scrubbed from every error message.

use std::error::Error as _;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::config::{Service, ServiceEndpoint};

const API_KEY_HEADER: &str = "X-Api-Key";
const API_PREFIX: &str = "api/v3";
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// HTTP client for a single backend service.
pub struct ServiceClient {
    http: reqwest::Client,
    service: Service,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ServiceClient {
    /// Build a client for the given endpoint. The underlying connection pool
    /// is reused for the lifetime of the client.
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mcp-servarr/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(endpoint.timeout.min(MAX_CONNECT_TIMEOUT))
            .timeout(endpoint.timeout)
            .build()?;
        Ok(Self {
            http,
            service: endpoint.service,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            timeout: endpoint.timeout,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// The backend's base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/v3/{path}` with optional query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        self.request(Method::GET, path, query, None).await
    }

    /// `POST /api/v3/{path}` with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// Issue a single request against the backend. No retries.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            API_PREFIX,
            path.trim_start_matches('/')
        );
        tracing::debug!(
            service = %self.service,
            method = method.as_str(),
            url = url.as_str(),
            "backend request"
        );

        let mut req = self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| self.transport_error(&e))?;
        self.handle_response(resp).await
    }

    /// Parse an HTTP response: the JSON body on success, a
    /// [`ClientError::Status`] otherwise.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(&e))?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body)
                .map_err(|e| ClientError::Decode(format!("invalid JSON from {}: {e}", self.service)))
        } else {
            let message = extract_error_message(&body)
                .or_else(|| status.canonical_reason().map(String::from))
                .unwrap_or_default();
            Err(ClientError::Status {
                status: status.as_u16(),
                message: self.redact(&message),
            })
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Connection(self.redact(&error_chain(err)))
        }
    }

    fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.api_key, "[redacted]")
        }
    }
}

/// Pull a human-readable message out of a Sonarr/Radarr error body.
///
/// Handles `{"message": ...}`, `{"error": ...}` and validation-failure arrays
/// (`[{"propertyName": ..., "errorMessage": ...}]`). Falls back to the raw
/// body, truncated.
fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match &value {
            Value::Object(map) => {
                for key in ["message", "error", "description"] {
                    if let Some(msg) = map.get(key).and_then(Value::as_str) {
                        return Some(msg.to_string());
                    }
                }
            }
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("errorMessage").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return Some(messages.join("; "));
                }
            }
            _ => {}
        }
    }
    Some(truncate_chars(trimmed, MAX_ERROR_BODY_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Flatten a reqwest error and its sources into one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Errors returned by [`ServiceClient`] methods.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    /// Connection refused, DNS failure, TLS failure, etc.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The backend returned a non-2xx HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The response body was not valid JSON.
    #[error("{0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status code, if the backend answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_from_message_field() {
        assert_eq!(
            extract_error_message(r#"{"message": "Unauthorized"}"#).as_deref(),
            Some("Unauthorized")
        );
    }

    #[test]
    fn error_message_from_validation_array() {
        let body = r#"[{"propertyName": "Path", "errorMessage": "Path is required"},
                       {"propertyName": "Title", "errorMessage": "Title is required"}]"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Path is required; Title is required")
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(
            extract_error_message("<html>Bad Gateway</html>").as_deref(),
            Some("<html>Bad Gateway</html>")
        );
        assert_eq!(extract_error_message("   "), None);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let msg = extract_error_message(&body).unwrap();
        assert_eq!(msg.len(), MAX_ERROR_BODY_CHARS + 3);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("éééé", 2), "éé...");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }

    #[test]
    fn redact_scrubs_key() {
        let client = ServiceClient::new(&ServiceEndpoint {
            service: Service::Sonarr,
            base_url: "http://sonarr:8989/".into(),
            api_key: "abc123".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://sonarr:8989");
        assert_eq!(client.redact("bad key abc123"), "bad key [redacted]");
    }

    #[test]
    fn timeout_display_is_in_seconds() {
        let err = ClientError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "request timed out after 0.25s");
    }
}
