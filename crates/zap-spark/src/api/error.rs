//! Spark API error types
//!
//! Failed requests carry the HTTP status and whatever the bridge returned in
//! the body. JSON bodies are expected to look like:
//!
//! ```json
//! {
//!   "code": "INSUFFICIENT_FUNDS",
//!   "message": "Human-readable error message"
//! }
//! ```
//!
//! Bodies that are not JSON are kept verbatim as the message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spark API error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spark returned an error response
    #[error("Breez request failed: {0}")]
    Api(#[from] SparkApiError),
}

/// Error response of the Spark bridge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} {message}")]
pub struct SparkApiError {
    /// HTTP status code
    pub status: u16,
    /// Error code, if the body had one
    pub code: Option<String>,
    /// Error message
    pub message: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SparkApiError {
    /// Build from a non-success response
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let code = parsed.code.map(|code| match code {
            serde_json::Value::String(code) => code,
            other => other.to_string(),
        });

        let message = parsed
            .message
            .or(parsed.error)
            .unwrap_or_else(|| body.trim().to_string());

        Self {
            status,
            code,
            message,
        }
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_body() {
        let err = SparkApiError::from_response(
            402,
            r#"{"code":"INSUFFICIENT_FUNDS","message":"insufficient funds"}"#,
        );
        assert_eq!(err.code.as_deref(), Some("INSUFFICIENT_FUNDS"));
        assert_eq!(err.to_string(), "402 insufficient funds");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_plain_error_body() {
        let err = SparkApiError::from_response(502, "Bad Gateway\n");
        assert_eq!(err.code, None);
        assert_eq!(err.message, "Bad Gateway");
        assert!(err.is_server_error());

        let err = SparkApiError::from_response(400, r#"{"code":17,"error":"bad bolt11"}"#);
        assert_eq!(err.code.as_deref(), Some("17"));
        assert_eq!(err.message, "bad bolt11");
    }
}
