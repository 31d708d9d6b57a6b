/*
[INPUT]:  Error sources (HTTP, API, serialization, auth, WebSocket, host/surface)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Xumm session adapter
#[derive(Error, Debug)]
pub enum XummError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local session storage failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    /// Payload creation produced no payload
    #[error("Invalid payload: the service did not create a payload for this body")]
    InvalidPayload,

    /// A sign request is already awaiting its signature
    #[error("A sign request is already in progress")]
    SignInProgress,

    /// The embedded host refused or failed to close
    #[error("Embedded host error: {0}")]
    Host(String),

    /// Opening or closing a redirect surface failed
    #[error("Redirect surface error: {0}")]
    Surface(String),
}

impl XummError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            XummError::Http(_)
                | XummError::RateLimit { .. }
                | XummError::WebSocket(_)
                | XummError::InvalidResponse(_)
        )
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, XummError::Authentication { .. })
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        XummError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Xumm operations
pub type Result<T> = std::result::Result<T, XummError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let rate_limited = XummError::RateLimit { retry_after: 5 };
        assert!(rate_limited.is_retryable());

        assert!(!XummError::InvalidPayload.is_retryable());
        assert!(!XummError::SignInProgress.is_retryable());
    }

    #[test]
    fn test_error_is_auth_error() {
        let err = XummError::Authentication {
            message: "sign-in rejected".to_string(),
        };
        assert!(err.is_auth_error());
        assert!(!XummError::InvalidPayload.is_auth_error());
    }

    #[test]
    fn test_api_error_creation() {
        let err = XummError::api_error(StatusCode::BAD_REQUEST, "Invalid payload body");
        match err {
            XummError::Api { code, message } => {
                assert_eq!(code, 400);
                assert_eq!(message, "Invalid payload body");
            }
            _ => panic!("Expected Api error variant"),
        }
    }
}
