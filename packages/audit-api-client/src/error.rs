//! Error types for the audit API client.

use thiserror::Error;

/// Result type for audit API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Audit API client errors.
///
/// `Display` output is meant to be shown to an operator as-is.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Configuration error (missing base URL, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected locally before it was sent
    #[error("{0}")]
    InvalidRequest(String),

    /// Network error (connection refused, timeout, body read failure)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is the server's `message` field when it
    /// sent one, otherwise a generic status line.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response shape)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status for server-side rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
