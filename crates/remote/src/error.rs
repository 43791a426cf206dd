//! Error types for the remote backend crate.

use finanzas_core::remote::RemoteQueryError;
use thiserror::Error;

/// Result type alias for remote backend operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the backend
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Invalid request (bad base URL, malformed table name, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (malformed key or token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl RemoteError {
    pub fn api(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<RemoteError> for RemoteQueryError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Api {
                status,
                code,
                message,
            } => {
                let query_error = RemoteQueryError::new(message).with_status(status);
                match code {
                    Some(code) => query_error.with_code(code),
                    None => query_error,
                }
            }
            RemoteError::Http(err) => match err.status() {
                Some(status) => RemoteQueryError::new(err.to_string()).with_status(status.as_u16()),
                None => RemoteQueryError::new(err.to_string()),
            },
            other => RemoteQueryError::new(other.to_string()),
        }
    }
}
