//! Client error types

use thiserror::Error;

use crate::session::SessionError;

/// Client error type
///
/// HTTP status codes map onto the variants below; the carried string is the
/// server's `message` field when the body parses as an error envelope,
/// otherwise the raw response text.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, protocol)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 401 - missing, expired or rejected token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403 - permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// 404 - resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409 - uniqueness conflict (duplicate account, duplicate review)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 400 - validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// 5xx or anything else
    #[error("Server error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// True for responses that invalidate the current login (401/403)
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_) | ClientError::Forbidden(_)
        )
    }
}
