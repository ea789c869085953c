// Error handling module
// Defines the error type returned by the client and the services

use thiserror::Error;

/// Errors surfaced by API calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server rejected the credential (401); the session has been cleared
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Server reported an expired token (403); the session has been cleared
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Legitimate permission denial (403); the session is left intact
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success response from the clinic API
    #[error("Clinic API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure (connect, timeout, body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing stored credentials failed
    #[error("Credential storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status of the response that caused the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::SessionExpired(_) | ApiError::Forbidden(_) => Some(403),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error ended the session and the user must log in again
    pub fn is_forced_logout(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::SessionExpired(_))
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
