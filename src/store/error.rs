//! Record store error types

use thiserror::Error;

/// Errors that can occur when talking to the record store or auth service
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error body
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session file error: {0}")]
    SessionFile(String),
}

impl StoreError {
    /// Classify a transport error the same way for every call
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Unavailable
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Request(err)
        }
    }

    /// Message shown to the user, without the status prefix for API errors
    pub fn message(&self) -> String {
        match self {
            StoreError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status the service answered with, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message() {
        let err = StoreError::Api {
            status: 403,
            message: "permission denied for table loads".to_string(),
        };
        assert_eq!(err.message(), "permission denied for table loads");
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.to_string(),
            "API error 403: permission denied for table loads"
        );
    }

    #[test]
    fn test_other_messages() {
        assert_eq!(StoreError::Timeout.message(), "Request timeout");
        assert_eq!(StoreError::NotAuthenticated.status(), None);
    }
}
