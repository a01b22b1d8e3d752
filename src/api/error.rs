//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dashboard::DashboardError;
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No session, or the store rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Record store or auth service error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::NotAuthenticated => ApiError::Unauthorized(err.to_string()),
            DashboardError::LoadNotFound(id) => ApiError::NotFound(format!("load {}", id)),
            DashboardError::NotEditing => ApiError::Validation(err.to_string()),
            DashboardError::Edit(e) => ApiError::Validation(e.to_string()),
            DashboardError::Store(e) => ApiError::Store(e),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Store(StoreError::Timeout) => (StatusCode::GATEWAY_TIMEOUT, "STORE_TIMEOUT"),
            ApiError::Store(StoreError::Unavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ApiError::Store(StoreError::NotAuthenticated) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let message = match &self {
            ApiError::Store(e) => e.message(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::EditError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(DashboardError::NotAuthenticated), StatusCode::UNAUTHORIZED),
            (
                ApiError::from(DashboardError::LoadNotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(DashboardError::Edit(EditError::InvalidRate("a".into()))),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Store(StoreError::Timeout), StatusCode::GATEWAY_TIMEOUT),
            (
                ApiError::Store(StoreError::Api {
                    status: 403,
                    message: "denied".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
