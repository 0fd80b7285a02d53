//! Custom error types for the registry service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Custom error type for the registry service
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more fields failed validation
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Business-rule failure with a client-facing message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, invalid, or expired credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested record does not exist or is deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error; details are logged, never returned
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, json!({ "errors": errors }))
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Invalid or missing credentials." }),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Internal server error." }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for registry results
pub type ApiResult<T> = Result<T, ApiError>;
