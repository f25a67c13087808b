//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Photo with the given ID was not found on the user
    #[error("Photo not found")]
    PhotoNotFound,

    /// Request failed a business rule (already-main photo, deleting main photo, ...)
    #[error("{0}")]
    Validation(String),

    /// The external photo storage service reported an error
    #[error("{0}")]
    PhotoStorage(String),

    /// The repository commit failed; message matches what the endpoint promises
    #[error("{0}")]
    PersistenceFailed(String),

    /// Caller did not present a usable identity
    #[error("Unauthorized")]
    Unauthorized,

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::PhotoNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PhotoStorage(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PersistenceFailed(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
