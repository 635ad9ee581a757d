use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::few_shot::ExampleError;
use crate::session::SessionError;
use crate::source::SourceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExampleError> for AppError {
    fn from(err: ExampleError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::WrongScreen { .. } | SessionError::NotLoaded => {
                AppError::Conflict(err.to_string())
            }
            SessionError::DraftNotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::EmptyReview => AppError::Validation(err.to_string()),
            SessionError::Source(e) => AppError::Source(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Source(e @ SourceError::SourceNotFound { .. }) => {
                (StatusCode::NOT_FOUND, e.code(), e.to_string())
            }
            AppError::Source(e @ SourceError::EmptyResult) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.code(), e.to_string())
            }
            AppError::Source(e @ SourceError::Export(inner)) => {
                tracing::error!("Review export error: {inner}");
                (
                    StatusCode::BAD_GATEWAY,
                    e.code(),
                    "Reviews could not be exported from the data source".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
