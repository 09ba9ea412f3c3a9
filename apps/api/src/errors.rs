use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sources::SourceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Only I/O boundaries produce these. Parsing and scoring never fail, and an empty profile is
/// a result state, not an error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Recommendation profile unavailable: {0}")]
    ProfileUnavailable(SourceError),

    #[error("Catalog fetch failed: {0}")]
    Catalog(SourceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ProfileUnavailable(e) | AppError::Catalog(e) => e.is_retryable(),
            AppError::Validation(_) | AppError::Internal(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ProfileUnavailable(e) => {
                tracing::error!("Profile source error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROFILE_UNAVAILABLE",
                    "The recommendation profile could not be fetched".to_string(),
                )
            }
            AppError::Catalog(e) if e.is_timeout() => {
                tracing::error!("Catalog timeout: {e}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "CATALOG_TIMEOUT",
                    "The catalog did not answer in time".to_string(),
                )
            }
            AppError::Catalog(e) => {
                tracing::error!("Catalog error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "CATALOG_UNAVAILABLE",
                    "The catalog could not be fetched".to_string(),
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
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
