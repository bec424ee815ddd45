use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use crate::lookup::upstream::UpstreamError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Admission denied by the rate limiter. Flow control, not a fault.
    #[error("Rate limit exceeded until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "code": "NOT_FOUND", "message": msg }),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "code": "VALIDATION_ERROR", "message": msg }),
            ),
            AppError::RateLimited { reset_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "code": "RATE_LIMITED",
                    "message": "Rate limit exceeded",
                    "reset_at": reset_at,
                }),
            ),
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {e}");
                let message = match e.status() {
                    Some(status) => format!("Upstream request failed ({status})"),
                    None => "Upstream request failed".to_string(),
                };
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "code": "UPSTREAM_ERROR", "message": message }),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "code": "DATABASE_ERROR", "message": "A database error occurred" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "code": "INTERNAL_ERROR",
                        "message": "An internal server error occurred",
                    }),
                )
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}
