use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use sitepulse_core::error::CoreError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("unauthorized")]
    Unauthorized,

    /// The site is missing or belongs to someone else. The two cases are
    /// deliberately indistinguishable to the caller.
    #[error("not allowed")]
    NotAllowed,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, message } => Self::validation(field, message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "code": "validation_error",
                        "message": message,
                        "field": field
                    }
                })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": {
                        "code": "unauthorized",
                        "message": "Unauthorized",
                        "field": null
                    }
                })),
            )
                .into_response(),
            AppError::NotAllowed => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "not allowed" })),
            )
                .into_response(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": {
                            "code": "internal_error",
                            "message": "Internal server error",
                            "field": null
                        }
                    })),
                )
                    .into_response()
            }
        }
    }
}
