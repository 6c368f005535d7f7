use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: &'static str,
        details: FieldErrors,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("upstream error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("gone: {0}")]
    Gone(&'static str),
}

impl AppError {
    pub fn validation(message: &'static str, details: FieldErrors) -> Self {
        AppError::Validation { message, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message, "details": details }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            AppError::NotConfigured(what) => {
                tracing::error!(service = %what, "request needs an unconfigured service");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": format!("{what} is not configured") }),
                )
            }
            // Upstream and internal causes stay in the logs only.
            AppError::Upstream(e) => {
                tracing::error!(error = %format!("{e:#}"), "upstream call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Upstream service request failed" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, serde_json::json!({ "error": msg }))
            }
            AppError::Gone(msg) => (StatusCode::GONE, serde_json::json!({ "error": msg })),
        };

        (status, axum::Json(body)).into_response()
    }
}
