use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::services::recaptcha;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRecaptchaRequest {
    #[serde(default)]
    pub token: Option<String>,
}

// POST /api/verify-recaptcha
pub async fn verify_recaptcha(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // A malformed body is treated like a missing token.
    let req: VerifyRecaptchaRequest = serde_json::from_slice(&body).unwrap_or_default();
    let token = req.token.unwrap_or_default();

    let verdict = recaptcha::verify_token(
        state.recaptcha.as_ref(),
        state.config.recaptcha_secret_key.as_deref(),
        &token,
        state.config.recaptcha_min_score,
    )
    .await;

    match verdict {
        Ok(true) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "recaptcha verification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
