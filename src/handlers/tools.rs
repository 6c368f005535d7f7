use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::services::appointments;
use crate::state::AppState;
use crate::validation;

// POST /api/tools/create-appointment
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = validation::unwrap_payload(&body)?;
    let new = appointments::validate_create(payload).inspect_err(|e| {
        tracing::info!(error = %e, "rejected create-appointment payload");
    })?;

    let appointment = {
        let db = state.conn()?;
        appointments::create_appointment(&db, new, Utc::now())
            .map_err(|e| AppError::Internal(e.context("failed to create appointment")))?
    };

    let appointment_id = appointment.id.clone();
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "appointmentId": appointment_id,
            "appointment": appointment,
        })),
    )
        .into_response())
}

// POST /api/tools/get-future-appointments
pub async fn get_future_appointments(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let payload = validation::unwrap_payload(&body)?;
    let lookup = appointments::validate_lookup(payload)?;

    let found = {
        let db = state.conn()?;
        appointments::future_appointments(&db, &lookup, Utc::now())?
    };

    tracing::debug!(
        organization_id = %lookup.organization_id,
        count = found.len(),
        "future appointments fetched"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "appointments": found,
    })))
}
