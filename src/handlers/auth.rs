use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::auth_gate::{self, GateDecision, View};
use crate::state::AppState;

/// Set by the identity layer in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub struct GateQuery {
    pub view: String,
}

/// The caller's uid, if the identity layer supplied one.
pub fn caller_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// GET /api/auth/gate?view=dashboard
pub async fn gate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<GateQuery>,
) -> Result<Json<GateDecision>, AppError> {
    let view = View::parse(&query.view)
        .ok_or_else(|| AppError::BadRequest(format!("unknown view: {}", query.view)))?;

    let user = match caller_id(&headers) {
        Some(id) => {
            let db = state.conn()?;
            queries::get_user(&db, id)?
        }
        None => None,
    };

    Ok(Json(auth_gate::evaluate(user.as_ref(), view)))
}
