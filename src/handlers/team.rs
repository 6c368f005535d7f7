use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::caller_id;
use crate::models::User;
use crate::services::team::{self, ActionResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RemoveTeamMemberRequest {
    #[serde(default)]
    pub uid: String,
}

// POST /api/actions/remove-team-member
pub async fn remove_team_member(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<ActionResult> {
    let req: RemoveTeamMemberRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => return Json(ActionResult::failed("Invalid request body")),
    };

    let result = match state.conn() {
        Ok(db) => team::remove_team_member(&db, &req.uid, caller_id(&headers)),
        Err(e) => {
            tracing::error!(error = %e, "database unavailable");
            ActionResult::failed("Failed to remove team member")
        }
    };
    Json(result)
}

// GET /api/team/:organization_id/members
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(organization_id): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    let caller = caller_id(&headers).ok_or(AppError::Forbidden("Sign in to list team members"))?;
    let db = state.conn()?;
    if !team::is_member_of(&db, caller, &organization_id)? {
        return Err(AppError::Forbidden("Not a member of this organization"));
    }
    let members = team::list_members(&db, &organization_id)?;
    Ok(Json(members))
}

// POST /api/delete-managed-user
pub async fn delete_managed_user() -> AppError {
    AppError::Gone("This endpoint is deprecated. Use the remove-team-member action instead.")
}
