use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Deletes the team member's user document.
///
/// The identity-provider account is left in place, so the person can still
/// sign in; they just no longer belong to any organization. When the caller
/// is known, only members of the caller's own organization can be removed.
pub fn remove_team_member(conn: &Connection, uid: &str, caller: Option<&str>) -> ActionResult {
    let uid = uid.trim();
    if uid.is_empty() {
        return ActionResult::failed("User ID is required");
    }

    if let Some(caller) = caller {
        match may_remove(conn, caller, uid) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(caller = %caller, uid = %uid, "removal outside caller's organization refused");
                return ActionResult::failed("Not allowed to remove this member");
            }
            Err(e) => {
                tracing::error!(error = %e, uid = %uid, "failed to check caller organization");
                return ActionResult::failed("Failed to remove team member");
            }
        }
    }

    match queries::delete_user(conn, uid) {
        Ok(true) => {
            tracing::warn!(uid = %uid, "user document removed; identity account was not deleted");
            ActionResult::ok()
        }
        Ok(false) => ActionResult::failed("Team member not found"),
        Err(e) => {
            tracing::error!(error = %e, uid = %uid, "failed to remove team member");
            ActionResult::failed("Failed to remove team member")
        }
    }
}

// An unknown target falls through to the not-found result.
fn may_remove(conn: &Connection, caller: &str, uid: &str) -> anyhow::Result<bool> {
    let Some(caller) = queries::get_user(conn, caller)? else {
        return Ok(false);
    };
    Ok(match queries::get_user(conn, uid)? {
        Some(target) => target.organization_id == caller.organization_id,
        None => true,
    })
}

/// Whether `caller` belongs to `organization_id`.
pub fn is_member_of(conn: &Connection, caller: &str, organization_id: &str) -> anyhow::Result<bool> {
    Ok(queries::get_user(conn, caller)?.is_some_and(|u| u.organization_id == organization_id))
}

pub fn list_members(conn: &Connection, organization_id: &str) -> anyhow::Result<Vec<User>> {
    queries::list_users_in_organization(conn, organization_id)
}
