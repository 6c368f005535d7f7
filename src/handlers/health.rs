use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::config::FirebaseClientConfig;
use crate::state::AppState;

// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// GET /api/client-config
pub async fn client_config(State(state): State<Arc<AppState>>) -> Json<FirebaseClientConfig> {
    Json(state.config.firebase.clone())
}
