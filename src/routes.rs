use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/client-config", get(handlers::health::client_config))
        .route("/api/auth/gate", get(handlers::auth::gate))
        .route(
            "/api/tools/create-appointment",
            post(handlers::tools::create_appointment),
        )
        .route(
            "/api/tools/get-future-appointments",
            post(handlers::tools::get_future_appointments),
        )
        .route("/api/stripe-prices", get(handlers::billing::stripe_prices))
        .route(
            "/api/verify-recaptcha",
            post(handlers::recaptcha::verify_recaptcha),
        )
        .route(
            "/api/delete-managed-user",
            post(handlers::team::delete_managed_user),
        )
        .route(
            "/api/actions/remove-team-member",
            post(handlers::team::remove_team_member),
        )
        .route(
            "/api/team/:organization_id/members",
            get(handlers::team::list_members),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
