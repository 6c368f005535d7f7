use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::billing::{partition_prices, PriceListing, PRICE_LIST_LIMIT};
use crate::state::AppState;

// GET /api/stripe-prices
pub async fn stripe_prices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PriceListing>, AppError> {
    let billing = state
        .billing
        .as_deref()
        .ok_or(AppError::NotConfigured("Stripe"))?;

    let prices = billing
        .list_active_prices(PRICE_LIST_LIMIT)
        .await
        .map_err(AppError::Upstream)?;

    let listing = partition_prices(&prices);
    tracing::debug!(
        fetched = prices.len(),
        monthly = listing.monthly.len(),
        yearly = listing.yearly.len(),
        "stripe prices listed"
    );

    Ok(Json(listing))
}
