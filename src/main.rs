use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use qyvoo::config::AppConfig;
use qyvoo::db;
use qyvoo::routes;
use qyvoo::services::billing::stripe::StripeClient;
use qyvoo::services::billing::BillingProvider;
use qyvoo::services::recaptcha::google::GoogleRecaptcha;
use qyvoo::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let conn = db::init_db(&config.database_url)?;

    let billing: Option<Box<dyn BillingProvider>> = match &config.stripe_secret_key {
        Some(key) => {
            tracing::info!("Stripe billing enabled");
            Some(Box::new(StripeClient::new(key.clone())))
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, pricing endpoint disabled");
            None
        }
    };
    if config.recaptcha_secret_key.is_none() {
        tracing::warn!("RECAPTCHA_SECRET_KEY not set, all reCAPTCHA tokens will be rejected");
    }
    tracing::info!(
        project_id = %config.firebase_admin.project_id,
        client_email = %config.firebase_admin.client_email,
        "identity admin credentials loaded"
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        billing,
        recaptcha: Box::new(GoogleRecaptcha::new()),
    });

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
