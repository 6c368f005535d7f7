pub mod google;

use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait RecaptchaProvider: Send + Sync {
    async fn site_verify(&self, secret: &str, token: &str) -> anyhow::Result<SiteVerifyResponse>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    /// Only present for v3 keys.
    pub score: Option<f64>,
    pub action: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

/// Checks a client token. Fails closed: a missing secret or an empty token
/// yields `false` without contacting the provider.
pub async fn verify_token(
    provider: &dyn RecaptchaProvider,
    secret: Option<&str>,
    token: &str,
    min_score: f64,
) -> anyhow::Result<bool> {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        tracing::warn!("RECAPTCHA_SECRET_KEY not configured, rejecting token");
        return Ok(false);
    };
    let token = token.trim();
    if token.is_empty() {
        return Ok(false);
    }

    let resp = provider.site_verify(secret, token).await?;
    if !resp.success {
        tracing::info!(error_codes = ?resp.error_codes, "recaptcha token rejected");
        return Ok(false);
    }

    match resp.score {
        Some(score) if score < min_score => {
            tracing::info!(score, min_score, action = ?resp.action, "recaptcha score below threshold");
            Ok(false)
        }
        _ => Ok(true),
    }
}
