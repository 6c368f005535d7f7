use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::{BillingProvider, Price};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PriceList {
    data: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE.to_string())
    }

    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> anyhow::Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = resp.text().await.unwrap_or_default();
        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        tracing::error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!("Stripe API request failed: {context} (status {status}, request_id={request_id:?})");
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn list_active_prices(&self, limit: u32) -> anyhow::Result<Vec<Price>> {
        // https://stripe.com/docs/api/prices/list
        let limit = limit.to_string();
        let resp = self
            .http
            .get(format!("{}/prices", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .query(&[
                ("active", "true"),
                ("limit", limit.as_str()),
                ("expand[]", "data.product"),
            ])
            .send()
            .await
            .context("failed to call Stripe prices API")?;
        let resp = Self::ensure_success(resp, "list prices").await?;

        let list: PriceList = resp
            .json()
            .await
            .context("failed to parse Stripe price list")?;
        Ok(list.data)
    }
}
