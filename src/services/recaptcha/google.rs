use anyhow::Context;
use async_trait::async_trait;

use super::{RecaptchaProvider, SiteVerifyResponse};

const SITE_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

pub struct GoogleRecaptcha {
    client: reqwest::Client,
    verify_url: String,
}

impl GoogleRecaptcha {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: SITE_VERIFY_URL.to_string(),
        }
    }
}

impl Default for GoogleRecaptcha {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecaptchaProvider for GoogleRecaptcha {
    async fn site_verify(&self, secret: &str, token: &str) -> anyhow::Result<SiteVerifyResponse> {
        let resp = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .context("failed to call reCAPTCHA siteverify")?
            .error_for_status()
            .context("reCAPTCHA siteverify returned error")?;

        resp.json()
            .await
            .context("failed to parse reCAPTCHA response")
    }
}
