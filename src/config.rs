use std::env;

use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("invalid configuration: missing [{}], invalid [{}]", .missing.join(", "), .invalid.join(", "))]
pub struct ConfigError {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<String>,
}

/// Public identity provider settings handed to the browser.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseClientConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

#[derive(Clone)]
pub struct FirebaseAdminConfig {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
}

impl std::fmt::Debug for FirebaseAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAdminConfig")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub firebase: FirebaseClientConfig,
    pub firebase_admin: FirebaseAdminConfig,
    pub stripe_secret_key: Option<String>,
    pub recaptcha_secret_key: Option<String>,
    pub recaptcha_min_score: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, collecting every
    /// missing or malformed variable before failing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = vec![];
        let mut invalid = vec![];

        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut required = |key: &'static str| match optional(key) {
            Some(v) => v,
            None => {
                missing.push(key);
                String::new()
            }
        };

        let firebase = FirebaseClientConfig {
            api_key: required("FIREBASE_API_KEY"),
            auth_domain: required("FIREBASE_AUTH_DOMAIN"),
            project_id: required("FIREBASE_PROJECT_ID"),
            storage_bucket: required("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: required("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: required("FIREBASE_APP_ID"),
        };

        let firebase_admin = FirebaseAdminConfig {
            project_id: required("FIREBASE_ADMIN_PROJECT_ID"),
            client_email: required("FIREBASE_ADMIN_CLIENT_EMAIL"),
            // .env files usually carry the PEM with escaped newlines
            private_key: required("FIREBASE_ADMIN_PRIVATE_KEY").replace("\\n", "\n"),
        };

        let port: u16 = match optional("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                invalid.push(format!("PORT={raw}"));
                0
            }),
            None => 3000,
        };

        let recaptcha_min_score = match optional("RECAPTCHA_MIN_SCORE") {
            Some(raw) => match raw.parse::<f64>() {
                Ok(score) if (0.0..=1.0).contains(&score) => score,
                _ => {
                    invalid.push(format!("RECAPTCHA_MIN_SCORE={raw}"));
                    0.0
                }
            },
            None => 0.5,
        };

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(ConfigError { missing, invalid });
        }

        Ok(Self {
            port,
            database_url: optional("DATABASE_URL").unwrap_or_else(|| "qyvoo.db".to_string()),
            firebase,
            firebase_admin,
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            recaptcha_secret_key: optional("RECAPTCHA_SECRET_KEY"),
            recaptcha_min_score,
        })
    }
}
