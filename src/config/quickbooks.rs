//! QuickBooks Online configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::quickbooks::{DEFAULT_MINOR_VERSION, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};

use super::error::ValidationError;
use super::server::Environment;

/// Which Intuit API host to talk to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuickBooksEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// OAuth app credentials, API endpoint and webhook verifier token.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickBooksConfig {
    pub client_id: String,

    pub client_secret: SecretString,

    /// Must match the redirect URI registered for the app.
    pub redirect_uri: String,

    #[serde(default)]
    pub environment: QuickBooksEnvironment,

    /// Realm used for users whose record does not carry one.
    #[serde(default)]
    pub realm_id: String,

    #[serde(default = "default_minor_version")]
    pub minor_version: u32,

    /// Overrides the environment's API base URL.
    pub api_base_url: Option<String>,

    pub webhook_verifier_token: SecretString,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl QuickBooksConfig {
    pub fn api_base_url(&self) -> &str {
        match (&self.api_base_url, self.environment) {
            (Some(url), _) => url,
            (None, QuickBooksEnvironment::Sandbox) => SANDBOX_BASE_URL,
            (None, QuickBooksEnvironment::Production) => PRODUCTION_BASE_URL,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate QuickBooks configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("QUICKBOOKS__CLIENT_ID"));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("QUICKBOOKS__CLIENT_SECRET"));
        }
        if self.webhook_verifier_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "QUICKBOOKS__WEBHOOK_VERIFIER_TOKEN",
            ));
        }
        if !is_http_url(&self.redirect_uri) {
            return Err(ValidationError::InvalidRedirectUri);
        }
        if *environment == Environment::Production && !self.redirect_uri.starts_with("https://") {
            return Err(ValidationError::RedirectUriMustBeHttps);
        }
        if let Some(url) = &self.api_base_url {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidApiBaseUrl);
            }
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

fn default_minor_version() -> u32 {
    DEFAULT_MINOR_VERSION
}

fn default_request_timeout() -> u64 {
    30
}
