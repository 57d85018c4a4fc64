//! Intuit OAuth 2.0 adapter.
//!
//! Implements `OAuthProvider`: builds the app-center authorize URL and
//! talks to the bearer token endpoint with HTTP basic client credentials.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::project::Credential;
use crate::ports::{OAuthError, OAuthProvider};

pub const AUTHORIZE_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
pub const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

pub const SCOPE_ACCOUNTING: &str = "com.intuit.quickbooks.accounting";
pub const SCOPE_PAYMENT: &str = "com.intuit.quickbooks.payment";
pub const SCOPE_OPENID: &str = "openid";

/// OAuth application settings.
#[derive(Clone)]
pub struct IntuitOAuthConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    timeout: Duration,
}

impl IntuitOAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom token endpoint (for testing).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for IntuitOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntuitOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    x_refresh_token_expires_in: Option<i64>,
}

impl TokenGrant {
    fn into_credential(self) -> Result<Credential, OAuthError> {
        Credential::issue(
            self.access_token,
            self.refresh_token,
            self.expires_in,
            self.x_refresh_token_expires_in,
            Utc::now(),
        )
        .map_err(|e| OAuthError::Decode(e.to_string()))
    }
}

/// reqwest implementation of `OAuthProvider`.
pub struct IntuitOAuthClient {
    config: IntuitOAuthConfig,
    http_client: reqwest::Client,
}

impl IntuitOAuthClient {
    pub fn new(config: IntuitOAuthConfig) -> Result<Self, OAuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<Credential, OAuthError> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .header(ACCEPT, "application/json")
            .form(params)
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Token endpoint rejected request");
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| OAuthError::Decode(e.to_string()))?;

        grant.into_credential()
    }
}

#[async_trait]
impl OAuthProvider for IntuitOAuthClient {
    fn authorize_url(&self, state: &str) -> String {
        let scope = [SCOPE_ACCOUNTING, SCOPE_PAYMENT, SCOPE_OPENID].join(" ");
        format!(
            "{}?client_id={}&response_type=code&scope={}&redirect_uri={}&state={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential, OAuthError> {
        tracing::info!("Exchanging authorization code");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credential, OAuthError> {
        tracing::info!("Refreshing access token");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}
