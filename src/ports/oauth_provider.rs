//! OAuth provider port - authorization URL, code exchange and refresh.

use async_trait::async_trait;

use crate::domain::foundation::IntegrationError;
use crate::domain::project::Credential;

/// Port for the provider's OAuth 2.0 endpoints.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorization URL requesting the accounting, payment and openid scopes.
    ///
    /// `state` comes back unchanged on the callback and correlates it with
    /// the internal user id.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for a credential.
    async fn exchange_code(&self, code: &str) -> Result<Credential, OAuthError>;

    /// Obtains a fresh credential from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, OAuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    #[error("token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected token response: {0}")]
    Decode(String),
}

impl From<OAuthError> for IntegrationError {
    fn from(err: OAuthError) -> Self {
        IntegrationError::auth(err.to_string())
    }
}
