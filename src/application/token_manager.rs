//! TokenManager - hands out clients that carry an unexpired access token.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::foundation::IntegrationError;
use crate::domain::project::Credential;
use crate::ports::{AccountingApi, OAuthProvider};

use super::client::AuthorizedClient;

/// Client plus the replacement credential, when a refresh happened.
///
/// The caller must persist `refreshed` before doing anything else.
#[derive(Debug)]
pub struct ValidClient {
    pub client: AuthorizedClient,
    pub refreshed: Option<Credential>,
}

pub struct TokenManager {
    oauth: Arc<dyn OAuthProvider>,
    api: Arc<dyn AccountingApi>,
    /// Tokens expiring within this window are refreshed early.
    leeway: Duration,
}

impl TokenManager {
    pub fn new(
        oauth: Arc<dyn OAuthProvider>,
        api: Arc<dyn AccountingApi>,
        leeway: Duration,
    ) -> Self {
        Self { oauth, api, leeway }
    }

    /// Returns a client for `realm_id`, refreshing the credential once if
    /// its access token has expired.
    ///
    /// # Errors
    ///
    /// `IntegrationError::Auth` when the refresh token has lapsed or the
    /// refresh round trip fails.
    pub async fn get_valid_client(
        &self,
        credential: &Credential,
        realm_id: &str,
    ) -> Result<ValidClient, IntegrationError> {
        let now = Utc::now();
        if credential.is_valid_at(now, self.leeway) {
            return Ok(ValidClient {
                client: AuthorizedClient::new(self.api.clone(), &credential.access_token, realm_id),
                refreshed: None,
            });
        }

        if matches!(credential.refresh_token_expires_at, Some(expiry) if expiry <= now) {
            tracing::warn!(realm_id, "Refresh token expired; reconnect required");
            return Err(IntegrationError::auth(
                "refresh token expired, the user must reconnect",
            ));
        }

        tracing::info!(realm_id, expires_at = %credential.expires_at, "Access token expired, refreshing");
        let mut refreshed = self.oauth.refresh(&credential.refresh_token).await?;
        refreshed.created_at = Utc::now();

        Ok(ValidClient {
            client: AuthorizedClient::new(self.api.clone(), &refreshed.access_token, realm_id),
            refreshed: Some(refreshed),
        })
    }
}
