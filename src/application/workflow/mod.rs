//! WorkflowOrchestrator - drives a phase from estimate approval to
//! reconciliation.
//!
//! ```text
//! Draft ──approve_estimate/create_phase──► Itemized ──request_payout──► Invoiced
//!                                                                         │
//!              Reconciled ◄──approve_payout (re-fetch)── Paid ◄──approve_payout
//! ```
//!
//! Every operation runs under the user's lock, validates its preconditions
//! before calling out, and checkpoints the whole user record after each
//! confirmed remote mutation. A token refresh is checkpointed before any
//! other call is made.

mod accounts;
mod authorization;
mod estimate;
mod payout;
mod phases;
mod remote_sync;
mod user_locks;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use chrono::Duration;

use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::{Phase, Project, User};
use crate::ports::{AccountingApi, OAuthProvider, UserRepository};

use super::client::AuthorizedClient;
use super::services::AccountingServices;
use super::token_manager::TokenManager;

use user_locks::UserLocks;

pub use phases::UpdatePhaseResult;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Realm used for users whose record does not carry one.
    pub default_realm_id: String,
    /// Upper bound on concurrent item creations in `approve_estimate`.
    pub max_concurrent_requests: usize,
    pub token_refresh_leeway: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            default_realm_id: String::new(),
            max_concurrent_requests: 4,
            token_refresh_leeway: Duration::seconds(60),
        }
    }
}

pub struct WorkflowOrchestrator {
    repository: Arc<dyn UserRepository>,
    oauth: Arc<dyn OAuthProvider>,
    tokens: TokenManager,
    services: AccountingServices,
    settings: WorkflowSettings,
    locks: UserLocks,
}

impl WorkflowOrchestrator {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        oauth: Arc<dyn OAuthProvider>,
        api: Arc<dyn AccountingApi>,
        settings: WorkflowSettings,
    ) -> Self {
        let tokens = TokenManager::new(oauth.clone(), api, settings.token_refresh_leeway);
        Self {
            repository,
            oauth,
            tokens,
            services: AccountingServices::default(),
            settings,
            locks: UserLocks::default(),
        }
    }

    /// Stored record of a user.
    pub async fn user(&self, user_id: &UserId) -> Result<User, IntegrationError> {
        self.load_user(user_id).await
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, IntegrationError> {
        self.repository
            .get(user_id)
            .await?
            .ok_or_else(|| IntegrationError::not_found("User", user_id.as_str()))
    }

    async fn checkpoint(&self, user: &User) -> Result<(), IntegrationError> {
        self.repository.put(&user.id, user).await?;
        tracing::debug!(user_id = %user.id, "DB: SAVED");
        Ok(())
    }

    fn realm_of<'a>(&'a self, user: &'a User) -> &'a str {
        user.realm_id
            .as_deref()
            .unwrap_or(&self.settings.default_realm_id)
    }

    /// Client for the user's realm; a refreshed credential is stored on
    /// `user` and checkpointed before returning.
    async fn authorize(&self, user: &mut User) -> Result<AuthorizedClient, IntegrationError> {
        let credential = user.credential.as_ref().ok_or_else(|| {
            IntegrationError::auth(format!("user '{}' has not connected QuickBooks", user.id))
        })?;

        let valid = self
            .tokens
            .get_valid_client(credential, self.realm_of(user))
            .await?;

        if let Some(refreshed) = valid.refreshed {
            user.credential = Some(refreshed);
            self.checkpoint(user).await?;
            tracing::info!(user_id = %user.id, "Refreshed credential saved");
        }
        Ok(valid.client)
    }
}

fn current_project(user: &User) -> Result<&Project, IntegrationError> {
    user.current_project
        .as_ref()
        .ok_or_else(|| IntegrationError::not_found("CurrentProject", user.id.as_str()))
}

fn current_project_mut(user: &mut User) -> Result<&mut Project, IntegrationError> {
    let user_id = user.id.clone();
    user.current_project
        .as_mut()
        .ok_or_else(|| IntegrationError::not_found("CurrentProject", user_id.as_str()))
}

fn phase_mut<'a>(user: &'a mut User, name: &str) -> Result<&'a mut Phase, IntegrationError> {
    current_project_mut(user)?
        .phase_mut(name)
        .ok_or_else(|| IntegrationError::not_found("Phase", name))
}
