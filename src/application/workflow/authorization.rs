//! OAuth connect flow: authorization redirect and callback.

use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::User;

use super::WorkflowOrchestrator;

impl WorkflowOrchestrator {
    /// Provider consent URL carrying `user_id` as the OAuth state.
    pub fn authorize_url(&self, user_id: &UserId) -> String {
        self.oauth.authorize_url(user_id.as_str())
    }

    /// Exchanges the callback code and stores the credential on the user
    /// named by `state`.
    ///
    /// An existing record keeps its accounts, customer and project; only the
    /// credential (and the realm, when the callback reports one) is replaced.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
        realm_id: Option<String>,
    ) -> Result<User, IntegrationError> {
        let user_id = UserId::new(state)?;
        if code.trim().is_empty() {
            return Err(IntegrationError::validation("code", "is required"));
        }

        let _guard = self.locks.acquire(&user_id).await;
        let credential = self.oauth.exchange_code(code).await?;

        let user = match self.repository.get(&user_id).await? {
            Some(mut user) => {
                user.credential = Some(credential);
                if realm_id.is_some() {
                    user.realm_id = realm_id;
                }
                user
            }
            None => User::connected(user_id.clone(), credential, realm_id),
        };
        self.checkpoint(&user).await?;

        tracing::info!(user_id = %user_id, realm_id = ?user.realm_id, "Authorization completed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{harness, REALM};
    use crate::domain::foundation::{IntegrationError, UserId};
    use crate::ports::{OAuthError, UserRepository};

    #[tokio::test]
    async fn authorize_url_carries_user_as_state() {
        let h = harness().await;

        let url = h.orchestrator.authorize_url(&h.user_id);

        assert!(url.ends_with("state=pro"));
    }

    #[tokio::test]
    async fn callback_creates_new_user() {
        let h = harness().await;

        let user = h
            .orchestrator
            .complete_authorization("code-1", "newbie", Some("4620".to_string()))
            .await
            .unwrap();

        assert_eq!(user.credential.as_ref().unwrap().access_token, "access-1");
        assert_eq!(user.realm_id.as_deref(), Some("4620"));
        let stored = h
            .repository
            .get(&UserId::new("newbie").unwrap())
            .await
            .unwrap();
        assert_eq!(stored, Some(user));
        assert_eq!(h.oauth.exchanged_codes(), vec!["code-1".to_string()]);
    }

    #[tokio::test]
    async fn callback_keeps_existing_user_data() {
        let h = harness().await;
        let before = h.stored_user().await;

        let user = h
            .orchestrator
            .complete_authorization("code-2", "pro", None)
            .await
            .unwrap();

        assert_eq!(user.credential.as_ref().unwrap().access_token, "access-1");
        assert_eq!(user.realm_id.as_deref(), Some(REALM));
        assert_eq!(user.accounts, before.accounts);
        assert_eq!(user.current_project, before.current_project);
    }

    #[tokio::test]
    async fn callback_requires_state_and_code() {
        let h = harness().await;

        let err = h
            .orchestrator
            .complete_authorization("code", " ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Validation { .. }));

        let err = h
            .orchestrator
            .complete_authorization("", "pro", None)
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Validation { .. }));
        assert!(h.oauth.exchanged_codes().is_empty());
    }

    #[tokio::test]
    async fn rejected_exchange_is_auth_error_and_saves_nothing() {
        let h = harness().await;
        h.oauth.fail_next(OAuthError::Rejected {
            status: 400,
            body: "invalid_grant".to_string(),
        });

        let err = h
            .orchestrator
            .complete_authorization("bad", "pro", None)
            .await
            .unwrap_err();

        assert!(matches!(err, IntegrationError::Auth(_)));
        assert_eq!(h.repository.write_count(), 0);
    }
}
