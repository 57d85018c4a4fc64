//! Income/expense account selection and lookup.

use crate::domain::accounting::{Account, AccountSummary};
use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::AccountRole;

use super::WorkflowOrchestrator;

impl WorkflowOrchestrator {
    /// Fetches `account_id` and stores it as the user's account for `role`.
    ///
    /// The account must be active and of the type the role requires.
    pub async fn select_account(
        &self,
        user_id: &UserId,
        account_id: &str,
        role: AccountRole,
    ) -> Result<Account, IntegrationError> {
        if account_id.trim().is_empty() {
            return Err(IntegrationError::validation("accountId", "is required"));
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;
        let client = self.authorize(&mut user).await?;

        let account = self.services.accounts.get_by_id(&client, account_id).await?;
        if !account.active {
            return Err(IntegrationError::validation(
                "accountId",
                format!("account '{}' is inactive", account.name),
            ));
        }
        let required = role.required_account_type();
        if account.account_type != required {
            return Err(IntegrationError::validation(
                "accountId",
                format!(
                    "account '{}' has type '{}', expected '{}'",
                    account.name, account.account_type, required
                ),
            ));
        }

        match role {
            AccountRole::Income => user.accounts.income = Some(account.clone()),
            AccountRole::Expense => user.accounts.expense = Some(account.clone()),
        }
        self.checkpoint(&user).await?;

        tracing::info!(user_id = %user_id, account_id, ?role, "Account selected");
        Ok(account)
    }

    /// Accounts whose name starts with `prefix`.
    pub async fn find_accounts(
        &self,
        user_id: &UserId,
        prefix: &str,
    ) -> Result<Vec<AccountSummary>, IntegrationError> {
        if prefix.is_empty() {
            return Err(IntegrationError::validation("name", "search prefix is required"));
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;
        let client = self.authorize(&mut user).await?;

        self.services
            .accounts
            .find_by_name_prefix(&client, prefix)
            .await
    }
}
