//! AccountService - chart-of-accounts lookups.
//!
//! Active/AccountType acceptance rules belong to the workflow, not here.

use serde_json::{json, Map, Value};

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{Account, AccountSummary, EntityKind, Query};
use crate::domain::foundation::IntegrationError;

/// Fields of a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: String,
    pub account_sub_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccountService;

impl AccountService {
    pub async fn get_by_id(
        &self,
        client: &AuthorizedClient,
        account_id: &str,
    ) -> Result<Account, IntegrationError> {
        client.read(EntityKind::Account, account_id).await
    }

    pub async fn create(
        &self,
        client: &AuthorizedClient,
        account: &NewAccount,
    ) -> Result<Account, IntegrationError> {
        let mut body = Map::new();
        body.insert("Name".to_string(), json!(account.name));
        body.insert("AccountType".to_string(), json!(account.account_type));
        if let Some(sub_type) = &account.account_sub_type {
            body.insert("AccountSubType".to_string(), json!(sub_type));
        }

        let created: Account = client.create(EntityKind::Account, Value::Object(body)).await?;
        tracing::info!(account_id = %created.id, name = %created.name, "Account created");
        Ok(created)
    }

    /// Accounts whose name starts with `prefix`.
    pub async fn find_by_name_prefix(
        &self,
        client: &AuthorizedClient,
        prefix: &str,
    ) -> Result<Vec<AccountSummary>, IntegrationError> {
        let query = Query::select(EntityKind::Account)
            .fields(["Name", "AccountType", "AccountSubType"])
            .like("Name", format!("{}%", prefix));

        Ok(client.query(&query).await?.all(EntityKind::Account)?)
    }
}
