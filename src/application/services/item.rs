//! ItemService - one service item per phase.

use serde_json::{json, Map, Value};

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{
    build_item_name, item_description, item_unit_price, Account, EntityKind, Item,
};
use crate::domain::foundation::IntegrationError;
use crate::domain::project::Task;

use super::sync_token::SyncTokenResolver;

/// Inputs for a new phase item.
#[derive(Debug, Clone, Copy)]
pub struct ItemDraft<'a> {
    pub phase_name: &'a str,
    pub contract_address: &'a str,
    pub tasks: &'a [Task],
    pub income_account: &'a Account,
    pub expense_account: Option<&'a Account>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemService {
    sync_tokens: SyncTokenResolver,
}

impl ItemService {
    pub async fn create(
        &self,
        client: &AuthorizedClient,
        draft: ItemDraft<'_>,
    ) -> Result<Item, IntegrationError> {
        let body = item_body(&draft);
        let created: Item = client.create(EntityKind::Item, body).await?;
        tracing::info!(item_id = %created.id, phase = draft.phase_name, "Item created");
        Ok(created)
    }

    /// Re-prices an item from `tasks` with a sparse update.
    pub async fn update(
        &self,
        client: &AuthorizedClient,
        item_id: &str,
        tasks: &[Task],
    ) -> Result<Item, IntegrationError> {
        let sync_token = self
            .sync_tokens
            .get_sync_token(client, EntityKind::Item, item_id)
            .await?;

        let mut changes = Map::new();
        changes.insert("UnitPrice".to_string(), json!(item_unit_price(tasks)));
        changes.insert("Description".to_string(), json!(item_description(tasks)));

        let updated: Item = client
            .sparse_update(EntityKind::Item, item_id, &sync_token, changes)
            .await?;
        tracing::info!(item_id, sync_token = ?updated.sync_token, "Item updated");
        Ok(updated)
    }
}

fn item_body(draft: &ItemDraft<'_>) -> Value {
    let mut body = Map::new();
    body.insert(
        "Name".to_string(),
        json!(build_item_name(draft.phase_name, draft.contract_address)),
    );
    body.insert("Type".to_string(), json!("Service"));
    body.insert("UnitPrice".to_string(), json!(item_unit_price(draft.tasks)));
    body.insert("Description".to_string(), json!(item_description(draft.tasks)));
    body.insert(
        "IncomeAccountRef".to_string(),
        json!(draft.income_account.reference()),
    );
    if let Some(expense) = draft.expense_account {
        body.insert("ExpenseAccountRef".to_string(), json!(expense.reference()));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::quickbooks::MockAccountingApi;
    use std::sync::Arc;

    fn account(id: &str, name: &str, account_type: &str) -> Account {
        serde_json::from_value(json!({
            "Id": id, "Name": name, "AccountType": account_type, "Active": true
        }))
        .unwrap()
    }

    fn tasks() -> Vec<Task> {
        vec![Task::new("paint", 100.0), Task::new("trim", 50.0)]
    }

    #[test]
    fn body_prices_and_describes_tasks() {
        let income = account("79", "Services", "Income");
        let expense = account("80", "Labor", "Cost of Goods Sold");
        let tasks = tasks();

        let body = item_body(&ItemDraft {
            phase_name: "Paint Work",
            contract_address: "123 Main St, Mountain View, CA 94042",
            tasks: &tasks,
            income_account: &income,
            expense_account: Some(&expense),
        });

        assert_eq!(body["Name"], "Paint Work - 123 Main St, Mountain View, CA 94042");
        assert_eq!(body["Type"], "Service");
        assert_eq!(body["UnitPrice"], 150.0);
        assert_eq!(body["Description"], "[1]: paint;\n[2]: trim");
        assert_eq!(body["IncomeAccountRef"], json!({"value": "79", "name": "Services"}));
        assert_eq!(body["ExpenseAccountRef"]["value"], "80");
    }

    #[tokio::test]
    async fn update_uses_fresh_sync_token() {
        let api = Arc::new(MockAccountingApi::new());
        let id = api.seed(EntityKind::Item, json!({"Name": "Paint", "UnitPrice": 10.0}));
        let client = AuthorizedClient::new(api.clone(), "token", "realm");

        let first = ItemService::default()
            .update(&client, &id, &tasks())
            .await
            .unwrap();
        let second = ItemService::default()
            .update(&client, &id, &[Task::new("paint", 120.0)])
            .await
            .unwrap();

        assert_eq!(first.unit_price, Some(150.0));
        assert_eq!(second.unit_price, Some(120.0));
        assert_eq!(second.sync_token.as_deref(), Some("2"));
        assert_eq!(second.name, "Paint");
    }
}
