//! Shared fixtures for orchestrator tests.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map};

use crate::adapters::quickbooks::{MockAccountingApi, MockOAuthProvider};
use crate::adapters::storage::InMemoryUserRepository;
use crate::domain::accounting::{Account, EntityKind};
use crate::domain::foundation::UserId;
use crate::domain::project::{Credential, Estimate, Owner, Phase, Project, Task, User};
use crate::ports::UserRepository;

use super::{WorkflowOrchestrator, WorkflowSettings};

pub(crate) const REALM: &str = "9130";

pub(crate) struct Harness {
    pub orchestrator: WorkflowOrchestrator,
    pub api: Arc<MockAccountingApi>,
    pub oauth: Arc<MockOAuthProvider>,
    pub repository: Arc<InMemoryUserRepository>,
    pub user_id: UserId,
}

impl Harness {
    pub async fn stored_user(&self) -> User {
        self.repository.get(&self.user_id).await.unwrap().unwrap()
    }
}

pub(crate) fn project() -> Project {
    Project {
        name: "123 Main St, Mountain View, CA 94042/Kitchen".to_string(),
        owner: Owner {
            email: "olive@example.com".to_string(),
            name: "Olive Owner".to_string(),
            phone: None,
            address: None,
            extra: Map::new(),
        },
        estimate: Estimate {
            phases: vec![
                Phase::new("paint", vec![Task::new("paint", 100.0), Task::new("trim", 50.0)]),
                Phase::new("floor", vec![Task::new("tile", 400.0)]),
            ],
            extra: Map::new(),
        },
        extra: Map::new(),
    }
}

fn seed_account(api: &MockAccountingApi, name: &str, account_type: &str, active: bool) -> Account {
    let id = api.seed(
        EntityKind::Account,
        json!({"Name": name, "AccountType": account_type, "Active": active}),
    );
    serde_json::from_value(api.get(EntityKind::Account, &id).unwrap()).unwrap()
}

/// Connected user with accounts selected and a two-phase estimate.
pub(crate) async fn harness() -> Harness {
    harness_with(|_| {}).await
}

pub(crate) async fn harness_with(customize: impl FnOnce(&mut User)) -> Harness {
    let api = Arc::new(MockAccountingApi::new());
    let oauth = Arc::new(MockOAuthProvider::new());

    let user_id = UserId::new("pro").unwrap();
    let credential = Credential::issue("access-0", "refresh-0", 3600, Some(86_400), Utc::now()).unwrap();
    let mut user = User::connected(user_id.clone(), credential, Some(REALM.to_string()));
    user.accounts.income = Some(seed_account(&api, "Services", "Income", true));
    user.accounts.expense = Some(seed_account(&api, "Labor", "Cost of Goods Sold", true));
    user.current_project = Some(project());
    customize(&mut user);

    let repository = Arc::new(InMemoryUserRepository::new().with_user(user).await);
    let orchestrator = WorkflowOrchestrator::new(
        repository.clone(),
        oauth.clone(),
        api.clone(),
        WorkflowSettings {
            default_realm_id: REALM.to_string(),
            ..WorkflowSettings::default()
        },
    );

    Harness {
        orchestrator,
        api,
        oauth,
        repository,
        user_id,
    }
}
