//! User record and the project it is currently working on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::accounting::{Account, Customer};
use crate::domain::foundation::UserId;

use super::credential::Credential;
use super::phase::Phase;

/// Accounts the user has accepted for item creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounts {
    #[serde(rename = "Income", default, skip_serializing_if = "Option::is_none")]
    pub income: Option<Account>,
    #[serde(rename = "Expense", default, skip_serializing_if = "Option::is_none")]
    pub expense: Option<Account>,
}

/// Role an account plays on generated items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Income,
    Expense,
}

impl AccountRole {
    /// AccountType the provider must report for this role.
    pub fn required_account_type(&self) -> &'static str {
        match self {
            AccountRole::Income => "Income",
            AccountRole::Expense => "Cost of Goods Sold",
        }
    }
}

/// Homeowner the project is billed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Free-form `"city, state, zip"` billing address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// `"<contract address>/<label>"`.
    pub name: String,
    #[serde(rename = "Owner")]
    pub owner: Owner,
    #[serde(rename = "Estimate", default)]
    pub estimate: Estimate,
    /// Fields owned by the project system, kept as written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Contract address, the part of the name before the first `/`.
    pub fn contract_address(&self) -> &str {
        self.name.split('/').next().unwrap_or_default()
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.estimate.phases.iter().find(|phase| phase.name == name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.estimate.phases.iter_mut().find(|phase| phase.name == name)
    }
}

/// Everything persisted for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "tokens", default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    #[serde(rename = "realmId", default, skip_serializing_if = "Option::is_none")]
    pub realm_id: Option<String>,
    #[serde(rename = "Accounts", default)]
    pub accounts: Accounts,
    #[serde(rename = "Customer", default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(rename = "CurrentProject", default, skip_serializing_if = "Option::is_none")]
    pub current_project: Option<Project>,
}

impl User {
    /// A freshly connected user with nothing but a credential.
    pub fn connected(id: UserId, credential: Credential, realm_id: Option<String>) -> Self {
        Self {
            id,
            credential: Some(credential),
            realm_id,
            accounts: Accounts::default(),
            customer: None,
            current_project: None,
        }
    }
}
