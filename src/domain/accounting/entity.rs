//! Remote accounting entities as returned by the QuickBooks Online API.
//!
//! Only the fields the workflow reads are typed; everything else the
//! provider returns is kept in `extra` so persisted snapshots stay complete.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Entity types the integration reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Account,
    Customer,
    Item,
    Invoice,
    Payment,
}

impl EntityKind {
    /// Name used in query statements and as the JSON envelope key.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::Customer => "Customer",
            EntityKind::Item => "Item",
            EntityKind::Invoice => "Invoice",
            EntityKind::Payment => "Payment",
        }
    }

    /// Parses the name used in query statements and webhook notifications.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Account" => Some(EntityKind::Account),
            "Customer" => Some(EntityKind::Customer),
            "Item" => Some(EntityKind::Item),
            "Invoice" => Some(EntityKind::Invoice),
            "Payment" => Some(EntityKind::Payment),
            _ => None,
        }
    }

    /// Path segment of the entity endpoint (`/company/{realm}/{segment}`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Customer => "customer",
            EntityKind::Item => "item",
            EntityKind::Invoice => "invoice",
            EntityKind::Payment => "payment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ "value": id, "name": name }` reference to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    pub fn new(value: impl Into<String>, name: Option<String>) -> Self {
        Self {
            value: value.into(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailAddress {
    pub address: String,
}

/// Chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn reference(&self) -> Reference {
        Reference::new(self.id.clone(), Some(self.name.clone()))
    }
}

/// Projection returned by account name searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sub_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    pub fn reference(&self) -> Reference {
        Reference::new(self.id.clone(), Some(self.display_name.clone()))
    }
}

/// Service catalog entry generated per phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn reference(&self) -> Reference {
        Reference::new(self.id.clone(), Some(self.name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub total_amt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default)]
    pub line: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    /// True once the provider reports nothing left to collect.
    pub fn is_settled(&self) -> bool {
        matches!(self.balance, Some(balance) if balance <= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub total_amt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
