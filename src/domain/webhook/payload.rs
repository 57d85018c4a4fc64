//! Change-notification payload pushed by the provider.
//!
//! ```json
//! {
//!   "eventNotifications": [{
//!     "realmId": "1185883450",
//!     "dataChangeEvent": {
//!       "entities": [
//!         {"name": "Customer", "id": "1", "operation": "Create", "lastUpdated": "2015-10-05T14:42:19-0700"}
//!       ]
//!     }
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub event_notifications: Vec<EventNotification>,
}

impl WebhookPayload {
    /// Every entity change in the payload, paired with its realm.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &EntityChange)> {
        self.event_notifications.iter().flat_map(|notification| {
            notification
                .data_change_event
                .entities
                .iter()
                .map(move |entity| (notification.realm_id.as_str(), entity))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    pub realm_id: String,
    #[serde(default)]
    pub data_change_event: DataChangeEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataChangeEvent {
    #[serde(default)]
    pub entities: Vec<EntityChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChange {
    /// Entity type, e.g. `"Invoice"`.
    pub name: String,
    pub id: String,
    pub operation: ChangeOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
    Merge,
    Void,
    Emailed,
    #[serde(other)]
    Other,
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
