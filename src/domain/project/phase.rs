//! Phase - a billable unit of project work and its lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::accounting::{Invoice, Item, Payment};
use crate::domain::foundation::StateMachine;

/// A priced task inside a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub cost: f64,
}

impl Task {
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

/// Lifecycle of a phase against the accounting platform.
///
/// ```text
/// Draft → Itemized → Invoiced → Paid → Reconciled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Draft,
    Itemized,
    Invoiced,
    Paid,
    Reconciled,
}

impl StateMachine for PhaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            PhaseStatus::Draft => vec![PhaseStatus::Itemized],
            PhaseStatus::Itemized => vec![PhaseStatus::Invoiced],
            PhaseStatus::Invoiced => vec![PhaseStatus::Paid],
            PhaseStatus::Paid => vec![PhaseStatus::Reconciled],
            PhaseStatus::Reconciled => vec![],
        }
    }
}

/// A phase of the project estimate.
///
/// Remote snapshots accumulate; nothing is ever removed from a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(rename = "Item", default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    #[serde(rename = "Invoice", default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
    #[serde(rename = "Payment", default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    #[serde(rename = "UpdatedInvoice", default, skip_serializing_if = "Option::is_none")]
    pub updated_invoice: Option<Invoice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Phase {
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            tasks,
            item: None,
            invoice: None,
            payment: None,
            updated_invoice: None,
            extra: Map::new(),
        }
    }

    /// Status derived from which remote snapshots are present.
    pub fn status(&self) -> PhaseStatus {
        if self.updated_invoice.is_some() {
            PhaseStatus::Reconciled
        } else if self.payment.is_some() {
            PhaseStatus::Paid
        } else if self.invoice.is_some() {
            PhaseStatus::Invoiced
        } else if self.item.is_some() {
            PhaseStatus::Itemized
        } else {
            PhaseStatus::Draft
        }
    }

    /// Sum of task costs.
    pub fn total_cost(&self) -> f64 {
        self.tasks.iter().map(|task| task.cost).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Item {
        serde_json::from_value(json!({"Id": "1", "Name": "paint"})).unwrap()
    }

    fn invoice() -> Invoice {
        serde_json::from_value(json!({"Id": "2", "TotalAmt": 150.0})).unwrap()
    }

    fn payment() -> Payment {
        serde_json::from_value(json!({"Id": "3", "TotalAmt": 150.0})).unwrap()
    }

    #[test]
    fn status_follows_attached_snapshots() {
        let mut phase = Phase::new("paint", vec![]);
        assert_eq!(phase.status(), PhaseStatus::Draft);

        phase.item = Some(item());
        assert_eq!(phase.status(), PhaseStatus::Itemized);

        phase.invoice = Some(invoice());
        assert_eq!(phase.status(), PhaseStatus::Invoiced);

        phase.payment = Some(payment());
        assert_eq!(phase.status(), PhaseStatus::Paid);

        phase.updated_invoice = Some(invoice());
        assert_eq!(phase.status(), PhaseStatus::Reconciled);
    }

    #[test]
    fn transitions_are_monotonic_single_steps() {
        assert!(PhaseStatus::Draft.can_transition_to(&PhaseStatus::Itemized));
        assert!(PhaseStatus::Itemized.can_transition_to(&PhaseStatus::Invoiced));
        assert!(!PhaseStatus::Draft.can_transition_to(&PhaseStatus::Invoiced));
        assert!(!PhaseStatus::Paid.can_transition_to(&PhaseStatus::Invoiced));
        assert!(PhaseStatus::Reconciled.is_terminal());
    }

    #[test]
    fn total_cost_sums_tasks() {
        let phase = Phase::new("paint", vec![Task::new("paint", 100.0), Task::new("trim", 50.0)]);
        assert_eq!(phase.total_cost(), 150.0);
    }

    #[test]
    fn serializes_remote_snapshots_under_pascal_case_keys() {
        let mut phase = Phase::new("paint", vec![Task::new("paint", 100.0)]);
        phase.item = Some(item());

        let value = serde_json::to_value(&phase).unwrap();
        assert_eq!(value["Item"]["Id"], "1");
        assert!(value.get("Invoice").is_none());
    }
}
