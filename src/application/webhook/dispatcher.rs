//! Routes webhook entity changes to the handler registered for their
//! `(entity, operation)` pair.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::webhook::{ChangeOperation, EntityChange, WebhookPayload};
use crate::ports::EntityChangeHandler;

/// A change whose handler returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub realm_id: String,
    pub entity: String,
    pub id: String,
    pub operation: ChangeOperation,
    pub reason: String,
}

/// Outcome of one dispatch once every handler has settled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub handled: usize,
    /// Changes with no registered handler.
    pub skipped: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<(String, ChangeOperation), Arc<dyn EntityChangeHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `entity` changes with `operation`, replacing
    /// any earlier registration for the pair.
    pub fn register(
        mut self,
        entity: impl Into<String>,
        operation: ChangeOperation,
        handler: Arc<dyn EntityChangeHandler>,
    ) -> Self {
        self.handlers.insert((entity.into(), operation), handler);
        self
    }

    pub fn handles(&self, entity: &str, operation: ChangeOperation) -> bool {
        self.handlers
            .contains_key(&(entity.to_string(), operation))
    }

    /// Runs the handler of every change in the payload concurrently and
    /// waits for all of them, whatever their outcome.
    pub async fn dispatch(&self, payload: &WebhookPayload) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut pending: Vec<(&str, &EntityChange, Arc<dyn EntityChangeHandler>)> = Vec::new();

        for (realm_id, change) in payload.changes() {
            match self
                .handlers
                .get(&(change.name.clone(), change.operation))
            {
                Some(handler) => pending.push((realm_id, change, Arc::clone(handler))),
                None => {
                    tracing::debug!(
                        realm_id,
                        entity = %change.name,
                        id = %change.id,
                        operation = %change.operation,
                        "No handler registered"
                    );
                    report.skipped += 1;
                }
            }
        }

        let outcomes = join_all(pending.into_iter().map(|(realm_id, change, handler)| async move {
            let outcome = handler.handle(realm_id, change).await;
            (realm_id, change, outcome)
        }))
        .await;

        for (realm_id, change, outcome) in outcomes {
            match outcome {
                Ok(()) => report.handled += 1,
                Err(err) => {
                    tracing::error!(
                        realm_id,
                        entity = %change.name,
                        id = %change.id,
                        operation = %change.operation,
                        error = %err,
                        "Webhook handler failed"
                    );
                    report.failures.push(DispatchFailure {
                        realm_id: realm_id.to_string(),
                        entity: change.name.clone(),
                        id: change.id.clone(),
                        operation: change.operation,
                        reason: err.to_string(),
                    });
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<String> = self
            .handlers
            .keys()
            .map(|(entity, operation)| format!("{}/{}", entity, operation))
            .collect();
        routes.sort();
        f.debug_struct("Dispatcher").field("routes", &routes).finish()
    }
}
