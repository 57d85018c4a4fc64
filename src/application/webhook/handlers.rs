//! Entity change handlers backed by the orchestrator's remote refresh.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::workflow::WorkflowOrchestrator;
use crate::domain::accounting::EntityKind;
use crate::domain::foundation::IntegrationError;
use crate::domain::webhook::{ChangeOperation, EntityChange};
use crate::ports::EntityChangeHandler;

use super::Dispatcher;

/// Invoice/Update: refreshes the phase snapshots of the invoice.
pub struct InvoiceUpdatedHandler {
    orchestrator: Arc<WorkflowOrchestrator>,
}

impl InvoiceUpdatedHandler {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl EntityChangeHandler for InvoiceUpdatedHandler {
    async fn handle(&self, realm_id: &str, change: &EntityChange) -> Result<(), IntegrationError> {
        let updated = self.orchestrator.refresh_invoice(realm_id, &change.id).await?;
        tracing::debug!(realm_id, invoice_id = %change.id, updated, "Invoice refreshed");
        Ok(())
    }
}

/// Account/Update: refreshes the selected income or expense account.
pub struct AccountUpdatedHandler {
    orchestrator: Arc<WorkflowOrchestrator>,
}

impl AccountUpdatedHandler {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl EntityChangeHandler for AccountUpdatedHandler {
    async fn handle(&self, realm_id: &str, change: &EntityChange) -> Result<(), IntegrationError> {
        let updated = self.orchestrator.refresh_account(realm_id, &change.id).await?;
        tracing::debug!(realm_id, account_id = %change.id, updated, "Account refreshed");
        Ok(())
    }
}

/// Customer/Update: refreshes the stored customer.
pub struct CustomerUpdatedHandler {
    orchestrator: Arc<WorkflowOrchestrator>,
}

impl CustomerUpdatedHandler {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl EntityChangeHandler for CustomerUpdatedHandler {
    async fn handle(&self, realm_id: &str, change: &EntityChange) -> Result<(), IntegrationError> {
        let updated = self.orchestrator.refresh_customer(realm_id, &change.id).await?;
        tracing::debug!(realm_id, customer_id = %change.id, updated, "Customer refreshed");
        Ok(())
    }
}

impl Dispatcher {
    /// Dispatcher with the Invoice, Account and Customer update handlers.
    pub fn for_orchestrator(orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        Dispatcher::new()
            .register(
                EntityKind::Invoice.as_str(),
                ChangeOperation::Update,
                Arc::new(InvoiceUpdatedHandler::new(orchestrator.clone())),
            )
            .register(
                EntityKind::Account.as_str(),
                ChangeOperation::Update,
                Arc::new(AccountUpdatedHandler::new(orchestrator.clone())),
            )
            .register(
                EntityKind::Customer.as_str(),
                ChangeOperation::Update,
                Arc::new(CustomerUpdatedHandler::new(orchestrator)),
            )
    }
}
