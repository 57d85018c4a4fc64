//! create_phase / update_phase.

use crate::domain::foundation::{IntegrationError, StateMachine, UserId};
use crate::domain::project::{Phase, PhaseStatus, Task};

use crate::application::services::ItemDraft;

use super::{current_project, current_project_mut, phase_mut, WorkflowOrchestrator};

/// Outcome of `update_phase`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePhaseResult {
    /// Task list identical to the stored one; nothing was sent or saved.
    Unchanged(Phase),
    Updated(Phase),
}

impl UpdatePhaseResult {
    pub fn phase(&self) -> &Phase {
        match self {
            UpdatePhaseResult::Unchanged(phase) | UpdatePhaseResult::Updated(phase) => phase,
        }
    }
}

impl WorkflowOrchestrator {
    /// Adds a phase to the current estimate and creates its item.
    pub async fn create_phase(
        &self,
        user_id: &UserId,
        name: &str,
        tasks: Vec<Task>,
    ) -> Result<Phase, IntegrationError> {
        if name.trim().is_empty() {
            return Err(IntegrationError::validation("name", "phase name is required"));
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;

        let project = current_project(&user)?;
        if project.phase(name).is_some() {
            return Err(IntegrationError::validation(
                "name",
                format!("phase '{}' already exists", name),
            ));
        }
        let contract_address = project.contract_address().to_string();
        let income_account = user.accounts.income.clone().ok_or_else(|| {
            IntegrationError::validation("Accounts.Income", "select an income account first")
        })?;
        let expense_account = user.accounts.expense.clone();

        let mut phase = Phase::new(name, tasks);
        phase.status().transition_to(PhaseStatus::Itemized)?;

        let client = self.authorize(&mut user).await?;
        let item = self
            .services
            .items
            .create(
                &client,
                ItemDraft {
                    phase_name: name,
                    contract_address: &contract_address,
                    tasks: &phase.tasks,
                    income_account: &income_account,
                    expense_account: expense_account.as_ref(),
                },
            )
            .await?;
        phase.item = Some(item);

        current_project_mut(&mut user)?
            .estimate
            .phases
            .push(phase.clone());
        self.checkpoint(&user).await?;

        tracing::info!(user_id = %user_id, phase = name, "Phase created");
        Ok(phase)
    }

    /// Replaces a phase's tasks, re-pricing its item and, when invoiced,
    /// its invoice.
    pub async fn update_phase(
        &self,
        user_id: &UserId,
        name: &str,
        tasks: Vec<Task>,
    ) -> Result<UpdatePhaseResult, IntegrationError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;

        let existing = current_project(&user)?
            .phase(name)
            .ok_or_else(|| IntegrationError::not_found("Phase", name))?;
        if existing.tasks == tasks {
            tracing::debug!(user_id = %user_id, phase = name, "Phase unchanged");
            return Ok(UpdatePhaseResult::Unchanged(existing.clone()));
        }
        let item_id = existing.item.as_ref().map(|item| item.id.clone());
        let invoice_id = existing.invoice.as_ref().map(|invoice| invoice.id.clone());

        let Some(item_id) = item_id else {
            let phase = phase_mut(&mut user, name)?;
            phase.tasks = tasks;
            let phase = phase.clone();
            self.checkpoint(&user).await?;
            return Ok(UpdatePhaseResult::Updated(phase));
        };

        let client = self.authorize(&mut user).await?;
        let item = self.services.items.update(&client, &item_id, &tasks).await?;

        let phase = phase_mut(&mut user, name)?;
        phase.tasks = tasks;
        phase.item = Some(item);
        let amount = phase.total_cost();
        self.checkpoint(&user).await?;

        if let Some(invoice_id) = invoice_id {
            let invoice = self
                .services
                .invoices
                .update_amount(&client, &invoice_id, amount)
                .await?;
            phase_mut(&mut user, name)?.invoice = Some(invoice);
            self.checkpoint(&user).await?;
        }

        tracing::info!(user_id = %user_id, phase = name, amount, "Phase updated");
        let phase = current_project(&user)?
            .phase(name)
            .cloned()
            .ok_or_else(|| IntegrationError::not_found("Phase", name))?;
        Ok(UpdatePhaseResult::Updated(phase))
    }
}
