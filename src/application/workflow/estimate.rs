//! approve_estimate - customer resolution and per-phase item creation.

use futures::stream::{self, StreamExt};

use crate::application::services::ItemDraft;
use crate::domain::accounting::Item;
use crate::domain::foundation::{IntegrationError, PhaseFailure, UserId};
use crate::domain::project::User;

use super::{current_project, current_project_mut, WorkflowOrchestrator};

impl WorkflowOrchestrator {
    /// Resolves (or creates) the owner's customer, then creates an item for
    /// every phase that does not have one yet.
    ///
    /// Item creations run concurrently, at most `max_concurrent_requests`
    /// at a time. Once the batch settles, the items that were created are
    /// persisted together.
    ///
    /// # Errors
    ///
    /// `IntegrationError::BatchIncomplete` names the phases whose item
    /// could not be created; the others are already saved, so calling this
    /// again only retries the failed phases.
    pub async fn approve_estimate(&self, user_id: &UserId) -> Result<User, IntegrationError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;

        let project = current_project(&user)?.clone();
        let income_account = user.accounts.income.clone().ok_or_else(|| {
            IntegrationError::validation(
                "Accounts.Income",
                "select an income account before approving the estimate",
            )
        })?;
        let expense_account = user.accounts.expense.clone();

        let client = self.authorize(&mut user).await?;
        let owner_email = project.owner.email.as_str();
        let contract_address = project.contract_address();

        let customer = match self
            .services
            .customers
            .find_by_email(&client, owner_email)
            .await?
        {
            Some(customer) => {
                tracing::debug!(email = owner_email, customer_id = %customer.id, "Customer exists");
                customer
            }
            None => {
                tracing::debug!(email = owner_email, "Customer not found, creating");
                self.services
                    .customers
                    .create(&client, &project.owner, contract_address)
                    .await?
            }
        };
        user.customer = Some(customer);
        self.checkpoint(&user).await?;

        let pending: Vec<_> = project
            .estimate
            .phases
            .iter()
            .filter(|phase| phase.item.is_none())
            .collect();
        let attempted = pending.len();
        tracing::info!(user_id = %user_id, phases = attempted, "START CREATE ITEMS");

        let items = &self.services.items;
        let client = &client;
        let income_account = &income_account;
        let expense_account = expense_account.as_ref();
        let creations: Vec<_> = pending
            .into_iter()
            .map(|phase| async move {
                let draft = ItemDraft {
                    phase_name: &phase.name,
                    contract_address,
                    tasks: &phase.tasks,
                    income_account,
                    expense_account,
                };
                (phase.name.clone(), items.create(client, draft).await)
            })
            .collect();
        let outcomes: Vec<(String, Result<Item, IntegrationError>)> = stream::iter(creations)
            .buffered(self.settings.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut failures = Vec::new();
        let phases = &mut current_project_mut(&mut user)?.estimate.phases;
        for (name, outcome) in outcomes {
            match outcome {
                Ok(item) => {
                    if let Some(phase) = phases.iter_mut().find(|phase| phase.name == name) {
                        phase.item = Some(item);
                    }
                }
                Err(err) => {
                    tracing::warn!(phase = %name, error = %err, "Item creation failed");
                    failures.push(PhaseFailure {
                        phase: name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        self.checkpoint(&user).await?;
        tracing::info!(user_id = %user_id, failed = failures.len(), "END CREATE ITEMS");

        if !failures.is_empty() {
            return Err(IntegrationError::BatchIncomplete {
                attempted,
                failures,
            });
        }
        Ok(user)
    }
}
