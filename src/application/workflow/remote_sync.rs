//! Refreshes stored snapshots after the provider reports a remote change.
//!
//! Every user of the notified realm that references the changed record is
//! re-fetched and saved, each under its own lock. A user whose refresh
//! fails does not stop the others.

use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::User;

use super::WorkflowOrchestrator;

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Invoice(&'a str),
    Account(&'a str),
    Customer(&'a str),
}

impl Target<'_> {
    fn is_referenced_by(&self, user: &User) -> bool {
        match *self {
            Target::Invoice(id) => user.current_project.as_ref().is_some_and(|project| {
                project
                    .estimate
                    .phases
                    .iter()
                    .any(|phase| phase.invoice.as_ref().is_some_and(|invoice| invoice.id == id))
            }),
            Target::Account(id) => [&user.accounts.income, &user.accounts.expense]
                .into_iter()
                .flatten()
                .any(|account| account.id == id),
            Target::Customer(id) => user.customer.as_ref().is_some_and(|c| c.id == id),
        }
    }
}

impl WorkflowOrchestrator {
    /// Re-fetches invoice `invoice_id` for every phase that carries it.
    ///
    /// Paid phases get the snapshot as their reconciled invoice; earlier
    /// phases get their invoice snapshot replaced. Returns the number of
    /// users whose record changed.
    pub async fn refresh_invoice(
        &self,
        realm_id: &str,
        invoice_id: &str,
    ) -> Result<usize, IntegrationError> {
        self.refresh_users(realm_id, Target::Invoice(invoice_id)).await
    }

    /// Re-fetches account `account_id` wherever it is the selected income
    /// or expense account.
    pub async fn refresh_account(
        &self,
        realm_id: &str,
        account_id: &str,
    ) -> Result<usize, IntegrationError> {
        self.refresh_users(realm_id, Target::Account(account_id)).await
    }

    /// Re-fetches customer `customer_id` for the users billed through it.
    pub async fn refresh_customer(
        &self,
        realm_id: &str,
        customer_id: &str,
    ) -> Result<usize, IntegrationError> {
        self.refresh_users(realm_id, Target::Customer(customer_id)).await
    }

    async fn refresh_users(
        &self,
        realm_id: &str,
        target: Target<'_>,
    ) -> Result<usize, IntegrationError> {
        let mut updated = 0;
        let mut first_error = None;

        for user_id in self.repository.user_ids().await? {
            match self.refresh_user(&user_id, realm_id, target).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(user_id = %user_id, ?target, error = %err, "Remote refresh failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        tracing::info!(realm_id, ?target, updated, "Remote change applied");
        match first_error {
            Some(err) => Err(err),
            None => Ok(updated),
        }
    }

    async fn refresh_user(
        &self,
        user_id: &UserId,
        realm_id: &str,
        target: Target<'_>,
    ) -> Result<bool, IntegrationError> {
        let _guard = self.locks.acquire(user_id).await;
        let Some(mut user) = self.repository.get(user_id).await? else {
            return Ok(false);
        };
        if self.realm_of(&user) != realm_id || !target.is_referenced_by(&user) {
            return Ok(false);
        }

        let client = self.authorize(&mut user).await?;
        let changed = match target {
            Target::Invoice(id) => {
                let fresh = self.services.invoices.get_by_id(&client, id).await?;
                let mut changed = false;
                if let Some(project) = user.current_project.as_mut() {
                    for phase in &mut project.estimate.phases {
                        if phase.invoice.as_ref().map(|invoice| invoice.id.as_str()) != Some(id) {
                            continue;
                        }
                        let slot = if phase.payment.is_some() {
                            &mut phase.updated_invoice
                        } else {
                            &mut phase.invoice
                        };
                        if slot.as_ref() != Some(&fresh) {
                            *slot = Some(fresh.clone());
                            changed = true;
                        }
                    }
                }
                changed
            }
            Target::Account(id) => {
                let fresh = self.services.accounts.get_by_id(&client, id).await?;
                let mut changed = false;
                for slot in [&mut user.accounts.income, &mut user.accounts.expense] {
                    if slot.as_ref().is_some_and(|account| account.id == id && *account != fresh) {
                        *slot = Some(fresh.clone());
                        changed = true;
                    }
                }
                changed
            }
            Target::Customer(id) => {
                let fresh = self.services.customers.get_by_id(&client, id).await?;
                let changed = user.customer.as_ref() != Some(&fresh);
                user.customer = Some(fresh);
                changed
            }
        };

        if changed {
            self.checkpoint(&user).await?;
        }
        Ok(changed)
    }
}
