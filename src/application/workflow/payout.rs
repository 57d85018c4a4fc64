//! request_payout / approve_payout - invoicing, payment and reconciliation.

use chrono::{Duration, Utc};

use crate::application::services::InvoiceDraft;
use crate::domain::foundation::{IntegrationError, StateMachine, UserId};
use crate::domain::project::{Phase, PhaseStatus};

use super::{current_project, phase_mut, WorkflowOrchestrator};

impl WorkflowOrchestrator {
    /// Invoices an itemized phase for the sum of its task costs.
    pub async fn request_payout(
        &self,
        user_id: &UserId,
        phase_name: &str,
    ) -> Result<Phase, IntegrationError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;

        let project = current_project(&user)?;
        let phase = project
            .phase(phase_name)
            .ok_or_else(|| IntegrationError::not_found("Phase", phase_name))?;
        phase.status().transition_to(PhaseStatus::Invoiced)?;
        let item = phase
            .item
            .clone()
            .ok_or_else(|| IntegrationError::validation("Item", "phase has no item"))?;
        let amount = phase.total_cost();
        let bill_email = project.owner.email.clone();
        let customer = user.customer.clone().ok_or_else(|| {
            IntegrationError::validation("Customer", "approve the estimate before requesting payout")
        })?;

        let client = self.authorize(&mut user).await?;
        let invoice = self
            .services
            .invoices
            .create(
                &client,
                InvoiceDraft {
                    customer: &customer,
                    item: &item,
                    amount,
                    bill_email: Some(&bill_email),
                    need_pay: true,
                },
            )
            .await?;

        let phase = phase_mut(&mut user, phase_name)?;
        phase.invoice = Some(invoice);
        let phase = phase.clone();
        self.checkpoint(&user).await?;

        tracing::info!(user_id = %user_id, phase = phase_name, "Phase invoiced");
        Ok(phase)
    }

    /// Records a payment for the phase invoice, dated tomorrow, then
    /// re-fetches the invoice to capture the provider-computed balance.
    ///
    /// A phase left in `Paid` by an interrupted call skips straight to the
    /// re-fetch.
    pub async fn approve_payout(
        &self,
        user_id: &UserId,
        phase_name: &str,
    ) -> Result<Phase, IntegrationError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut user = self.load_user(user_id).await?;

        let phase = current_project(&user)?
            .phase(phase_name)
            .ok_or_else(|| IntegrationError::not_found("Phase", phase_name))?;
        let status = phase.status();
        if status != PhaseStatus::Paid {
            status.transition_to(PhaseStatus::Paid)?;
        }
        let invoice = phase
            .invoice
            .clone()
            .ok_or_else(|| IntegrationError::validation("Invoice", "phase has no invoice"))?;

        let client = self.authorize(&mut user).await?;

        if status == PhaseStatus::Invoiced {
            let txn_date = (Utc::now() + Duration::days(1)).date_naive();
            let payment = self
                .services
                .payments
                .create_fake_invoice_payment(&client, &invoice, invoice.total_amt, Some(txn_date))
                .await?;

            phase_mut(&mut user, phase_name)?.payment = Some(payment);
            self.checkpoint(&user).await?;
            tracing::info!(user_id = %user_id, phase = phase_name, "Phase paid");
        }

        let updated_invoice = self
            .services
            .invoices
            .get_by_id(&client, &invoice.id)
            .await?;
        let phase = phase_mut(&mut user, phase_name)?;
        phase.updated_invoice = Some(updated_invoice);
        let phase = phase.clone();
        self.checkpoint(&user).await?;

        tracing::info!(
            user_id = %user_id,
            phase = phase_name,
            settled = phase.updated_invoice.as_ref().is_some_and(|i| i.is_settled()),
            "Phase reconciled"
        );
        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::harness;
    use crate::domain::accounting::EntityKind;
    use crate::domain::foundation::IntegrationError;
    use crate::domain::project::PhaseStatus;
    use crate::ports::{AccountingApiError, UserRepository};

    #[tokio::test]
    async fn request_payout_invoices_task_total() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();

        let phase = h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap();

        assert_eq!(phase.status(), PhaseStatus::Invoiced);
        let invoice = phase.invoice.as_ref().unwrap();
        assert_eq!(invoice.total_amt, 150.0);
        assert_eq!(invoice.extra["EmailStatus"], "NeedToSend");
        assert_eq!(invoice.extra["BillEmail"]["Address"], "olive@example.com");

        let stored = h.stored_user().await;
        assert_eq!(
            stored.current_project.unwrap().phase("paint").unwrap().invoice,
            phase.invoice
        );
    }

    #[tokio::test]
    async fn request_payout_requires_item() {
        let h = harness().await;

        let err = h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap_err();

        assert!(matches!(err, IntegrationError::Validation { .. }));
        assert_eq!(h.api.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_phase_is_not_found() {
        let h = harness().await;

        let err = h.orchestrator.request_payout(&h.user_id, "roof").await.unwrap_err();

        assert_eq!(err, IntegrationError::not_found("Phase", "roof"));
    }

    #[tokio::test]
    async fn approve_payout_pays_and_reconciles() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();
        h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap();

        let phase = h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap();

        assert_eq!(phase.status(), PhaseStatus::Reconciled);
        let payment = phase.payment.as_ref().unwrap();
        assert_eq!(payment.total_amt, 150.0);
        let tomorrow = (chrono::Utc::now() + chrono::Duration::days(1))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(payment.txn_date.as_deref(), Some(tomorrow.as_str()));
        assert!(phase.updated_invoice.as_ref().unwrap().is_settled());
    }

    #[tokio::test]
    async fn interrupted_reconciliation_resumes_without_second_payment() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();
        h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap();
        h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap();

        // Crash after the payment checkpoint, before the re-fetch was saved.
        let mut user = h.stored_user().await;
        let phase = user
            .current_project
            .as_mut()
            .unwrap()
            .phase_mut("paint")
            .unwrap();
        let invoice_id = phase.invoice.as_ref().unwrap().id.clone();
        phase.updated_invoice = None;
        h.repository.put(&user.id, &user).await.unwrap();
        assert_eq!(
            h.stored_user().await.current_project.unwrap().phase("paint").unwrap().status(),
            PhaseStatus::Paid
        );

        let phase = h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap();

        assert_eq!(phase.status(), PhaseStatus::Reconciled);
        assert_eq!(h.api.count(EntityKind::Payment), 1);
        assert_eq!(phase.updated_invoice.unwrap().id, invoice_id);
    }

    #[tokio::test]
    async fn reconciled_phase_cannot_be_paid_again() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();
        h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap();
        h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap();

        let err = h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap_err();

        assert!(matches!(err, IntegrationError::Validation { .. }));
        assert_eq!(h.api.count(EntityKind::Payment), 1);
    }

    #[tokio::test]
    async fn approve_payout_requires_invoice() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();

        let err = h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap_err();

        assert!(matches!(err, IntegrationError::Validation { .. }));
        assert_eq!(h.api.count(EntityKind::Payment), 0);
    }

    #[tokio::test]
    async fn failed_payment_leaves_phase_invoiced() {
        let h = harness().await;
        h.orchestrator.approve_estimate(&h.user_id).await.unwrap();
        h.orchestrator.request_payout(&h.user_id, "paint").await.unwrap();
        h.api.fail_next(AccountingApiError::Status {
            status: 500,
            body: "boom".to_string(),
        });

        let err = h.orchestrator.approve_payout(&h.user_id, "paint").await.unwrap_err();

        assert!(matches!(err, IntegrationError::ExternalApi { status: Some(500), .. }));
        let stored = h.stored_user().await;
        assert_eq!(
            stored.current_project.unwrap().phase("paint").unwrap().status(),
            PhaseStatus::Invoiced
        );
    }
}
