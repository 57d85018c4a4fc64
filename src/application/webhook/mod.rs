//! Webhook intake: signature check, payload parsing and dispatch.

mod dispatcher;
mod handlers;

pub use dispatcher::{DispatchFailure, DispatchReport, Dispatcher};
pub use handlers::{AccountUpdatedHandler, CustomerUpdatedHandler, InvoiceUpdatedHandler};

use crate::domain::foundation::IntegrationError;
use crate::domain::webhook::{WebhookPayload, WebhookVerifier};

/// Verifies, parses and dispatches change notifications.
#[derive(Debug, Clone)]
pub struct WebhookService {
    verifier: WebhookVerifier,
    dispatcher: Dispatcher,
}

impl WebhookService {
    pub fn new(verifier: WebhookVerifier, dispatcher: Dispatcher) -> Self {
        Self {
            verifier,
            dispatcher,
        }
    }

    /// Handles one webhook delivery.
    ///
    /// Only a bad signature is an error. Once the signature checks out the
    /// delivery is acknowledged: an unparseable body is logged and dropped,
    /// and handler failures are reported in the returned `DispatchReport`.
    pub async fn receive(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<DispatchReport, IntegrationError> {
        self.verifier.verify(body, signature)?;

        let payload: WebhookPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, body_len = body.len(), "Unparseable webhook payload");
                return Ok(DispatchReport::default());
            }
        };

        let report = self.dispatcher.dispatch(&payload).await;
        tracing::info!(
            handled = report.handled,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Webhook dispatched"
        );
        Ok(report)
    }
}
