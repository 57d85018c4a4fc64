//! InvoiceService - single-line invoices for phase items.

use serde_json::{json, Map, Value};

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{Customer, EntityKind, Invoice, Item};
use crate::domain::foundation::IntegrationError;

use super::sync_token::SyncTokenResolver;

/// Id the provider assigns to the first line of a new invoice.
const PHASE_LINE_ID: &str = "1";

/// Inputs for a phase invoice.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceDraft<'a> {
    pub customer: &'a Customer,
    pub item: &'a Item,
    pub amount: f64,
    pub bill_email: Option<&'a str>,
    /// Marks the invoice to be emailed and printed.
    pub need_pay: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceService {
    sync_tokens: SyncTokenResolver,
}

impl InvoiceService {
    pub async fn create(
        &self,
        client: &AuthorizedClient,
        draft: InvoiceDraft<'_>,
    ) -> Result<Invoice, IntegrationError> {
        let created: Invoice = client
            .create(EntityKind::Invoice, invoice_body(&draft))
            .await?;
        tracing::info!(invoice_id = %created.id, amount = draft.amount, "Invoice created");
        Ok(created)
    }

    pub async fn get_by_id(
        &self,
        client: &AuthorizedClient,
        invoice_id: &str,
    ) -> Result<Invoice, IntegrationError> {
        client.read(EntityKind::Invoice, invoice_id).await
    }

    /// Replaces the amount of line `"1"` and sparse-updates the invoice.
    pub async fn update_amount(
        &self,
        client: &AuthorizedClient,
        invoice_id: &str,
        amount: f64,
    ) -> Result<Invoice, IntegrationError> {
        let current = self.get_by_id(client, invoice_id).await?;
        let sync_token = self
            .sync_tokens
            .get_sync_token(client, EntityKind::Invoice, invoice_id)
            .await?;

        let lines = reprice_phase_line(current.line, amount)
            .ok_or_else(|| IntegrationError::not_found("InvoiceLine", PHASE_LINE_ID))?;

        let mut changes = Map::new();
        changes.insert("Line".to_string(), Value::Array(lines));

        let updated: Invoice = client
            .sparse_update(EntityKind::Invoice, invoice_id, &sync_token, changes)
            .await?;
        tracing::info!(invoice_id, amount, "Invoice updated");
        Ok(updated)
    }
}

fn invoice_body(draft: &InvoiceDraft<'_>) -> Value {
    let (email_status, print_status) = if draft.need_pay {
        ("NeedToSend", "NeedToPrint")
    } else {
        ("NotSet", "NotSet")
    };

    let mut body = Map::new();
    body.insert("CustomerRef".to_string(), json!(draft.customer.reference()));
    body.insert(
        "Line".to_string(),
        json!([{
            "Amount": draft.amount,
            "DetailType": "SalesItemLineDetail",
            "SalesItemLineDetail": {
                "ItemRef": draft.item.reference(),
                "Qty": 1,
                "UnitPrice": draft.amount
            }
        }]),
    );
    if let Some(email) = draft.bill_email {
        body.insert("BillEmail".to_string(), json!({ "Address": email }));
    }
    body.insert("EmailStatus".to_string(), json!(email_status));
    body.insert("PrintStatus".to_string(), json!(print_status));
    Value::Object(body)
}

/// `None` when no line carries the phase line id.
fn reprice_phase_line(mut lines: Vec<Value>, amount: f64) -> Option<Vec<Value>> {
    let line = lines
        .iter_mut()
        .find(|line| line.get("Id").and_then(Value::as_str) == Some(PHASE_LINE_ID))?;

    line["Amount"] = json!(amount);
    if let Some(detail) = line.get_mut("SalesItemLineDetail").filter(|d| d.is_object()) {
        detail["Qty"] = json!(1);
        detail["UnitPrice"] = json!(amount);
    }
    Some(lines)
}
