//! PaymentService - manual payments applied to invoices.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{EntityKind, Invoice, Payment};
use crate::domain::foundation::IntegrationError;

#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentService;

impl PaymentService {
    /// Records a payment of `amount` linked to `invoice`.
    pub async fn create_fake_invoice_payment(
        &self,
        client: &AuthorizedClient,
        invoice: &Invoice,
        amount: f64,
        txn_date: Option<NaiveDate>,
    ) -> Result<Payment, IntegrationError> {
        let created: Payment = client
            .create(EntityKind::Payment, payment_body(invoice, amount, txn_date))
            .await?;
        tracing::info!(payment_id = %created.id, invoice_id = %invoice.id, amount, "Payment recorded");
        Ok(created)
    }
}

fn payment_body(invoice: &Invoice, amount: f64, txn_date: Option<NaiveDate>) -> Value {
    let mut body = Map::new();
    if let Some(customer_ref) = &invoice.customer_ref {
        body.insert("CustomerRef".to_string(), json!(customer_ref));
    }
    body.insert("TotalAmt".to_string(), json!(amount));
    if let Some(date) = txn_date {
        body.insert(
            "TxnDate".to_string(),
            json!(date.format("%Y-%m-%d").to_string()),
        );
    }
    body.insert(
        "Line".to_string(),
        json!([{
            "Amount": amount,
            "LinkedTxn": [{ "TxnId": invoice.id, "TxnType": "Invoice" }]
        }]),
    );
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_links_invoice_and_formats_date() {
        let invoice: Invoice = serde_json::from_value(json!({
            "Id": "130", "TotalAmt": 150.0, "CustomerRef": {"value": "58"}
        }))
        .unwrap();

        let body = payment_body(&invoice, 150.0, NaiveDate::from_ymd_opt(2024, 3, 2));

        assert_eq!(body["TotalAmt"], 150.0);
        assert_eq!(body["TxnDate"], "2024-03-02");
        assert_eq!(body["CustomerRef"]["value"], "58");
        assert_eq!(
            body["Line"][0]["LinkedTxn"][0],
            json!({"TxnId": "130", "TxnType": "Invoice"})
        );
    }

    #[test]
    fn date_is_optional() {
        let invoice: Invoice = serde_json::from_value(json!({"Id": "130"})).unwrap();
        let body = payment_body(&invoice, 10.0, None);
        assert!(body.get("TxnDate").is_none());
        assert!(body.get("CustomerRef").is_none());
    }
}
