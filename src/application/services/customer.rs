//! CustomerService - customer lookup by email and creation from a project owner.

use serde_json::{json, Map, Value};

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{parse_city_state_zip, Customer, EntityKind, Query};
use crate::domain::foundation::IntegrationError;
use crate::domain::project::Owner;

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerService;

impl CustomerService {
    pub async fn get_by_id(
        &self,
        client: &AuthorizedClient,
        customer_id: &str,
    ) -> Result<Customer, IntegrationError> {
        client.read(EntityKind::Customer, customer_id).await
    }

    /// First customer whose primary email equals `email`.
    pub async fn find_by_email(
        &self,
        client: &AuthorizedClient,
        email: &str,
    ) -> Result<Option<Customer>, IntegrationError> {
        let query = Query::select(EntityKind::Customer).eq("PrimaryEmailAddr", email);
        Ok(client.query(&query).await?.first(EntityKind::Customer)?)
    }

    /// Creates a customer from the owner's profile.
    ///
    /// The billing address is parsed from the owner's address, falling back
    /// to the contract address, as `"city, state, zip"`.
    pub async fn create(
        &self,
        client: &AuthorizedClient,
        owner: &Owner,
        contract_address: &str,
    ) -> Result<Customer, IntegrationError> {
        let created: Customer = client
            .create(EntityKind::Customer, customer_body(owner, contract_address))
            .await?;
        tracing::info!(customer_id = %created.id, email = %owner.email, "Customer created");
        Ok(created)
    }
}

fn customer_body(owner: &Owner, contract_address: &str) -> Value {
    let mut body = Map::new();
    body.insert("DisplayName".to_string(), json!(owner.name));
    body.insert("PrimaryEmailAddr".to_string(), json!({ "Address": owner.email }));
    if let Some(phone) = &owner.phone {
        body.insert("PrimaryPhone".to_string(), json!({ "FreeFormNumber": phone }));
    }

    let address = parse_city_state_zip(owner.address.as_deref().unwrap_or(contract_address));
    let mut bill_addr = Map::new();
    if let Some(city) = address.city {
        bill_addr.insert("City".to_string(), json!(city));
    }
    if let Some(state) = address.state {
        bill_addr.insert("CountrySubDivisionCode".to_string(), json!(state));
    }
    if let Some(postal_code) = address.postal_code {
        bill_addr.insert("PostalCode".to_string(), json!(postal_code));
    }
    if !bill_addr.is_empty() {
        body.insert("BillAddr".to_string(), Value::Object(bill_addr));
    }

    Value::Object(body)
}
