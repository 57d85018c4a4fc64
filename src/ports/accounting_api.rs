//! Accounting API port - authenticated calls against the provider REST API.
//!
//! Implementations unwrap the provider's response envelope: `read` and
//! `write` return the entity object itself, `query` returns the contents of
//! `QueryResponse`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::accounting::EntityKind;
use crate::domain::foundation::IntegrationError;

/// Bearer token and company realm a call is scoped to.
#[derive(Clone, Copy)]
pub struct ApiScope<'a> {
    pub access_token: &'a str,
    pub realm_id: &'a str,
}

/// Port for the provider's query and entity endpoints.
#[async_trait]
pub trait AccountingApi: Send + Sync {
    /// `GET /company/{realm}/query?query=<statement>`.
    async fn query(
        &self,
        scope: ApiScope<'_>,
        statement: &str,
    ) -> Result<QueryResponse, AccountingApiError>;

    /// `GET /company/{realm}/{entity}/{id}`.
    async fn read(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        id: &str,
    ) -> Result<Value, AccountingApiError>;

    /// `POST /company/{realm}/{entity}` (create, or sparse update when the
    /// body carries `sparse: true`).
    async fn write(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        body: &Value,
    ) -> Result<Value, AccountingApiError>;
}

/// Rows of a query result keyed by entity name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    body: Map<String, Value>,
}

impl QueryResponse {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body }
    }

    /// Builds a response holding `rows` for `entity`.
    pub fn with_rows(entity: EntityKind, rows: Vec<Value>) -> Self {
        let mut body = Map::new();
        body.insert(entity.as_str().to_string(), Value::Array(rows));
        Self { body }
    }

    /// Raw rows for an entity; empty when the provider omitted the key.
    pub fn rows(&self, entity: EntityKind) -> &[Value] {
        self.body
            .get(entity.as_str())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First row decoded as `T`.
    pub fn first<T: DeserializeOwned>(
        &self,
        entity: EntityKind,
    ) -> Result<Option<T>, AccountingApiError> {
        self.rows(entity)
            .first()
            .map(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| AccountingApiError::Decode(format!("{} row: {}", entity, e)))
            })
            .transpose()
    }

    /// Every row decoded as `T`.
    pub fn all<T: DeserializeOwned>(&self, entity: EntityKind) -> Result<Vec<T>, AccountingApiError> {
        self.rows(entity)
            .iter()
            .map(|row| {
                serde_json::from_value(row.clone())
                    .map_err(|e| AccountingApiError::Decode(format!("{} row: {}", entity, e)))
            })
            .collect()
    }
}

/// Failures of a provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountingApiError {
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<AccountingApiError> for IntegrationError {
    fn from(err: AccountingApiError) -> Self {
        match err {
            AccountingApiError::Status { status, body } => {
                IntegrationError::external(Some(status), body)
            }
            other => IntegrationError::external(None, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_default_to_empty() {
        let response = QueryResponse::new(Map::new());
        assert!(response.rows(EntityKind::Customer).is_empty());
        assert_eq!(
            response
                .first::<serde_json::Value>(EntityKind::Customer)
                .unwrap(),
            None
        );
    }

    #[test]
    fn first_decodes_row() {
        let response =
            QueryResponse::with_rows(EntityKind::Item, vec![json!({"SyncToken": "3"})]);
        let row: Value = response.first(EntityKind::Item).unwrap().unwrap();
        assert_eq!(row["SyncToken"], "3");
    }

    #[test]
    fn status_error_maps_to_external_api_error() {
        let err: IntegrationError = AccountingApiError::Status {
            status: 400,
            body: "Stale Object Error".to_string(),
        }
        .into();
        assert_eq!(err, IntegrationError::external(Some(400), "Stale Object Error"));
    }

    #[test]
    fn transport_error_has_no_status() {
        let err: IntegrationError = AccountingApiError::Transport("timeout".to_string()).into();
        assert!(matches!(err, IntegrationError::ExternalApi { status: None, .. }));
    }
}
