//! AuthorizedClient - an `AccountingApi` bound to one access token and realm.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::accounting::{EntityKind, Query};
use crate::domain::foundation::IntegrationError;
use crate::ports::{AccountingApi, AccountingApiError, ApiScope, QueryResponse};

/// Authenticated handle used by the entity services.
///
/// Obtained from `TokenManager::get_valid_client`, so the token it carries
/// was unexpired when the client was handed out.
#[derive(Clone)]
pub struct AuthorizedClient {
    api: Arc<dyn AccountingApi>,
    access_token: SecretString,
    realm_id: String,
}

impl AuthorizedClient {
    pub fn new(
        api: Arc<dyn AccountingApi>,
        access_token: impl Into<String>,
        realm_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            access_token: SecretString::new(access_token.into()),
            realm_id: realm_id.into(),
        }
    }

    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    fn scope(&self) -> ApiScope<'_> {
        ApiScope {
            access_token: self.access_token.expose_secret(),
            realm_id: &self.realm_id,
        }
    }

    pub async fn query(&self, query: &Query) -> Result<QueryResponse, IntegrationError> {
        let statement = query.render();
        tracing::debug!(statement = %statement, "SELECT STATEMENT");
        Ok(self.api.query(self.scope(), &statement).await?)
    }

    pub async fn read<T: DeserializeOwned>(
        &self,
        entity: EntityKind,
        id: &str,
    ) -> Result<T, IntegrationError> {
        let value = self.api.read(self.scope(), entity, id).await?;
        decode(entity, value)
    }

    pub async fn create<T: DeserializeOwned>(
        &self,
        entity: EntityKind,
        body: Value,
    ) -> Result<T, IntegrationError> {
        let value = self.api.write(self.scope(), entity, &body).await?;
        decode(entity, value)
    }

    /// Sends `{sparse: true, Id, SyncToken, ..changes}`.
    pub async fn sparse_update<T: DeserializeOwned>(
        &self,
        entity: EntityKind,
        id: &str,
        sync_token: &str,
        changes: Map<String, Value>,
    ) -> Result<T, IntegrationError> {
        let mut body = Map::new();
        body.insert("sparse".to_string(), Value::Bool(true));
        body.insert("Id".to_string(), Value::String(id.to_string()));
        body.insert("SyncToken".to_string(), Value::String(sync_token.to_string()));
        body.extend(changes);

        let value = self
            .api
            .write(self.scope(), entity, &Value::Object(body))
            .await?;
        decode(entity, value)
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("realm_id", &self.realm_id)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(entity: EntityKind, value: Value) -> Result<T, IntegrationError> {
    serde_json::from_value(value)
        .map_err(|e| AccountingApiError::Decode(format!("{}: {}", entity, e)).into())
}
