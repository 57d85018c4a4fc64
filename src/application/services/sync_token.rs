//! SyncTokenResolver - current concurrency version of a remote entity.

use serde_json::Value;

use crate::application::client::AuthorizedClient;
use crate::domain::accounting::{EntityKind, Query};
use crate::domain::foundation::IntegrationError;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncTokenResolver;

impl SyncTokenResolver {
    /// Runs `select SyncToken from <entity> where Id = '<id>'`.
    ///
    /// The token is not cached: a write using it fails with
    /// `ExternalApi` if the entity changes in between.
    pub async fn get_sync_token(
        &self,
        client: &AuthorizedClient,
        entity: EntityKind,
        id: &str,
    ) -> Result<String, IntegrationError> {
        let query = Query::select(entity).fields(["SyncToken"]).eq("Id", id);
        let response = client.query(&query).await?;

        response
            .rows(entity)
            .first()
            .and_then(|row| row.get("SyncToken"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IntegrationError::not_found(entity.as_str(), id))
    }
}
