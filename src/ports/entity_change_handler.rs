//! Entity change handler port - reactions to webhook notifications.

use async_trait::async_trait;

use crate::domain::foundation::IntegrationError;
use crate::domain::webhook::EntityChange;

/// Handler registered for one `(entity, operation)` pair.
#[async_trait]
pub trait EntityChangeHandler: Send + Sync {
    async fn handle(&self, realm_id: &str, change: &EntityChange) -> Result<(), IntegrationError>;
}
