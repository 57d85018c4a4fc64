//! User repository port - the storage collaborator.
//!
//! Every `put` persists the whole user record; there are no partial writes.
//! Core logic depends only on this interface.

use async_trait::async_trait;

use crate::domain::foundation::{IntegrationError, UserId};
use crate::domain::project::User;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Failed to serialize document: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize document: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<RepositoryError> for IntegrationError {
    fn from(err: RepositoryError) -> Self {
        IntegrationError::storage(err.to_string())
    }
}

/// Port for loading and checkpointing user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Loads a user record, `None` if it was never stored.
    async fn get(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Replaces the stored record for `user_id` and flushes it.
    async fn put(&self, user_id: &UserId, user: &User) -> Result<(), RepositoryError>;

    /// Ids of every stored user.
    async fn user_ids(&self) -> Result<Vec<UserId>, RepositoryError>;
}
