//! In-memory user repository for tests and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::project::User;
use crate::ports::{RepositoryError, UserRepository};

/// In-memory `UserRepository` that counts checkpoints.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a user without counting a write.
    pub async fn with_user(self, user: User) -> Self {
        self.users.write().await.insert(user.id.clone(), user);
        self
    }

    /// Number of `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &UserId, user: &User) -> Result<(), RepositoryError> {
        self.users
            .write()
            .await
            .insert(user_id.clone(), user.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn user_ids(&self) -> Result<Vec<UserId>, RepositoryError> {
        let mut ids: Vec<UserId> = self.users.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
