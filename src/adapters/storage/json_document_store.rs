//! Whole-document JSON store.
//!
//! The full `{ "users": { "<id>": { ... } } }` document is read once at
//! startup and kept in memory. Every `put` replaces one user record in the
//! working copy and rewrites the whole file; a failed write puts the
//! previous record back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::project::{Credential, LifetimeOutOfRange, User};
use crate::ports::{RepositoryError, UserRepository};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    users: BTreeMap<String, Value>,
}

/// File-backed `UserRepository`.
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonDocumentStore {
    /// Loads the document at `path`; a missing file starts an empty one.
    ///
    /// # Example
    /// ```ignore
    /// let store = JsonDocumentStore::open("./data/local_db.json").await?;
    /// ```
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();

        let document = match fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Document::default(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| RepositoryError::DeserializationFailed(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(RepositoryError::IoError(e.to_string())),
        };

        tracing::info!(path = %path.display(), users = document.users.len(), "Loaded user document");

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, document: &Document) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| RepositoryError::SerializationFailed(e.to_string()))?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Decodes a stored record, filling in the id from its document key and
/// upgrading token grants written before `expires_at` was recorded.
fn decode_user(key: &str, raw: &Value) -> Result<User, RepositoryError> {
    let mut record = match raw {
        Value::Object(map) => map.clone(),
        _ => {
            return Err(RepositoryError::DeserializationFailed(format!(
                "user {} is not an object",
                key
            )))
        }
    };
    record
        .entry("id".to_string())
        .or_insert_with(|| Value::String(key.to_string()));

    if let Some(Value::Object(tokens)) = record.get_mut("tokens") {
        upgrade_legacy_tokens(tokens).map_err(|e| {
            RepositoryError::DeserializationFailed(format!("user {}: {}", key, e))
        })?;
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| RepositoryError::DeserializationFailed(format!("user {}: {}", key, e)))
}

/// Raw grants carry `expires_in` seconds and, once refreshed, a millisecond
/// `createdAt`. A grant stored straight from the callback has no issue time
/// and is treated as already expired, so its first use refreshes it.
fn upgrade_legacy_tokens(tokens: &mut Map<String, Value>) -> Result<(), LifetimeOutOfRange> {
    if tokens.contains_key("expires_at") {
        return Ok(());
    }

    let created_at = tokens
        .get("createdAt")
        .and_then(Value::as_i64)
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    let Some(created_at) = created_at else {
        let expired = Value::String(DateTime::<Utc>::UNIX_EPOCH.to_rfc3339());
        tokens.insert("expires_at".to_string(), expired.clone());
        tokens.insert("createdAt".to_string(), expired);
        return Ok(());
    };

    let lifetime = tokens.get("expires_in").and_then(Value::as_i64).unwrap_or(0);
    tokens.insert(
        "expires_at".to_string(),
        Value::String(Credential::expiry(created_at, lifetime)?.to_rfc3339()),
    );
    if let Some(refresh_lifetime) = tokens
        .get("x_refresh_token_expires_in")
        .and_then(Value::as_i64)
    {
        tokens.insert(
            "refresh_token_expires_at".to_string(),
            Value::String(Credential::expiry(created_at, refresh_lifetime)?.to_rfc3339()),
        );
    }
    tokens.insert(
        "createdAt".to_string(),
        Value::String(created_at.to_rfc3339()),
    );
    Ok(())
}

#[async_trait]
impl UserRepository for JsonDocumentStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        let document = self.document.lock().await;
        document
            .users
            .get(user_id.as_str())
            .map(|raw| decode_user(user_id.as_str(), raw))
            .transpose()
    }

    async fn put(&self, user_id: &UserId, user: &User) -> Result<(), RepositoryError> {
        let record = serde_json::to_value(user)
            .map_err(|e| RepositoryError::SerializationFailed(e.to_string()))?;

        let mut document = self.document.lock().await;
        let previous = document.users.insert(user_id.to_string(), record);
        if let Err(err) = self.flush(&document).await {
            match previous {
                Some(previous) => {
                    document.users.insert(user_id.to_string(), previous);
                }
                None => {
                    document.users.remove(user_id.as_str());
                }
            }
            tracing::error!(user_id = %user_id, error = %err, "User document write failed");
            return Err(err);
        }

        tracing::debug!(user_id = %user_id, path = %self.path.display(), "User document saved");
        Ok(())
    }

    async fn user_ids(&self) -> Result<Vec<UserId>, RepositoryError> {
        let document = self.document.lock().await;
        document
            .users
            .keys()
            .map(|key| {
                UserId::new(key.clone())
                    .map_err(|e| RepositoryError::DeserializationFailed(e.to_string()))
            })
            .collect()
    }
}
