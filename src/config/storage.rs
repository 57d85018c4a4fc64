//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of the persisted user document.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.document_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DOCUMENT_PATH"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
        }
    }
}

fn default_document_path() -> PathBuf {
    PathBuf::from("data/local_db.json")
}
