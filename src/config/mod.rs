//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `LEDGERLINK` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use ledgerlink::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod quickbooks;
mod server;
mod storage;
mod workflow;

pub use error::{ConfigError, ValidationError};
pub use quickbooks::{QuickBooksConfig, QuickBooksEnvironment};
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;
pub use workflow::WorkflowConfig;

use serde::Deserialize;

use crate::application::WorkflowSettings;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// QuickBooks Online app, API and webhook settings
    pub quickbooks: QuickBooksConfig,

    /// Persisted user document
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LEDGERLINK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `LEDGERLINK__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LEDGERLINK__QUICKBOOKS__CLIENT_ID=...` -> `quickbooks.client_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LEDGERLINK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.quickbooks.validate(&self.server.environment)?;
        self.storage.validate()?;
        self.workflow.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Orchestrator settings derived from the workflow and QuickBooks sections.
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            default_realm_id: self.quickbooks.realm_id.clone(),
            max_concurrent_requests: self.workflow.max_concurrent_requests,
            token_refresh_leeway: self.workflow.token_refresh_leeway(),
        }
    }
}
