//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Redirect URI must be an absolute http(s) URL")]
    InvalidRedirectUri,

    #[error("Redirect URI must use HTTPS in production")]
    RedirectUriMustBeHttps,

    #[error("Invalid API base URL")]
    InvalidApiBaseUrl,

    #[error("Concurrency limit must be between 1 and 32")]
    InvalidConcurrency,
}
