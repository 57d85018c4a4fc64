//! Error types shared by every layer of the integration.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | Signature | 401 |
//! | ExternalApi | 500 |
//! | Auth | 500 |
//! | Storage | 500 |
//! | BatchIncomplete | 500 |

use std::fmt;
use thiserror::Error;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    NotFound,
    ExternalApiError,
    AuthFailed,
    InvalidSignature,
    StorageError,
    BatchIncomplete,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ExternalApiError => "EXTERNAL_API_ERROR",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::BatchIncomplete => "BATCH_INCOMPLETE",
        };
        write!(f, "{}", s)
    }
}

/// A phase whose remote mutation failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    pub phase: String,
    pub reason: String,
}

/// Errors raised by the integration core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrationError {
    /// Missing or invalid request fields, duplicate phase names, rejected accounts.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Unknown phase, account, customer or user reference.
    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    /// A provider call failed.
    #[error("Accounting API error (status {status:?}): {body}")]
    ExternalApi { status: Option<u16>, body: String },

    /// Token exchange or refresh failed.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Webhook signature missing or mismatched.
    #[error("Webhook signature rejected: {0}")]
    Signature(String),

    /// The storage collaborator failed to read or write the document.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Some members of a fan-out batch failed after the batch settled.
    #[error("{} of {attempted} phases failed", failures.len())]
    BatchIncomplete {
        attempted: usize,
        failures: Vec<PhaseFailure>,
    },
}

impl IntegrationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        IntegrationError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        IntegrationError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn external(status: Option<u16>, body: impl Into<String>) -> Self {
        IntegrationError::ExternalApi {
            status,
            body: body.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        IntegrationError::Auth(message.into())
    }

    pub fn signature(message: impl Into<String>) -> Self {
        IntegrationError::Signature(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        IntegrationError::Storage(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            IntegrationError::Validation { .. } => ErrorCode::ValidationFailed,
            IntegrationError::NotFound { .. } => ErrorCode::NotFound,
            IntegrationError::ExternalApi { .. } => ErrorCode::ExternalApiError,
            IntegrationError::Auth(_) => ErrorCode::AuthFailed,
            IntegrationError::Signature(_) => ErrorCode::InvalidSignature,
            IntegrationError::Storage(_) => ErrorCode::StorageError,
            IntegrationError::BatchIncomplete { .. } => ErrorCode::BatchIncomplete,
        }
    }
}
