//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `AccountingApi` - provider query and entity endpoints
//! - `OAuthProvider` - authorization, code exchange and token refresh
//! - `UserRepository` - whole-record persistence of users
//! - `EntityChangeHandler` - reactions to webhook notifications

mod accounting_api;
mod entity_change_handler;
mod oauth_provider;
mod user_repository;

pub use accounting_api::{AccountingApi, AccountingApiError, ApiScope, QueryResponse};
pub use entity_change_handler::EntityChangeHandler;
pub use oauth_provider::{OAuthError, OAuthProvider};
pub use user_repository::{RepositoryError, UserRepository};
