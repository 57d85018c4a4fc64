//! QuickBooks Online adapters.
//!
//! Implements the `AccountingApi` and `OAuthProvider` ports:
//! - REST query and entity endpoints (bearer auth, pinned minor version)
//! - Intuit OAuth 2.0 authorize URL, code exchange and refresh
//!
//! # Security
//!
//! - The client secret is held in `secrecy::SecretString`
//! - Tokens never appear in logs or `Debug` output

mod api_client;
mod mock_accounting_api;
mod mock_oauth_provider;
mod oauth_client;

pub use api_client::{
    QuickBooksApiClient, QuickBooksApiConfig, DEFAULT_MINOR_VERSION, PRODUCTION_BASE_URL,
    SANDBOX_BASE_URL,
};
pub use mock_accounting_api::{ApiCall, ApiMethod, MockAccountingApi};
pub use mock_oauth_provider::MockOAuthProvider;
pub use oauth_client::{IntuitOAuthClient, IntuitOAuthConfig};
