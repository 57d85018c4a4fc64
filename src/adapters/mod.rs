//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the integration to external systems:
//! - `quickbooks` - QuickBooks Online REST API and Intuit OAuth (plus mocks)
//! - `storage` - user document persistence (JSON file, in-memory)
//! - `http` - axum routes for OAuth connect, the workflow and webhooks

pub mod http;
pub mod quickbooks;
pub mod storage;
