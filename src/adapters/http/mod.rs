//! HTTP adapters - REST API implementations.

pub mod integration;

pub use integration::{integration_router, IntegrationAppState};
