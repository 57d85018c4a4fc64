//! HTTP adapter for the integration: OAuth connect, workflow endpoints and
//! the provider webhook.

mod dto;
mod handlers;
mod routes;

pub use dto::ErrorResponse;
pub use handlers::{ApiError, IntegrationAppState};
pub use routes::{functional_routes, integration_router, oauth_routes};
