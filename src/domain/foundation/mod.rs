//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the error taxonomy and the state machine trait
//! that form the vocabulary of the integration.

mod errors;
mod ids;
mod state_machine;

pub use errors::{ErrorCode, IntegrationError, PhaseFailure};
pub use ids::UserId;
pub use state_machine::StateMachine;
