//! Domain layer - pure types and rules of the integration.

pub mod accounting;
pub mod foundation;
pub mod project;
pub mod webhook;
