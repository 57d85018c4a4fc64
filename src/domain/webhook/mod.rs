//! Webhook module - change notifications and their signature check.

mod payload;
mod signature;

pub use payload::{ChangeOperation, DataChangeEvent, EntityChange, EventNotification, WebhookPayload};
pub use signature::{compute_signature, verify, WebhookVerifier, SIGNATURE_HEADER};

#[cfg(test)]
pub use signature::sign_for_test;
