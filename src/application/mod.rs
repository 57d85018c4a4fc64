//! Application layer - token handling, entity services, the workflow
//! orchestrator and webhook intake.
//!
//! This layer coordinates domain rules with the ports; it never talks to
//! HTTP or the filesystem directly.

pub mod client;
pub mod services;
pub mod token_manager;
pub mod webhook;
pub mod workflow;

pub use client::AuthorizedClient;
pub use services::AccountingServices;
pub use token_manager::{TokenManager, ValidClient};
pub use webhook::{DispatchReport, Dispatcher, WebhookService};
pub use workflow::{UpdatePhaseResult, WorkflowOrchestrator, WorkflowSettings};
