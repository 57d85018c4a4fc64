//! Project module - users, projects and the phase lifecycle.

mod credential;
mod phase;
mod user;

pub use credential::{Credential, LifetimeOutOfRange};
pub use phase::{Phase, PhaseStatus, Task};
pub use user::{AccountRole, Accounts, Estimate, Owner, Project, User};
