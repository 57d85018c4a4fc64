//! Workflow tuning

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound on concurrent item creations per estimate approval.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Access tokens expiring within this many seconds are refreshed early.
    #[serde(default = "default_token_refresh_leeway")]
    pub token_refresh_leeway_secs: i64,
}

impl WorkflowConfig {
    pub fn token_refresh_leeway(&self) -> Duration {
        Duration::seconds(self.token_refresh_leeway_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=32).contains(&self.max_concurrent_requests) {
            return Err(ValidationError::InvalidConcurrency);
        }
        if !(0..=3600).contains(&self.token_refresh_leeway_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            token_refresh_leeway_secs: default_token_refresh_leeway(),
        }
    }
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_token_refresh_leeway() -> i64 {
    60
}
