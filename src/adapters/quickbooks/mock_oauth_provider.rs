//! Mock OAuth provider for testing.
//!
//! Issues numbered credentials (`access-1`, `refresh-1`, ...) and records
//! every exchange and refresh.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::project::Credential;
use crate::ports::{OAuthError, OAuthProvider};

struct MockState {
    issued: u32,
    lifetime_secs: i64,
    exchanged_codes: Vec<String>,
    refreshed_tokens: Vec<String>,
    next_error: Option<OAuthError>,
}

pub struct MockOAuthProvider {
    inner: Mutex<MockState>,
}

impl Default for MockOAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOAuthProvider {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockState {
                issued: 0,
                lifetime_secs: 3600,
                exchanged_codes: Vec::new(),
                refreshed_tokens: Vec::new(),
                next_error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails the next exchange or refresh.
    pub fn fail_next(&self, error: OAuthError) {
        self.state().next_error = Some(error);
    }

    pub fn refresh_count(&self) -> usize {
        self.state().refreshed_tokens.len()
    }

    pub fn refreshed_tokens(&self) -> Vec<String> {
        self.state().refreshed_tokens.clone()
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.state().exchanged_codes.clone()
    }

    fn issue(state: &mut MockState) -> Result<Credential, OAuthError> {
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.issued += 1;
        Credential::issue(
            format!("access-{}", state.issued),
            format!("refresh-{}", state.issued),
            state.lifetime_secs,
            Some(8_726_400),
            Utc::now(),
        )
        .map_err(|e| OAuthError::Decode(e.to_string()))
    }
}

#[async_trait]
impl OAuthProvider for MockOAuthProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://appcenter.test/connect/oauth2?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential, OAuthError> {
        let mut state = self.state();
        state.exchanged_codes.push(code.to_string());
        Self::issue(&mut state)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credential, OAuthError> {
        let mut state = self.state();
        state.refreshed_tokens.push(refresh_token.to_string());
        Self::issue(&mut state)
    }
}
