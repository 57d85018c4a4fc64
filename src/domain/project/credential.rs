//! OAuth credential owned by a user.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Access/refresh token pair issued by the provider.
///
/// Replaced wholesale on every refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Token lifetime that does not fit in a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("token lifetime of {0} seconds is out of range")]
pub struct LifetimeOutOfRange(pub i64);

impl Credential {
    /// Builds a credential from token lifetimes reported at `issued_at`.
    ///
    /// # Errors
    ///
    /// `LifetimeOutOfRange` when either lifetime overflows a timestamp.
    pub fn issue(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: i64,
        refresh_expires_in_secs: Option<i64>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, LifetimeOutOfRange> {
        Ok(Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: Self::expiry(issued_at, expires_in_secs)?,
            refresh_token_expires_at: refresh_expires_in_secs
                .map(|secs| Self::expiry(issued_at, secs))
                .transpose()?,
            created_at: issued_at,
        })
    }

    /// `issued_at` plus `lifetime_secs`, checked.
    pub fn expiry(
        issued_at: DateTime<Utc>,
        lifetime_secs: i64,
    ) -> Result<DateTime<Utc>, LifetimeOutOfRange> {
        Duration::try_seconds(lifetime_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or(LifetimeOutOfRange(lifetime_secs))
    }

    /// True while the access token is usable for at least `leeway` more.
    pub fn is_valid_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        now + leeway < self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}
