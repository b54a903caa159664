//! Claims structure shared by session, access, and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionPayload;

/// Distinguishes tokens that authorize requests from tokens that renew them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Session and access tokens.
    Access,
    /// Long-lived refresh token.
    Refresh,
}

/// Token payload: the session plus issued-at, expiry, and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The embedded session.
    #[serde(flatten)]
    pub session: SessionPayload,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token type.
    pub token_type: TokenType,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Returns the remaining lifetime in seconds (0 if expired).
    pub fn remaining_ttl_seconds(&self) -> u64 {
        u64::try_from(self.exp - Utc::now().timestamp()).unwrap_or(0)
    }
}
