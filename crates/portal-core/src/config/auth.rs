//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token signing, lifetimes, and role tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of the client-readable access token, in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Lifetime of the server-only session token, in minutes.
    ///
    /// This bounds how long a revoked role or grant keeps working.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
    /// Lifetime of the refresh token, in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// Clock-skew leeway applied when checking expiry, in seconds.
    #[serde(default)]
    pub leeway_seconds: u64,
    /// Role codes treated as administrators.
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
    /// Role codes allowed to perform non-destructive writes.
    #[serde(default = "default_editor_roles")]
    pub editor_roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_minutes: default_access_ttl(),
            session_ttl_minutes: default_session_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            leeway_seconds: 0,
            admin_roles: default_admin_roles(),
            editor_roles: default_editor_roles(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_session_ttl() -> u64 {
    60
}

fn default_refresh_ttl() -> u64 {
    168
}

fn default_admin_roles() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_editor_roles() -> Vec<String> {
    vec!["editor".to_string()]
}
