//! Session cookie configuration.

use serde::{Deserialize, Serialize};

/// Names and attributes of the three session cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Server-only cookie holding the authoritative session token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Script-readable cookie holding the short-lived access token.
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
    /// Server-only cookie holding the refresh token.
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie: String,
    /// Whether cookies carry the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure: bool,
    /// `SameSite` policy: `"strict"`, `"lax"`, or `"none"`.
    #[serde(default = "default_same_site")]
    pub same_site: String,
    /// Cookie path.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            access_cookie: default_access_cookie(),
            refresh_cookie: default_refresh_cookie(),
            secure: true,
            same_site: default_same_site(),
            path: default_path(),
        }
    }
}

fn default_session_cookie() -> String {
    "portal_session".to_string()
}

fn default_access_cookie() -> String {
    "portal_access".to_string()
}

fn default_refresh_cookie() -> String {
    "portal_refresh".to_string()
}

fn default_true() -> bool {
    true
}

fn default_same_site() -> String {
    "lax".to_string()
}

fn default_path() -> String {
    "/".to_string()
}
