//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// A fixed-window budget: at most `max` requests per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRule {
    /// Requests allowed within one window.
    pub max: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl LimitRule {
    /// Longest accepted window (one year).
    pub const MAX_WINDOW_SECONDS: u64 = 365 * 24 * 60 * 60;

    /// Creates a rule.
    pub const fn new(max: u32, window_seconds: u64) -> Self {
        Self {
            max,
            window_seconds,
        }
    }
}

/// Per-category budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitProfiles {
    /// Login and other session-issuing endpoints.
    #[serde(default = "default_auth")]
    pub auth: LimitRule,
    /// Authenticated mutations.
    #[serde(default = "default_write")]
    pub write: LimitRule,
    /// API reads.
    #[serde(default = "default_read")]
    pub read: LimitRule,
    /// Everything else (marketing pages, assets).
    #[serde(default = "default_public")]
    pub public: LimitRule,
    /// Contact-form submission.
    #[serde(default = "default_contact")]
    pub contact: LimitRule,
    /// File upload.
    #[serde(default = "default_upload")]
    pub upload: LimitRule,
}

impl RateLimitProfiles {
    /// Every profile paired with its configuration key.
    pub fn iter(&self) -> [(&'static str, LimitRule); 6] {
        [
            ("auth", self.auth),
            ("write", self.write),
            ("read", self.read),
            ("public", self.public),
            ("contact", self.contact),
            ("upload", self.upload),
        ]
    }
}

impl Default for RateLimitProfiles {
    fn default() -> Self {
        Self {
            auth: default_auth(),
            write: default_write(),
            read: default_read(),
            public: default_public(),
            contact: default_contact(),
            upload: default_upload(),
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the limiter runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// How often expired windows are swept from memory.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Headers consulted, in order, for the client address.
    ///
    /// Only meaningful behind a proxy that overwrites them.
    #[serde(default = "default_proxy_headers")]
    pub trusted_proxy_headers: Vec<String>,
    /// Budgets per request category.
    #[serde(default)]
    pub profiles: RateLimitProfiles,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: default_sweep_interval(),
            trusted_proxy_headers: default_proxy_headers(),
            profiles: RateLimitProfiles::default(),
        }
    }
}

fn default_auth() -> LimitRule {
    LimitRule::new(5, 60)
}

fn default_write() -> LimitRule {
    LimitRule::new(20, 60)
}

fn default_read() -> LimitRule {
    LimitRule::new(100, 60)
}

fn default_public() -> LimitRule {
    LimitRule::new(300, 60)
}

fn default_contact() -> LimitRule {
    LimitRule::new(3, 300)
}

fn default_upload() -> LimitRule {
    LimitRule::new(10, 60)
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_proxy_headers() -> Vec<String> {
    vec!["x-forwarded-for".to_string(), "x-real-ip".to_string()]
}
