//! Fixed-window rate limiter keyed by client and path.
//!
//! Each key gets a counter and a reset instant. The first request of a
//! window starts the window; requests past the limit are rejected until the
//! window expires. A background sweeper drops expired windows so the map
//! only holds active clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use portal_core::config::{LimitRule, RateLimitProfiles};

use crate::error::ApiErrorResponse;

/// Identifier used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Which limit applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitProfile {
    /// Login and other auth endpoints.
    Auth,
    /// Mutating API requests.
    Write,
    /// API reads.
    Read,
    /// Pages and everything else.
    Public,
    /// Contact form submissions.
    Contact,
    /// File uploads.
    Upload,
}

impl RateLimitProfile {
    /// Profile name used in logs and keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Write => "write",
            Self::Read => "read",
            Self::Public => "public",
            Self::Contact => "contact",
            Self::Upload => "upload",
        }
    }

    /// The configured limit for this profile.
    pub fn rule(&self, profiles: &RateLimitProfiles) -> LimitRule {
        match self {
            Self::Auth => profiles.auth,
            Self::Write => profiles.write,
            Self::Read => profiles.read,
            Self::Public => profiles.public,
            Self::Contact => profiles.contact,
            Self::Upload => profiles.upload,
        }
    }

    /// Rejection message for this profile.
    pub fn message(&self, retry_after_seconds: u64) -> String {
        let what = match self {
            Self::Auth => "Too many login attempts",
            Self::Contact => "Too many contact submissions",
            Self::Upload => "Too many uploads",
            Self::Write | Self::Read | Self::Public => "Too many requests",
        };
        format!("{what}. Please try again in {retry_after_seconds} seconds.")
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Outcome of an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Configured maximum for the window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub reset_after: Duration,
}

/// A request that exceeded its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitExceeded {
    /// Configured maximum for the window.
    pub limit: u32,
    /// Time until the window resets.
    pub reset_after: Duration,
    /// Client-facing message.
    pub message: String,
}

impl RateLimitExceeded {
    /// Whole seconds until the client may retry, rounded up.
    pub fn retry_after_seconds(&self) -> u64 {
        ceil_seconds(self.reset_after)
    }
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_seconds();
        let reset_epoch = chrono::Utc::now().timestamp().max(0) as u64 + retry_after;

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiErrorResponse::new(self.message)),
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(self.limit),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(0u32),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderValue::from(reset_epoch),
        );
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(retry_after),
        );
        response
    }
}

/// In-memory fixed-window counters shared by every request.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, WindowEntry>,
}

impl RateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a request against `key` and decides whether it is admitted.
    pub fn check_rate_limit(
        &self,
        key: &str,
        rule: LimitRule,
        profile: RateLimitProfile,
    ) -> Result<RateLimitStatus, RateLimitExceeded> {
        self.check_at(key, rule, profile, Instant::now())
    }

    fn check_at(
        &self,
        key: &str,
        rule: LimitRule,
        profile: RateLimitProfile,
        now: Instant,
    ) -> Result<RateLimitStatus, RateLimitExceeded> {
        let reset_at = window_end(now, rule.window_seconds);

        let mut entry = self.windows.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            reset_at,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = reset_at;
        }
        entry.count = entry.count.saturating_add(1);

        let reset_after = entry.reset_at.saturating_duration_since(now);
        let count = entry.count;
        drop(entry);

        if count > rule.max {
            debug!(key, profile = profile.name(), count, "Rate limit exceeded");
            return Err(RateLimitExceeded {
                limit: rule.max,
                reset_after,
                message: profile.message(ceil_seconds(reset_after)),
            });
        }

        Ok(RateLimitStatus {
            limit: rule.max,
            remaining: rule.max - count,
            reset_after,
        })
    }

    /// Removes every window that has expired. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, entry| now <= entry.reset_at);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no windows are tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Spawns the periodic sweeper. It stops when `shutdown` flips to `true`
    /// or its sender is dropped.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            debug!(removed, active = self.len(), "Swept expired rate limit windows");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Rate limit sweeper stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}

/// End of a window opened at `now`, clamped to [`LimitRule::MAX_WINDOW_SECONDS`].
fn window_end(now: Instant, window_seconds: u64) -> Instant {
    let window = Duration::from_secs(window_seconds.min(LimitRule::MAX_WINDOW_SECONDS));
    now.checked_add(window).unwrap_or(now)
}

fn ceil_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Identifies the client from the first trusted proxy header that carries a
/// value, then the peer address, then [`UNKNOWN_CLIENT`].
pub fn client_identifier(
    headers: &HeaderMap,
    trusted_headers: &[String],
    peer: Option<&ConnectInfo<SocketAddr>>,
) -> String {
    trusted_headers
        .iter()
        .filter_map(|name| headers.get(name.as_str()))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH: LimitRule = LimitRule::new(5, 60);

    #[tokio::test(start_paused = true)]
    async fn test_sixth_attempt_is_rejected() {
        let limiter = RateLimiter::new();
        for attempt in 1..=5 {
            let status = limiter
                .check_rate_limit("1.2.3.4:/api/auth/login", AUTH, RateLimitProfile::Auth)
                .expect("admitted");
            assert_eq!(status.remaining, 5 - attempt);
        }

        let rejected = limiter
            .check_rate_limit("1.2.3.4:/api/auth/login", AUTH, RateLimitProfile::Auth)
            .expect_err("sixth attempt rejected");
        assert_eq!(rejected.limit, 5);
        assert_eq!(rejected.retry_after_seconds(), 60);
        assert!(rejected.message.starts_with("Too many login attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new();
        for _ in 0..6 {
            let _ = limiter.check_rate_limit("k", AUTH, RateLimitProfile::Auth);
        }

        tokio::time::advance(Duration::from_secs(61)).await;

        let status = limiter
            .check_rate_limit("k", AUTH, RateLimitProfile::Auth)
            .expect("new window");
        assert_eq!(status.remaining, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        let rule = LimitRule::new(1, 60);
        assert!(limiter.check_rate_limit("a:/x", rule, RateLimitProfile::Write).is_ok());
        assert!(limiter.check_rate_limit("a:/x", rule, RateLimitProfile::Write).is_err());
        assert!(limiter.check_rate_limit("b:/x", rule, RateLimitProfile::Write).is_ok());
        assert!(limiter.check_rate_limit("a:/y", rule, RateLimitProfile::Write).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_admit_exactly_max() {
        let limiter = Arc::new(RateLimiter::new());
        let rule = LimitRule::new(25, 60);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    let mut admitted = 0u32;
                    for _ in 0..20 {
                        if limiter
                            .check_rate_limit("shared", rule, RateLimitProfile::Write)
                            .is_ok()
                        {
                            admitted += 1;
                        }
                        tokio::task::yield_now().await;
                    }
                    admitted
                })
            })
            .collect();

        let mut admitted = 0;
        for task in tasks {
            admitted += task.await.expect("task joined");
        }
        assert_eq!(admitted, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_is_clamped() {
        let limiter = RateLimiter::new();
        let rule = LimitRule::new(1, u64::MAX);

        let status = limiter
            .check_rate_limit("k", rule, RateLimitProfile::Read)
            .expect("first request admitted");
        assert_eq!(
            status.reset_after,
            Duration::from_secs(LimitRule::MAX_WINDOW_SECONDS)
        );

        let rejected = limiter
            .check_rate_limit("k", rule, RateLimitProfile::Read)
            .expect_err("second request rejected");
        assert_eq!(rejected.retry_after_seconds(), LimitRule::MAX_WINDOW_SECONDS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_only_expired_windows() {
        let limiter = RateLimiter::new();
        let _ = limiter.check_rate_limit("old", LimitRule::new(5, 10), RateLimitProfile::Read);
        let _ = limiter.check_rate_limit("new", LimitRule::new(5, 300), RateLimitProfile::Read);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval_and_stops() {
        let limiter = Arc::new(RateLimiter::new());
        let _ = limiter.check_rate_limit("k", LimitRule::new(5, 1), RateLimitProfile::Read);

        let (tx, rx) = watch::channel(false);
        let handle = Arc::clone(&limiter).spawn_sweeper(Duration::from_secs(60), rx);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(limiter.is_empty());

        tx.send(true).expect("sweeper alive");
        handle.await.expect("sweeper joined");
    }

    #[test]
    fn test_client_identifier_prefers_trusted_headers() {
        let trusted = vec!["x-forwarded-for".to_string(), "x-real-ip".to_string()];

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_identifier(&headers, &trusted, None), "10.0.0.1");

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_identifier(&headers, &trusted, None), "10.0.0.2");

        assert_eq!(client_identifier(&HeaderMap::new(), &trusted, None), UNKNOWN_CLIENT);
    }

    #[tokio::test]
    async fn test_rejection_response_headers() {
        let response = RateLimitExceeded {
            limit: 5,
            reset_after: Duration::from_millis(42_500),
            message: RateLimitProfile::Auth.message(43),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "43");
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }
}
