//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use portal_auth::{PasswordHasher, RbacEnforcer, SessionManager, TokenCodec};
use portal_core::config::AppConfig;
use portal_database::DirectoryRepository;

use crate::cookies::SessionCookies;
use crate::middleware::edge::EdgePolicy;
use crate::middleware::rate_limit::RateLimiter;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Directory ────────────────────────────────────────────
    /// Users, roles, and module grants
    pub directory: Arc<dyn DirectoryRepository>,

    // ── Auth ─────────────────────────────────────────────────
    /// Session token signer and verifier
    pub codec: Arc<TokenCodec>,
    /// Login, refresh, and logout flows
    pub session_manager: Arc<SessionManager>,
    /// Role and permission gates
    pub rbac: Arc<RbacEnforcer>,
    /// Cookie policy for the three session cookies
    pub cookies: Arc<SessionCookies>,

    // ── Edge ─────────────────────────────────────────────────
    /// Fixed-window request counters
    pub rate_limiter: Arc<RateLimiter>,
    /// Ordered per-request rule chain
    pub edge_policy: Arc<EdgePolicy>,
}

impl AppState {
    /// Wires every component from configuration and a directory backend.
    pub fn new(config: AppConfig, directory: Arc<dyn DirectoryRepository>) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let rbac = Arc::new(RbacEnforcer::new(&config.auth));
        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&directory),
            Arc::clone(&codec),
            PasswordHasher::new(),
            &config.auth,
        ));
        let rate_limiter = Arc::new(RateLimiter::new());
        let edge_policy = Arc::new(EdgePolicy::new(
            config.edge.clone(),
            config.rate_limit.clone(),
            Arc::clone(&rate_limiter),
            RbacEnforcer::clone(&rbac),
        ));
        let cookies = Arc::new(SessionCookies::new(config.session.clone()));

        Self {
            config: Arc::new(config),
            directory,
            codec,
            session_manager,
            rbac,
            cookies,
            rate_limiter,
            edge_policy,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session_manager", &self.session_manager)
            .field("rbac", &self.rbac)
            .field("rate_limit_windows", &self.rate_limiter.len())
            .finish_non_exhaustive()
    }
}
