//! The edge dispatcher: an ordered rule chain evaluated for every request
//! before routing reaches a handler.
//!
//! Rules run in order and the first one that does not return
//! [`EdgeDecision::Continue`] decides the request. The default chain is:
//!
//! 1. rate limiting (applies to every request, authenticated or not)
//! 2. public paths (login page, auth endpoints)
//! 3. public API reads
//! 4. declared public mutations (contact form, chat)
//! 5. the protected surface (admin UI and API mutations)
//! 6. allow everything else

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use portal_auth::{RbacEnforcer, SessionPayload};
use portal_core::config::{EdgeConfig, RateLimitConfig};
use portal_core::error::AppError;

use super::auth::current_session;
use super::rate_limit::{RateLimitExceeded, RateLimitProfile, RateLimiter, client_identifier};
use crate::error::ApiError;
use crate::state::AppState;

/// Whether `path` equals `prefix` or lies beneath it on a segment boundary.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether the method changes state.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// What the rule chain sees of a request.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRequest<'a> {
    /// Request method.
    pub method: &'a Method,
    /// Request path, without the query string.
    pub path: &'a str,
    /// Client identifier used for rate limiting.
    pub client: &'a str,
    /// The verified session, when the request carried a valid token.
    pub session: Option<&'a SessionPayload>,
}

/// Why a request was stopped at the edge.
#[derive(Debug, Clone)]
pub enum EdgeRejection {
    /// The client exceeded a rate limit.
    RateLimited(RateLimitExceeded),
    /// Missing or insufficient authority.
    Denied(AppError),
}

impl IntoResponse for EdgeRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RateLimited(exceeded) => exceeded.into_response(),
            Self::Denied(err) => ApiError(err).into_response(),
        }
    }
}

/// The verdict of one rule.
#[derive(Debug, Clone)]
pub enum EdgeDecision {
    /// No opinion; evaluate the next rule.
    Continue,
    /// Let the request through.
    Allow,
    /// Send the client elsewhere.
    Redirect(String),
    /// Stop the request.
    Reject(EdgeRejection),
}

/// One step of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRule {
    /// Counts the request against its profile's window.
    RateLimit,
    /// Lets public paths through; redirects signed-in users away from login.
    PublicPaths,
    /// Lets non-mutating API calls through.
    PublicReads,
    /// Lets declared public mutations through.
    PublicMutations,
    /// Requires a session and a role tier on the admin UI and API mutations.
    ProtectedSurface,
    /// Lets the request through.
    AllowAll,
}

impl EdgeRule {
    /// The default rule order.
    pub const DEFAULT_CHAIN: [EdgeRule; 6] = [
        EdgeRule::RateLimit,
        EdgeRule::PublicPaths,
        EdgeRule::PublicReads,
        EdgeRule::PublicMutations,
        EdgeRule::ProtectedSurface,
        EdgeRule::AllowAll,
    ];
}

/// The ordered rule chain and everything its rules consult.
#[derive(Debug)]
pub struct EdgePolicy {
    rules: Vec<EdgeRule>,
    config: EdgeConfig,
    rate_limit: RateLimitConfig,
    limiter: Arc<RateLimiter>,
    rbac: RbacEnforcer,
}

impl EdgePolicy {
    /// Creates the policy with the default chain.
    pub fn new(
        config: EdgeConfig,
        rate_limit: RateLimitConfig,
        limiter: Arc<RateLimiter>,
        rbac: RbacEnforcer,
    ) -> Self {
        Self {
            rules: EdgeRule::DEFAULT_CHAIN.to_vec(),
            config,
            rate_limit,
            limiter,
            rbac,
        }
    }

    /// Replaces the rule chain.
    pub fn with_rules(mut self, rules: Vec<EdgeRule>) -> Self {
        self.rules = rules;
        self
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[EdgeRule] {
        &self.rules
    }

    /// Runs the chain. A chain that never decides allows the request.
    pub fn evaluate(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        for rule in &self.rules {
            let decision = self.apply(*rule, request);
            if !matches!(decision, EdgeDecision::Continue) {
                debug!(rule = ?rule, path = request.path, decision = ?decision, "Edge decision");
                return decision;
            }
        }
        EdgeDecision::Allow
    }

    /// Classifies a request into its rate limit profile.
    pub fn classify(&self, method: &Method, path: &str) -> RateLimitProfile {
        let config = &self.config;
        if path_has_prefix(path, &config.login_path)
            || config.auth_paths.iter().any(|p| path_has_prefix(path, p))
        {
            RateLimitProfile::Auth
        } else if *method == Method::POST
            && config.contact_paths.iter().any(|p| path_has_prefix(path, p))
        {
            RateLimitProfile::Contact
        } else if config.upload_paths.iter().any(|p| path_has_prefix(path, p)) {
            RateLimitProfile::Upload
        } else if is_mutating(method) {
            RateLimitProfile::Write
        } else if path_has_prefix(path, &config.api_prefix) {
            RateLimitProfile::Read
        } else {
            RateLimitProfile::Public
        }
    }

    fn apply(&self, rule: EdgeRule, request: &EdgeRequest<'_>) -> EdgeDecision {
        match rule {
            EdgeRule::RateLimit => self.rate_limit(request),
            EdgeRule::PublicPaths => self.public_paths(request),
            EdgeRule::PublicReads => self.public_reads(request),
            EdgeRule::PublicMutations => self.public_mutations(request),
            EdgeRule::ProtectedSurface => self.protected_surface(request),
            EdgeRule::AllowAll => EdgeDecision::Allow,
        }
    }

    fn rate_limit(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        if !self.rate_limit.enabled {
            return EdgeDecision::Continue;
        }

        let profile = self.classify(request.method, request.path);
        let rule = profile.rule(&self.rate_limit.profiles);
        let key = format!("{}:{}", request.client, request.path);

        match self.limiter.check_rate_limit(&key, rule, profile) {
            Ok(_) => EdgeDecision::Continue,
            Err(exceeded) => {
                warn!(
                    client = request.client,
                    path = request.path,
                    profile = profile.name(),
                    "Rate limit exceeded"
                );
                EdgeDecision::Reject(EdgeRejection::RateLimited(exceeded))
            }
        }
    }

    fn public_paths(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        if !self
            .config
            .public_paths
            .iter()
            .any(|p| path_has_prefix(request.path, p))
        {
            return EdgeDecision::Continue;
        }

        if request.path == self.config.login_path && request.session.is_some() {
            return EdgeDecision::Redirect(self.config.home_path.clone());
        }
        EdgeDecision::Allow
    }

    fn public_reads(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        if !is_mutating(request.method) && path_has_prefix(request.path, &self.config.api_prefix) {
            EdgeDecision::Allow
        } else {
            EdgeDecision::Continue
        }
    }

    fn public_mutations(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        let declared = self.config.public_mutations.iter().any(|spec| {
            spec.method.eq_ignore_ascii_case(request.method.as_str())
                && path_has_prefix(request.path, &spec.path)
        });
        if declared {
            EdgeDecision::Allow
        } else {
            EdgeDecision::Continue
        }
    }

    fn protected_surface(&self, request: &EdgeRequest<'_>) -> EdgeDecision {
        let is_admin_ui = path_has_prefix(request.path, &self.config.admin_prefix);
        let is_api_mutation =
            path_has_prefix(request.path, &self.config.api_prefix) && is_mutating(request.method);
        if !is_admin_ui && !is_api_mutation {
            return EdgeDecision::Continue;
        }

        let Some(session) = request.session else {
            return if is_api_mutation {
                EdgeDecision::Reject(EdgeRejection::Denied(AppError::unauthorized()))
            } else {
                EdgeDecision::Redirect(self.login_redirect(request.path))
            };
        };

        let gate = if *request.method == Method::DELETE
            || self
                .config
                .user_management_paths
                .iter()
                .any(|p| path_has_prefix(request.path, p))
        {
            self.rbac.require_admin(session)
        } else if is_mutating(request.method) {
            self.rbac.require_editor(session)
        } else {
            Ok(())
        };

        match gate {
            Ok(()) => EdgeDecision::Allow,
            Err(err) => EdgeDecision::Reject(EdgeRejection::Denied(err)),
        }
    }

    fn login_redirect(&self, path: &str) -> String {
        format!(
            "{}?callbackUrl={}",
            self.config.login_path,
            encode_query_value(path)
        )
    }
}

fn encode_query_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Middleware running the edge policy for every request.
pub async fn edge_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_identifier(
        request.headers(),
        &state.config.rate_limit.trusted_proxy_headers,
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
    );
    let session = current_session(&state, request.headers());

    let decision = state.edge_policy.evaluate(&EdgeRequest {
        method: request.method(),
        path: request.uri().path(),
        client: &client,
        session: session.as_ref(),
    });

    match decision {
        EdgeDecision::Continue | EdgeDecision::Allow => next.run(request).await,
        EdgeDecision::Redirect(location) => redirect(&location),
        EdgeDecision::Reject(rejection) => rejection.into_response(),
    }
}

fn redirect(location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
        Err(_) => ApiError(AppError::internal(format!(
            "Invalid redirect location: {location}"
        )))
        .into_response(),
    }
}
