//! Per-route session enforcement.
//!
//! The `require_*` functions are the building blocks: each reads the
//! session token from the request headers, verifies it, and applies one
//! gate. [`with_auth`] wraps a route so the gates run before the handler and
//! the verified session is handed to it through the [`AuthSession`]
//! extractor.
//!
//! [`AuthSession`]: crate::extractors::AuthSession

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use tracing::debug;

use portal_auth::{AuthRequirements, SessionPayload};
use portal_core::error::AppError;
use portal_entity::Permission;

use crate::error::ApiError;
use crate::state::AppState;

/// Verifies the request's session token, if it has one.
pub fn current_session(state: &AppState, headers: &HeaderMap) -> Option<SessionPayload> {
    let token = state.cookies.session_token(headers)?;
    let session = state.session_manager.verify(&token);
    if session.is_none() {
        debug!("Rejected invalid or expired session token");
    }
    session
}

/// Requires a valid session.
pub fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<SessionPayload, AppError> {
    current_session(state, headers).ok_or_else(AppError::unauthorized)
}

/// Requires a valid session holding one of `allowed` roles.
pub fn require_role<S: AsRef<str>>(
    state: &AppState,
    headers: &HeaderMap,
    allowed: &[S],
) -> Result<SessionPayload, AppError> {
    let session = require_auth(state, headers)?;
    state.rbac.require_role(&session, allowed)?;
    Ok(session)
}

/// Requires a valid session holding `permission`.
pub fn require_permission(
    state: &AppState,
    headers: &HeaderMap,
    permission: Permission,
) -> Result<SessionPayload, AppError> {
    let session = require_auth(state, headers)?;
    state.rbac.require_permission(&session, permission)?;
    Ok(session)
}

/// Requires a valid session and applies every requirement.
///
/// Authentication is checked first, so an unauthenticated caller always
/// gets 401 even when the requirements would also fail.
pub fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    requirements: &AuthRequirements,
) -> Result<SessionPayload, AppError> {
    let session = require_auth(state, headers)?;
    state.rbac.authorize(&session, requirements)?;
    Ok(session)
}

#[derive(Clone)]
struct AuthGuard {
    state: AppState,
    requirements: Arc<AuthRequirements>,
}

/// Wraps `route` so its handlers only run for callers meeting `requirements`.
///
/// The verified [`SessionPayload`] is placed in the request extensions for
/// the [`AuthSession`](crate::extractors::AuthSession) extractor.
pub fn with_auth(
    state: &AppState,
    route: MethodRouter<AppState>,
    requirements: AuthRequirements,
) -> MethodRouter<AppState> {
    let guard = AuthGuard {
        state: state.clone(),
        requirements: Arc::new(requirements),
    };
    route.route_layer(from_fn_with_state(guard, enforce))
}

async fn enforce(State(guard): State<AuthGuard>, mut request: Request, next: Next) -> Response {
    match authorize(&guard.state, request.headers(), &guard.requirements) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => ApiError(err).into_response(),
    }
}
