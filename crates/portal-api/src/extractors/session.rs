//! `AuthSession` and `HybridAccess`: the verified caller, as attached by
//! [`with_auth`](crate::middleware::auth::with_auth) and
//! [`with_hybrid_auth`](crate::middleware::hybrid::with_hybrid_auth).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use portal_auth::SessionPayload;
use portal_core::error::AppError;

use crate::error::ApiError;
use crate::middleware::hybrid::DataScope;

/// The verified session of a route wrapped with `with_auth`.
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionPayload);

impl std::ops::Deref for AuthSession {
    type Target = SessionPayload;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionPayload>()
            .cloned()
            .map(AuthSession)
            .ok_or_else(|| ApiError(AppError::unauthorized()))
    }
}

/// What a route wrapped with `with_hybrid_auth` may show its caller.
#[derive(Debug, Clone)]
pub struct HybridAccess {
    /// The caller's session, when one was presented.
    pub session: Option<SessionPayload>,
    /// Data the handler may return.
    pub scope: DataScope,
}

impl HybridAccess {
    /// Whether the handler may return every record.
    pub fn is_full(&self) -> bool {
        matches!(self.scope, DataScope::Full)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for HybridAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<HybridAccess>()
            .cloned()
            .ok_or_else(|| {
                ApiError(AppError::internal(
                    "HybridAccess extracted on a route without hybrid auth",
                ))
            })
    }
}
