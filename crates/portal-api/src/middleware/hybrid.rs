//! One endpoint, two audiences: privileged callers see every record, the
//! public surface sees only records in public-safe states.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::REFERER;
use axum::http::{HeaderMap, Uri};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use portal_auth::{RbacEnforcer, SessionPayload};
use portal_core::error::AppError;
use portal_entity::Permission;

use super::auth::current_session;
use super::edge::path_has_prefix;
use crate::error::ApiError;
use crate::extractors::HybridAccess;
use crate::state::AppState;

/// Status the public surface may always see.
pub const DEFAULT_PUBLIC_STATUS: &str = "published";

/// Declares who sees everything and what everyone else may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridOptions {
    /// Permissions that unlock unrestricted data.
    pub required_permissions: Vec<Permission>,
    /// Record statuses visible on the public surface.
    pub public_statuses: Vec<String>,
}

impl HybridOptions {
    /// Options unlocked by `required_permissions`, exposing published records
    /// publicly.
    pub fn new<I>(required_permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        Self {
            required_permissions: required_permissions.into_iter().collect(),
            public_statuses: vec![DEFAULT_PUBLIC_STATUS.to_string()],
        }
    }

    /// Replaces the public status allow-list.
    pub fn with_public_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }
}

/// The list filters a hybrid endpoint inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilter {
    /// Requested record status.
    #[serde(default)]
    pub status: Option<String>,
    /// Whether soft-deleted records are requested. Any value other than
    /// `false` or `0` counts as a request.
    #[serde(default, alias = "includeDeleted", deserialize_with = "deserialize_flag")]
    pub include_deleted: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(!matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0"))
}

/// Data a hybrid handler may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataScope {
    /// Every record, honoring the caller's own filters.
    Full,
    /// Only records whose status is in `statuses`, never soft-deleted ones.
    Public {
        /// Statuses the handler must restrict to.
        statuses: Vec<String>,
    },
}

/// Decides the data scope for a caller.
pub fn resolve_scope(
    rbac: &RbacEnforcer,
    session: Option<&SessionPayload>,
    options: &HybridOptions,
    from_admin_surface: bool,
    filter: &ListFilter,
) -> Result<DataScope, AppError> {
    let missing = match session {
        Some(session) if rbac.is_admin(session) => Vec::new(),
        Some(session) => rbac.missing_permissions(session, &options.required_permissions),
        None => options.required_permissions.clone(),
    };

    if session.is_some() && missing.is_empty() {
        return Ok(DataScope::Full);
    }

    if from_admin_surface {
        if session.is_none() {
            debug!("Anonymous hybrid request from admin surface");
            return Err(AppError::unauthorized());
        }
        debug!(missing = ?missing, "Hybrid request from admin surface without permission");
        return Err(AppError::missing_permissions(missing));
    }

    if filter.include_deleted {
        debug!("Public request for deleted records");
        return Err(AppError::missing_permissions(missing));
    }

    let statuses = match filter.status.as_deref() {
        Some(status) if options.public_statuses.iter().any(|s| s == status) => {
            vec![status.to_string()]
        }
        _ => options.public_statuses.clone(),
    };

    Ok(DataScope::Public { statuses })
}

/// Whether the request's `Referer` points into the administrative surface.
pub fn is_admin_referer(headers: &HeaderMap, admin_prefix: &str) -> bool {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .is_some_and(|uri| path_has_prefix(uri.path(), admin_prefix))
}

#[derive(Clone)]
struct HybridGuard {
    state: AppState,
    options: Arc<HybridOptions>,
}

/// Wraps `route` so its handlers receive a [`HybridAccess`] describing what
/// the caller may see.
pub fn with_hybrid_auth(
    state: &AppState,
    route: MethodRouter<AppState>,
    options: HybridOptions,
) -> MethodRouter<AppState> {
    let guard = HybridGuard {
        state: state.clone(),
        options: Arc::new(options),
    };
    route.route_layer(from_fn_with_state(guard, enforce))
}

async fn enforce(State(guard): State<HybridGuard>, mut request: Request, next: Next) -> Response {
    let filter = match Query::<ListFilter>::try_from_uri(request.uri()) {
        Ok(Query(filter)) => filter,
        Err(err) => {
            debug!(error = %err, "Rejected hybrid list query");
            return ApiError(AppError::validation("Invalid query parameters")).into_response();
        }
    };

    let session = current_session(&guard.state, request.headers());
    let from_admin_surface =
        is_admin_referer(request.headers(), &guard.state.config.edge.admin_prefix);

    match resolve_scope(
        &guard.state.rbac,
        session.as_ref(),
        &guard.options,
        from_admin_surface,
        &filter,
    ) {
        Ok(scope) => {
            request
                .extensions_mut()
                .insert(HybridAccess { session, scope });
            next.run(request).await
        }
        Err(err) => ApiError(err).into_response(),
    }
}
