//! # portal-api
//!
//! HTTP edge for the portal built on Axum.
//!
//! Every request passes the edge dispatcher (rate limiting, public
//! allow-listing, coarse role gates) before any handler runs. Handlers that
//! need finer authority are wrapped with [`with_auth`] or
//! [`with_hybrid_auth`] and receive the verified session through the
//! [`AuthSession`] and [`HybridAccess`] extractors.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, start_background_tasks};
pub use error::ApiError;
pub use extractors::{AuthSession, HybridAccess};
pub use middleware::auth::{require_auth, require_permission, require_role, with_auth};
pub use middleware::hybrid::{DataScope, HybridOptions, ListFilter, with_hybrid_auth};
pub use state::AppState;
