//! Route definitions for the portal HTTP edge.
//!
//! Auth and health routes are mounted under `/api`. Content routes are
//! supplied by the caller with their full paths and pass through the same
//! edge dispatcher.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use portal_auth::AuthRequirements;

use crate::handlers;
use crate::middleware;
use crate::middleware::auth::with_auth;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// Every routed request is evaluated by the edge policy before it reaches a
/// handler.
pub fn build_router(state: AppState, content: Router<AppState>) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes(&state))
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .merge(content)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::edge::edge_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: login, refresh, logout, session
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/auth/session",
            with_auth(
                state,
                get(handlers::auth::session),
                AuthRequirements::authenticated(),
            ),
        )
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
