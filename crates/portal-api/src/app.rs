//! Application builder: wires router, middleware, and background tasks.

use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, content: Router<AppState>) -> Router {
    build_router(state, content)
}

/// Starts the background tasks the edge depends on. Each task stops when
/// `shutdown` flips to `true`.
pub fn start_background_tasks(
    state: &AppState,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    if state.config.rate_limit.enabled {
        let interval = Duration::from_secs(state.config.rate_limit.sweep_interval_seconds);
        tracing::info!(
            interval_seconds = interval.as_secs(),
            "Starting rate limit sweeper"
        );
        handles.push(
            std::sync::Arc::clone(&state.rate_limiter).spawn_sweeper(interval, shutdown),
        );
    }

    handles
}
