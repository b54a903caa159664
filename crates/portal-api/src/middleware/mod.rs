//! Axum middleware stack.

pub mod auth;
pub mod cors;
pub mod edge;
pub mod hybrid;
pub mod logging;
pub mod rate_limit;
