//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use portal_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Session cookies only travel cross-origin with explicit origins, so a
/// wildcard origin disables credentials.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard_origin = config.allowed_origins.iter().any(|o| o == "*");

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let mut layer = CorsLayer::new()
        .allow_methods(methods)
        .max_age(Duration::from_secs(config.max_age_seconds));

    if wildcard_origin {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true);
    }

    if config.allowed_headers.iter().any(|h| h == "*") {
        layer = if wildcard_origin {
            layer.allow_headers(Any)
        } else {
            layer.allow_headers(AllowHeaders::mirror_request())
        };
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(headers);
    }

    layer
}
