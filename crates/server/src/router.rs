//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/api/weeks", get(api::list_weeks))
        .route("/api/weeks/current", get(api::current_week))
        .route("/api/weeks/current/refresh", post(api::refresh_current_week))
        .route("/api/weeks/generate", post(api::generate_weeks))
        .route("/api/timetables/{id}/publish", post(api::publish_timetable))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS_ORIGIN, cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}
