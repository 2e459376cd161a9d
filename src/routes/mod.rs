//! HTTP routes for adk2goose
//!
//! This module defines all HTTP endpoints exposed by the bridge.

pub mod health;
pub mod metrics;
pub mod run_sse;
pub mod sessions;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ADK REST surface
    let adk_routes = Router::new()
        .route(
            "/apps/:app/users/:user/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/apps/:app/users/:user/sessions/:session",
            post(sessions::create_session_with_id)
                .get(sessions::get_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/apps/:app/users/:user/sessions/:session/run_sse",
            post(run_sse::run_sse),
        );

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    // The timeout bounds producing the response head; an open SSE body is
    // bounded by the caller.
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        .merge(public_routes)
        .merge(adk_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
