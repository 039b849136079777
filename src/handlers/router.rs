//! Router Configuration - Centralized route definitions
//!
//! Infrastructure routes (health, metrics) and the todo endpoint are built
//! separately and merged; [`build_app`] adds the service-wide layers.

use axum::{
    error_handling::HandleErrorLayer,
    routing::{any, get},
    Router,
};
use std::time::Duration;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::todos::AppState;
use super::{health, todos};

/// Build the infrastructure routes
///
/// These routes must always be accessible for:
/// - Health checks (Kubernetes probes)
/// - Metrics (Prometheus scraping)
pub fn build_public_routes(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH & KUBERNETES PROBES
        // =================================================================
        .route("/health", get(health::health))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        // =================================================================
        // METRICS (PROMETHEUS)
        // =================================================================
        .route("/metrics", get(health::metrics_endpoint))
        .with_state(state)
}

/// Build the todo routes
///
/// Every method is routed to the handler so unsupported ones get the
/// JSON 501 body instead of axum's bare 405.
pub fn build_todo_routes(state: AppState) -> Router {
    Router::new()
        .route("/todo", any(todos::todo_endpoint))
        .route("/todo-json", any(todos::todo_endpoint))
        .with_state(state)
}

/// Build the complete router with infrastructure and todo routes
///
/// Note: This function does NOT apply the service layers; see [`build_app`].
pub fn build_router(state: AppState) -> Router {
    let public = build_public_routes(state.clone());
    let todo = build_todo_routes(state);

    Router::new().merge(public).merge(todo)
}

/// Router plus metrics, timeout, panic catcher, concurrency limit, CORS and
/// request tracing, configured from the server config
pub fn build_app(state: AppState) -> Router {
    let config = state.server_config().clone();

    let router = build_router(state)
        .layer(axum::middleware::from_fn(crate::middleware::track_metrics));

    with_request_timeout(router, Duration::from_secs(config.request_timeout_secs))
        .layer(CatchPanicLayer::custom(crate::errors::panic_response))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(config.cors.to_layer())
        .layer(TraceLayer::new_for_http())
}

/// Answer requests running longer than `timeout` with the JSON 408 body
pub fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                crate::errors::service_error(err, timeout)
            }))
            .layer(TimeoutLayer::new(timeout)),
    )
}
