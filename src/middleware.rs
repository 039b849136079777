//! HTTP request tracking middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Record request latency and count by method, endpoint and status
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    crate::metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[&method, endpoint, &status])
        .observe(duration);

    crate::metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, endpoint, &status])
        .inc();

    response
}

/// Map a request path onto a bounded label set
///
/// Only routed paths keep their own label; anything else is `other`, so
/// scanners probing random URLs cannot grow the label space.
fn normalize_path(path: &str) -> &'static str {
    match path.trim_end_matches('/') {
        "/todo" => "/todo",
        "/todo-json" => "/todo-json",
        "/health" => "/health",
        "/health/live" => "/health/live",
        "/health/ready" => "/health/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}
