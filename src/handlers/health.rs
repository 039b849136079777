//! Health and Infrastructure Handlers
//!
//! Kubernetes probes and the Prometheus scrape endpoint.

use axum::{extract::State, http::StatusCode, response::Json};

use super::todos::AppState;
use crate::metrics;

/// Health response for main health endpoint
#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_stored: u64,
}

/// Main health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions_stored: state.sessions.session_count(),
    })
}

/// Liveness probe - process is up and serving
pub async fn health_live() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

/// Readiness probe - 200 once the session store answers reads, 503 otherwise
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let sessions = state.sessions.clone();
    let probe = tokio::task::spawn_blocking(move || sessions.load("__readiness_probe__")).await;

    match probe {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
        Ok(Err(e)) => not_ready(e.to_string()),
        Err(e) => not_ready(e.to_string()),
    }
}

fn not_ready(reason: String) -> (StatusCode, Json<serde_json::Value>) {
    tracing::warn!(reason = %reason, "Readiness probe failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "status": "not_ready",
            "error": reason,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

/// Prometheus metrics endpoint for observability
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    let stored = i64::try_from(state.sessions.session_count()).unwrap_or(i64::MAX);
    metrics::SESSIONS_STORED.set(stored);

    metrics::gather_text().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
