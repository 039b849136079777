//! Prometheus metrics
//!
//! Request rates and latencies, todo actions and storage operations.
//!
//! NOTE: session ids never appear as labels; they are unbounded.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Request Metrics
    // ============================================================================

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "todo_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "endpoint", "status"]
    ).expect("valid histogram definition");

    /// Total HTTP requests
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("todo_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("valid counter definition");

    // ============================================================================
    // Todo Metrics
    // ============================================================================

    /// Dispatched todo requests by outcome
    pub static ref TODO_ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("todo_actions_total", "Total dispatched todo requests"),
        &["action", "result"]  // result: "success", "not_found", "invalid", "error"
    ).expect("valid counter definition");

    /// Sessions known to the store (estimate)
    pub static ref SESSIONS_STORED: IntGauge = IntGauge::new(
        "todo_sessions_stored",
        "Estimated number of stored sessions"
    ).expect("valid gauge definition");

    // ============================================================================
    // Storage Metrics
    // ============================================================================

    /// RocksDB operations
    pub static ref ROCKSDB_OPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("todo_rocksdb_ops_total", "Total RocksDB operations"),
        &["operation", "result"]  // operation: "get", "put"
    ).expect("valid counter definition");
}

/// Register all metrics with the global registry
pub fn register_metrics() -> Result<(), prometheus::Error> {
    METRICS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;

    METRICS_REGISTRY.register(Box::new(TODO_ACTIONS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(SESSIONS_STORED.clone()))?;

    METRICS_REGISTRY.register(Box::new(ROCKSDB_OPS_TOTAL.clone()))?;

    Ok(())
}

/// Encode the registry in the Prometheus text format
pub fn gather_text() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&METRICS_REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_gather() {
        // Other tests may have registered already; a duplicate is fine here.
        let _ = register_metrics();
        TODO_ACTIONS_TOTAL.with_label_values(&["create", "success"]).inc();

        let text = gather_text().unwrap();
        assert!(text.contains("todo_actions_total"));
    }
}
