//! Prometheus Metrics Definitions
//!
//! Defines all platform metrics with their labels and exposes the
//! `/metrics` endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Storage operation latency buckets (seconds)
const STORAGE_LATENCY_BUCKETS: &[f64] =
    &[0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<AgentsMetrics>> = Lazy::new(AgentsMetrics::new);

/// Run `record` against the global metrics when they registered.
pub fn with_metrics(record: impl FnOnce(&AgentsMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        record(metrics);
    }
}

/// Container for all platform metrics.
#[derive(Clone)]
pub struct AgentsMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Storage operation counter - labels: operation, table, status
    pub storage_operations_total: CounterVec,

    /// Storage operation duration histogram - labels: operation, table
    pub storage_operation_duration_seconds: HistogramVec,

    /// Full graph/project operations - labels: operation, status
    pub full_graph_operations_total: CounterVec,

    /// Relation wiring steps that failed and were skipped - labels: kind
    pub wiring_failures_total: CounterVec,
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

impl AgentsMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "agents_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "agents_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            storage_operations_total: register_counter_vec!(
                "agents_storage_operations_total",
                "Total number of storage operations",
                &["operation", "table", "status"]
            )
            .map_err(|e| registration_error("storage_operations_total", e))?,

            storage_operation_duration_seconds: register_histogram_vec!(
                "agents_storage_operation_duration_seconds",
                "Storage operation duration in seconds",
                &["operation", "table"],
                STORAGE_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("storage_operation_duration_seconds", e))?,

            full_graph_operations_total: register_counter_vec!(
                "agents_full_graph_operations_total",
                "Total number of full graph and full project operations",
                &["operation", "status"]
            )
            .map_err(|e| registration_error("full_graph_operations_total", e))?,

            wiring_failures_total: register_counter_vec!(
                "agents_wiring_failures_total",
                "Relation wiring steps skipped after a failure",
                &["kind"]
            )
            .map_err(|e| registration_error("wiring_failures_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a storage operation.
    pub fn record_storage_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.storage_operations_total
            .with_label_values(&[operation, table, status])
            .inc();
        self.storage_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_secs);
    }

    /// Record a full graph or full project operation.
    pub fn record_full_graph_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.full_graph_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record skipped wiring steps.
    pub fn record_wiring_failures(&self, kind: &str, count: usize) {
        self.wiring_failures_total
            .with_label_values(&[kind])
            .inc_by(count as f64);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the lazy so a scrape before the first request still lists our families.
    let _ = METRICS.as_ref();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_storage_operation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        metrics.record_storage_operation("insert", "agents", true, 0.002);
        metrics.record_storage_operation("select", "tools", false, 0.010);
        let count = metrics
            .storage_operations_total
            .with_label_values(&["insert", "agents", "success"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_wiring_failures() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        let before = metrics
            .wiring_failures_total
            .with_label_values(&["agent_relation"])
            .get();
        metrics.record_wiring_failures("agent_relation", 2);
        let after = metrics
            .wiring_failures_total
            .with_label_values(&["agent_relation"])
            .get();
        assert!(after - before >= 2.0);
        Ok(())
    }
}
