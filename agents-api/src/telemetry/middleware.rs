//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a tracing span, records Prometheus metrics and
//! logs a completion line.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::with_metrics;

/// Path segments that name a collection. The segment after one of these is
/// a resource id.
const COLLECTIONS: &[&str] = &[
    "tenants",
    "projects",
    "agent-graphs",
    "graphs",
    "graph",
    "agents",
    "related-agents",
    "agent-relations",
    "external-agents",
    "agent-tool-relations",
    "data-components",
    "artifact-components",
    "tools",
    "context-configs",
    "credentials",
    "api-keys",
    "conversations",
    "messages",
    "project-full",
];

/// Normalize path for metrics/spans (replace resource ids with `{id}`).
///
/// This prevents high-cardinality label explosion in Prometheus.
pub fn normalize_path(path: &str) -> String {
    let mut after_collection = false;
    path.split('/')
        .map(|segment| {
            if after_collection && !segment.is_empty() {
                after_collection = false;
                "{id}"
            } else {
                after_collection = COLLECTIONS.contains(&segment);
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with:
/// 1. A tracing span carrying method and route
/// 2. Prometheus metrics recording
/// 3. Request/response logging
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
        otel.kind = "server",
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    with_metrics(|metrics| {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        )
    });

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_tenant_project() {
        let path = "/tenants/acme/projects/support";
        let normalized = normalize_path(path);
        assert_eq!(normalized, "/tenants/{id}/projects/{id}");
    }

    #[test]
    fn test_normalize_path_nested_graph_resources() {
        let path = "/tenants/acme/projects/support/graphs/triage/agents/router/data-components/weather-card";
        let normalized = normalize_path(path);
        assert_eq!(
            normalized,
            "/tenants/{id}/projects/{id}/graphs/{id}/agents/{id}/data-components/{id}"
        );
    }

    #[test]
    fn test_normalize_path_id_named_like_collection() {
        let path = "/tenants/acme/projects/agents/tools";
        let normalized = normalize_path(path);
        assert_eq!(normalized, "/tenants/{id}/projects/{id}/tools");
    }

    #[test]
    fn test_normalize_path_collection_only() {
        let path = "/tenants/acme/projects";
        let normalized = normalize_path(path);
        assert_eq!(normalized, "/tenants/{id}/projects");
    }

    #[test]
    fn test_normalize_path_health() {
        let path = "/health/ready";
        let normalized = normalize_path(path);
        assert_eq!(normalized, "/health/ready");
    }
}
