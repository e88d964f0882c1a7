//! Liveness and readiness routes under `/health`.
//!
//! `ready` round-trips the configured store (in-memory or Postgres) and
//! answers 503 until it responds. These routes sit outside `/tenants` and
//! carry neither auth nor rate limiting.

use std::time::Instant;

use agents_storage::SharedStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present on `/health/ready` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub storage: ComponentHealth,
    /// Version of the `agents-api` build answering the request.
    pub version: String,
    pub uptime_seconds: u64,
}

/// Result of one round trip to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    /// `memory` or `postgres`
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn check_storage(store: &SharedStore) -> ComponentHealth {
    let backend = store.backend_name().to_string();
    let started = Instant::now();
    match store.ping().await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            backend,
            latency_ms: Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
            error: None,
        },
        Err(e) => {
            tracing::warn!(backend = %backend, error = %e, "Storage unreachable");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                backend,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// GET /health/ping
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Plain-text pong", body = String),
    ),
))]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - answers whenever the server can run a handler.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse),
    ),
))]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("agents-api is running".to_string()),
        details: None,
    })
}

/// GET /health/ready - 200 once the store answers, 503 otherwise.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    ),
))]
pub async fn readiness(
    State(store): State<SharedStore>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let storage = check_storage(&store).await;
    let status = storage.status;
    let response = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            storage,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };
    (status.status_code(), Json(response))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents_storage::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let state = AppState::new(Arc::new(InMemoryStore::new()));
        let app = create_router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).expect("json"))
    }

    #[test]
    fn test_unhealthy_maps_to_503() {
        assert_eq!(HealthStatus::Healthy.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_live_omits_details() {
        let (status, json) = get_json("/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_ready_reports_memory_backend() {
        let (status, json) = get_json("/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["details"]["storage"]["backend"], "memory");
        assert_eq!(json["details"]["storage"]["status"], "healthy");
        assert!(json.get("message").is_none());
    }
}
