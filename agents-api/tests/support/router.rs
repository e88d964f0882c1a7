use std::sync::Arc;

use agents_api::{create_api_router, ApiConfig, AuthConfig};
use agents_storage::{InMemoryStore, SharedStore};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

pub const BYPASS_SECRET: &str = "test-bypass-secret-0123456789abcdef";

pub fn test_api_config() -> ApiConfig {
    ApiConfig {
        rate_limit_enabled: false,
        ..ApiConfig::default()
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        bypass_secret: Some(SecretString::new(BYPASS_SECRET.into())),
        ..AuthConfig::default()
    }
}

/// Router over `store` that accepts the bypass secret.
pub fn test_router(store: SharedStore) -> Router {
    create_api_router(store, &test_api_config(), test_auth_config())
        .expect("Failed to build router")
}

pub fn memory_router() -> (Arc<InMemoryStore>, Router) {
    let store = Arc::new(InMemoryStore::new());
    let router = test_router(store.clone());
    (store, router)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Send a request authenticated with the bypass secret.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let auth = format!("Bearer {}", BYPASS_SECRET);
    send_with(router, method, uri, body, &[(header::AUTHORIZATION.as_str(), auth.as_str())]).await
}

pub async fn send_with(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        content_type,
        body,
    }
}

/// Create the `acme/support` project through the API.
pub async fn create_project(router: &Router) {
    let response = send(
        router,
        Method::POST,
        "/tenants/acme/projects",
        Some(serde_json::json!({"id": "support", "name": "Support"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
}
