//! Authentication and scoping through the full router.

use agents_api::{create_api_router, generate_jwt_token, ApiConfig, AuthConfig};
use agents_storage::InMemoryStore;
use axum::http::{header, Method, StatusCode};
use serde_json::json;
use std::sync::Arc;

#[path = "support/router.rs"]
mod test_router_support;
use test_router_support::{
    create_project, memory_router, send, send_with, test_api_config, test_auth_config,
};

const PROJECTS: &str = "/tenants/acme/projects";

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Create the helpdesk graph and issue a key for it.
async fn issue_api_key(router: &axum::Router) -> String {
    let response = send(
        router,
        Method::POST,
        "/tenants/acme/projects/support/agent-graphs",
        Some(json!({"id": "helpdesk", "name": "Helpdesk"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let response = send(
        router,
        Method::POST,
        "/tenants/acme/projects/support/api-keys",
        Some(json!({"graph_id": "helpdesk", "name": "widget"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert!(response.body["data"]["api_key"].get("key_hash").is_none());
    response.body["data"]["key"]
        .as_str()
        .expect("plaintext key in create response")
        .to_string()
}

#[tokio::test]
async fn test_missing_credentials_are_unauthorized() {
    let (_store, router) = memory_router();
    let response = send_with(&router, Method::GET, PROJECTS, None, &[]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.content_type.as_deref(),
        Some("application/problem+json")
    );
    assert_eq!(response.body["code"], "unauthorized");
    assert_eq!(response.body["instance"], PROJECTS);
}

#[tokio::test]
async fn test_garbage_bearer_is_unauthorized() {
    let (_store, router) = memory_router();
    let auth = bearer("not-a-jwt");
    let response = send_with(
        &router,
        Method::GET,
        PROJECTS,
        None,
        &[(header::AUTHORIZATION.as_str(), auth.as_str())],
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bypass_secret_reaches_any_tenant() {
    let (_store, router) = memory_router();
    let response = send(&router, Method::GET, "/tenants/globex/projects", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_jwt_is_scoped_to_its_tenant() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let token = generate_jwt_token(
        &AuthConfig::default(),
        "user-1".to_string(),
        Some("acme".to_string()),
        vec![],
    )
    .expect("token");
    let auth = bearer(&token);
    let headers = [(header::AUTHORIZATION.as_str(), auth.as_str())];

    let response = send_with(&router, Method::GET, "/tenants/acme/projects/support", None, &headers).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let response = send_with(&router, Method::GET, "/tenants/globex/projects", None, &headers).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["code"], "forbidden");
}

#[tokio::test]
async fn test_jwt_without_tenant_is_rejected() {
    let (_store, router) = memory_router();
    let token = generate_jwt_token(&AuthConfig::default(), "user-1".to_string(), None, vec![])
        .expect("token");
    let auth = bearer(&token);
    let response = send_with(
        &router,
        Method::GET,
        PROJECTS,
        None,
        &[(header::AUTHORIZATION.as_str(), auth.as_str())],
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_is_scoped_to_its_project() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    let response = send(
        &router,
        Method::POST,
        PROJECTS,
        Some(json!({"id": "billing", "name": "Billing"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let key = issue_api_key(&router).await;
    let headers = [("x-api-key", key.as_str())];

    let response = send_with(
        &router,
        Method::GET,
        "/tenants/acme/projects/support/agent-graphs/helpdesk",
        None,
        &headers,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let response =
        send_with(&router, Method::GET, "/tenants/acme/projects/billing", None, &headers).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response =
        send_with(&router, Method::GET, "/tenants/globex/projects", None, &headers).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_api_key_as_bearer_token() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    let key = issue_api_key(&router).await;

    let auth = bearer(&key);
    let response = send_with(
        &router,
        Method::GET,
        "/tenants/acme/projects/support",
        None,
        &[(header::AUTHORIZATION.as_str(), auth.as_str())],
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
async fn test_api_key_cannot_manage_keys() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    let key = issue_api_key(&router).await;

    let response = send_with(
        &router,
        Method::GET,
        "/tenants/acme/projects/support/api-keys",
        None,
        &[("x-api-key", key.as_str())],
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // The admin still sees the key, without its secret.
    let response = send(&router, Method::GET, "/tenants/acme/projects/support/api-keys", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total"], 1);
    assert_eq!(response.body["data"][0]["graph_id"], "helpdesk");
    assert!(response.body["data"][0]["last_used_at"].is_string());
}

#[tokio::test]
async fn test_unknown_api_key_is_unauthorized() {
    let (_store, router) = memory_router();
    let response = send_with(
        &router,
        Method::GET,
        PROJECTS,
        None,
        &[("x-api-key", "sk_nothere.0000000000")],
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_disabled_allows_anonymous_calls() {
    let store = Arc::new(InMemoryStore::new());
    let auth = AuthConfig {
        auth_disabled: true,
        ..AuthConfig::default()
    };
    let router = create_api_router(store, &test_api_config(), auth).expect("router");

    let response = send_with(&router, Method::GET, "/tenants/globex/projects", None, &[]).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_bad_api_keys_are_rate_limited() {
    let api_config = ApiConfig {
        rate_limit_enabled: true,
        rate_limit_unauthenticated: 1,
        rate_limit_burst: 2,
        ..test_api_config()
    };
    let store = Arc::new(InMemoryStore::new());
    let router = create_api_router(store, &api_config, test_auth_config()).expect("router");
    let bad_key = [("x-api-key", "sk_nobody.wrong")];

    for _ in 0..2 {
        let response = send_with(&router, Method::GET, PROJECTS, None, &bad_key).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = send_with(&router, Method::GET, PROJECTS, None, &bad_key).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["code"], "too_many_requests");

    // Turned away before authentication runs.
    let response = send_with(&router, Method::GET, PROJECTS, None, &[]).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_authenticated_calls_do_not_spend_ip_budget() {
    let api_config = ApiConfig {
        rate_limit_enabled: true,
        rate_limit_unauthenticated: 1,
        rate_limit_burst: 3,
        ..test_api_config()
    };
    let store = Arc::new(InMemoryStore::new());
    let router = create_api_router(store, &api_config, test_auth_config()).expect("router");

    for _ in 0..3 {
        let response = send(&router, Method::GET, PROJECTS, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    for _ in 0..3 {
        let response = send_with(&router, Method::GET, PROJECTS, None, &[]).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    let response = send_with(&router, Method::GET, PROJECTS, None, &[]).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}
