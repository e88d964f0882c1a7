//! Route tests for entity CRUD over the in-memory store.

use axum::http::{Method, StatusCode};
use serde_json::json;

#[path = "support/router.rs"]
mod test_router_support;
use test_router_support::{create_project, memory_router, send};

const GRAPH: &str = "/tenants/acme/projects/support/graphs/helpdesk";

async fn create_graph_with_agents(router: &axum::Router) {
    let response = send(
        router,
        Method::POST,
        "/tenants/acme/projects/support/agent-graphs",
        Some(json!({"id": "helpdesk", "name": "Helpdesk"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    for id in ["router", "billing"] {
        let response = send(
            router,
            Method::POST,
            &format!("{GRAPH}/agents"),
            Some(json!({"id": id, "name": id, "prompt": "Help the customer"})),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    }
}

#[tokio::test]
async fn test_project_crud_lifecycle() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(&router, Method::GET, "/tenants/acme/projects/support", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["name"], "Support");
    assert_eq!(response.body["data"]["tenant_id"], "acme");

    let response = send(
        &router,
        Method::PUT,
        "/tenants/acme/projects/support",
        Some(json!({"description": "Customer support"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["description"], "Customer support");
    assert_eq!(response.body["data"]["name"], "Support");

    let response = send(&router, Method::DELETE, "/tenants/acme/projects/support", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&router, Method::GET, "/tenants/acme/projects/support", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_project_is_conflict_problem() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects",
        Some(json!({"id": "support", "name": "Again"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.content_type.as_deref(),
        Some("application/problem+json")
    );
    assert_eq!(response.body["status"], 409);
    assert_eq!(response.body["code"], "conflict");
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let (_store, router) = memory_router();
    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects",
        Some(json!({"id": "has spaces", "name": "Bad"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "bad_request");
}

#[tokio::test]
async fn test_empty_update_is_rejected() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    let response = send(&router, Method::PUT, "/tenants/acme/projects/support", Some(json!({}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_projects_are_isolated_by_tenant() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(&router, Method::GET, "/tenants/globex/projects/support", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&router, Method::GET, "/tenants/globex/projects", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], json!([]));
    assert_eq!(response.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_list_is_paginated() {
    let (_store, router) = memory_router();
    for id in ["alpha", "beta", "gamma"] {
        let response = send(
            &router,
            Method::POST,
            "/tenants/acme/projects",
            Some(json!({"id": id, "name": id})),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = send(&router, Method::GET, "/tenants/acme/projects?page=2&limit=2", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(response.body["pagination"]["total"], 3);
    assert_eq!(response.body["pagination"]["pages"], 2);

    let response = send(&router, Method::GET, "/tenants/acme/projects?limit=500", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_graph_requires_existing_project() {
    let (_store, router) = memory_router();
    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects/missing/agent-graphs",
        Some(json!({"id": "helpdesk", "name": "Helpdesk"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agent_relations_and_related_agents() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    create_graph_with_agents(&router).await;

    let response = send(
        &router,
        Method::POST,
        &format!("{GRAPH}/agent-relations"),
        Some(json!({
            "source_agent_id": "router",
            "target_agent_id": "billing",
            "relation_type": "transfer",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let response = send(
        &router,
        Method::GET,
        "/tenants/acme/projects/support/agent-graphs/helpdesk/related-agents/router",
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let internal = &response.body["data"]["internal_relations"];
    assert_eq!(internal[0]["id"], "billing");
    assert_eq!(internal[0]["relation_type"], "transfer");
}

#[tokio::test]
async fn test_relation_to_missing_agent_is_unprocessable() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    create_graph_with_agents(&router).await;

    let response = send(
        &router,
        Method::POST,
        &format!("{GRAPH}/agent-relations"),
        Some(json!({
            "source_agent_id": "router",
            "target_agent_id": "ghost",
            "relation_type": "delegate",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_relation_with_both_targets_is_rejected() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    create_graph_with_agents(&router).await;

    let response = send(
        &router,
        Method::POST,
        &format!("{GRAPH}/agent-relations"),
        Some(json!({
            "source_agent_id": "router",
            "target_agent_id": "billing",
            "external_agent_id": "partner",
            "relation_type": "delegate",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_agent_removes_its_relations() {
    let (_store, router) = memory_router();
    create_project(&router).await;
    create_graph_with_agents(&router).await;

    let response = send(
        &router,
        Method::POST,
        &format!("{GRAPH}/agent-relations"),
        Some(json!({
            "source_agent_id": "router",
            "target_agent_id": "billing",
            "relation_type": "transfer",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = send(&router, Method::DELETE, &format!("{GRAPH}/agents/billing"), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&router, Method::GET, &format!("{GRAPH}/agent-relations"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_data_component_props_must_be_a_schema() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects/support/data-components",
        Some(json!({
            "id": "order-card",
            "name": "Order card",
            "props": {"type": "not-a-type"},
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects/support/data-components",
        Some(json!({
            "id": "order-card",
            "name": "Order card",
            "props": {"type": "object", "properties": {"order_id": {"type": "string"}}},
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
}

#[tokio::test]
async fn test_tool_with_unknown_credential_is_unprocessable() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects/support/tools",
        Some(json!({
            "id": "search",
            "name": "Search",
            "config": {"server_url": "https://mcp.example.com/search"},
            "credential_reference_id": "missing",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_tool_status_update() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(
        &router,
        Method::POST,
        "/tenants/acme/projects/support/tools",
        Some(json!({
            "id": "search",
            "name": "Search",
            "config": {"server_url": "https://mcp.example.com/search"},
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "unknown");

    let response = send(
        &router,
        Method::PUT,
        "/tenants/acme/projects/support/tools/search/status",
        Some(json!({"status": "unhealthy", "last_error": "connection refused"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "unhealthy");
    assert_eq!(response.body["data"]["last_error"], "connection refused");
}

#[tokio::test]
async fn test_conversation_messages() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let base = "/tenants/acme/projects/support/conversations";
    let response = send(
        &router,
        Method::POST,
        base,
        Some(json!({"id": "conv-1", "active_agent_id": "router", "user_id": "u-1"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    for text in ["hello", "world"] {
        let response = send(
            &router,
            Method::POST,
            &format!("{base}/conv-1/messages"),
            Some(json!({"role": "user", "content": {"text": text}})),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    }

    let response = send(&router, Method::GET, &format!("{base}/conv-1/messages"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][0]["content"]["text"], "hello");
    assert_eq!(response.body["data"][1]["content"]["text"], "world");

    let response = send(&router, Method::GET, &format!("{base}/missing/messages"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let (_store, router) = memory_router();
    let response = test_router_support::send_with(&router, Method::GET, "/health/ping", None, &[]).await;
    assert_eq!(response.status, StatusCode::OK);

    let response =
        test_router_support::send_with(&router, Method::GET, "/openapi.json", None, &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["info"]["title"], "Agents API");
}
