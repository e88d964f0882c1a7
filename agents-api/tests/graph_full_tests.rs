//! Full graph and full project orchestration tests.

use agents_api::services::{self, WiringKind};
use agents_api::ApiResult;
use agents_core::AgentDefinition;
use agents_storage::access::{agent_relations, agents, tools};
use agents_storage::table::{AGENT_RELATIONS, AGENT_TOOL_RELATIONS};
use agents_test_utils::assertions::{agent_ids, relation_targets};
use agents_test_utils::{fixtures, FailingStore};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[path = "support/router.rs"]
mod test_router_support;
use test_router_support::{create_project, memory_router, send};

// ============================================================================
// SERVICE
// ============================================================================

#[tokio::test]
async fn test_create_full_graph_round_trips() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let graph = fixtures::sample_full_graph();

    let outcome = services::create_full_graph(store.as_ref(), &fixtures::project(), &graph).await?;
    assert!(outcome.created);
    assert!(outcome.failures.is_empty());

    let stored = &outcome.graph;
    assert_eq!(agent_ids(stored), vec!["billing", "partner", "router"]);
    assert_eq!(stored.default_agent_id.as_deref(), Some("router"));
    assert_eq!(
        relation_targets(stored, "router"),
        (vec!["billing"], vec!["partner"])
    );
    assert!(stored.tools.contains_key("search"));
    assert!(stored.credential_references.contains_key("partner-key"));
    assert_eq!(
        stored.context_config.as_ref().map(|c| c.id.as_str()),
        Some("helpdesk-context")
    );

    let router = stored
        .agents
        .get("router")
        .and_then(AgentDefinition::as_internal)
        .expect("router is internal");
    assert_eq!(router.selected_tools["search"], vec!["lookup".to_string()]);
    assert_eq!(router.data_components, vec!["order-card".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_create_full_graph_twice_conflicts() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let graph = fixtures::sample_full_graph();
    services::create_full_graph(store.as_ref(), &fixtures::project(), &graph).await?;

    let err = services::create_full_graph(store.as_ref(), &fixtures::project(), &graph)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_create_full_graph_in_missing_project() {
    let store = fixtures::memory_store();
    let err = services::create_full_graph(
        store.as_ref(),
        &fixtures::project(),
        &fixtures::sample_full_graph(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_definition_writes_nothing() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let mut graph = fixtures::sample_full_graph();
    graph.default_agent_id = Some("partner".to_string());

    let err = services::create_full_graph(store.as_ref(), &fixtures::project(), &graph)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(agents::list_agents(store.as_ref(), &fixtures::graph()).await?.is_empty());
    assert!(tools::list_tools(store.as_ref(), &fixtures::project()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_relation_failures_are_collected() -> ApiResult<()> {
    let memory = fixtures::seeded_store().await?;
    let failing = FailingStore::new(memory.clone()).fail_writes_to(&AGENT_RELATIONS);

    let outcome = services::create_full_graph(
        &failing,
        &fixtures::project(),
        &fixtures::sample_full_graph(),
    )
    .await?;

    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome
        .failures
        .iter()
        .all(|f| f.kind == WiringKind::AgentRelation && f.agent_id == "router"));

    // Agents and the rest of the wiring were still written.
    assert_eq!(agent_ids(&outcome.graph), vec!["billing", "partner", "router"]);
    assert_eq!(
        relation_targets(&outcome.graph, "router"),
        (Vec::<&str>::new(), Vec::<&str>::new())
    );
    assert!(outcome.graph.tools.contains_key("search"));
    assert!(
        agent_relations::list_agent_relations(memory.as_ref(), &fixtures::graph())
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn test_tool_grant_failures_are_collected() -> ApiResult<()> {
    let memory = fixtures::seeded_store().await?;
    let failing = FailingStore::new(memory.clone()).fail_writes_to(&AGENT_TOOL_RELATIONS);

    let outcome = services::create_full_graph(
        &failing,
        &fixtures::project(),
        &fixtures::sample_full_graph(),
    )
    .await?;

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].kind, WiringKind::ToolRelation);
    assert_eq!(outcome.failures[0].target_id, "search");
    assert_eq!(
        relation_targets(&outcome.graph, "router"),
        (vec!["billing"], vec!["partner"])
    );
    Ok(())
}

#[tokio::test]
async fn test_update_full_graph_removes_orphans() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let project = fixtures::project();
    services::create_full_graph(store.as_ref(), &project, &fixtures::sample_full_graph()).await?;

    let mut graph = fixtures::sample_full_graph();
    graph.agents.remove("billing");
    if let Some(AgentDefinition::Internal(router)) = graph.agents.get_mut("router") {
        router.can_transfer_to.clear();
        router.tools.clear();
        router.selected_tools.clear();
    }
    graph.tools.clear();

    let outcome = services::update_full_graph(store.as_ref(), &project, &graph).await?;
    assert!(!outcome.created);
    assert_eq!(agent_ids(&outcome.graph), vec!["partner", "router"]);
    assert_eq!(
        relation_targets(&outcome.graph, "router"),
        (Vec::<&str>::new(), vec!["partner"])
    );

    // The tool grant is gone but the project tool stays.
    assert!(tools::list_agent_tool_relations(store.as_ref(), &fixtures::graph())
        .await?
        .is_empty());
    assert_eq!(tools::list_tools(store.as_ref(), &project).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_update_full_graph_creates_when_absent() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let outcome = services::update_full_graph(
        store.as_ref(),
        &fixtures::project(),
        &fixtures::sample_full_graph(),
    )
    .await?;
    assert!(outcome.created);
    Ok(())
}

#[tokio::test]
async fn test_delete_full_graph_keeps_project_resources() -> ApiResult<()> {
    let store = fixtures::seeded_store().await?;
    let project = fixtures::project();
    services::create_full_graph(store.as_ref(), &project, &fixtures::sample_full_graph()).await?;

    assert!(services::delete_full_graph(store.as_ref(), &fixtures::graph()).await?);
    assert!(services::get_full_graph(store.as_ref(), &fixtures::graph())
        .await?
        .is_none());
    assert_eq!(tools::list_tools(store.as_ref(), &project).await?.len(), 1);

    assert!(!services::delete_full_graph(store.as_ref(), &fixtures::graph()).await?);
    Ok(())
}

#[tokio::test]
async fn test_full_project_lifecycle() -> ApiResult<()> {
    let store = fixtures::memory_store();
    let definition = fixtures::sample_full_project();

    let outcome =
        services::create_full_project(store.as_ref(), &fixtures::tenant(), &definition).await?;
    assert!(outcome.created);
    assert_eq!(outcome.failure_count(), 0);
    assert!(outcome.project.tools.contains_key("search"));
    assert!(outcome.project.context_configs.contains_key("helpdesk-context"));

    let graph = &outcome.project.graphs[fixtures::GRAPH_ID];
    assert!(graph.tools.is_empty());
    assert_eq!(graph.context_config_id.as_deref(), Some("helpdesk-context"));
    assert_eq!(agent_ids(graph), vec!["billing", "partner", "router"]);

    let mut emptied = definition.clone();
    emptied.graphs.clear();
    let outcome =
        services::update_full_project(store.as_ref(), &fixtures::project(), &emptied).await?;
    assert!(!outcome.created);
    assert!(outcome.project.graphs.is_empty());
    assert!(outcome.project.tools.contains_key("search"));

    assert!(services::delete_full_project(store.as_ref(), &fixtures::project()).await?);
    assert!(services::get_full_project(store.as_ref(), &fixtures::project())
        .await?
        .is_none());
    Ok(())
}

// ============================================================================
// ROUTES
// ============================================================================

const FULL_GRAPH: &str = "/tenants/acme/projects/support/graph";

fn sample_graph_json() -> serde_json::Value {
    serde_json::to_value(fixtures::sample_full_graph()).expect("sample graph serializes")
}

#[tokio::test]
async fn test_put_full_graph_creates_then_updates() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let uri = format!("{FULL_GRAPH}/helpdesk");
    let response = send(&router, Method::PUT, &uri, Some(sample_graph_json())).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["agents"]["router"]["type"], "internal");
    assert_eq!(response.body["data"]["agents"]["partner"]["type"], "external");

    let response = send(&router, Method::PUT, &uri, Some(sample_graph_json())).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let response = send(&router, Method::GET, &uri, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["agents"]["router"]["can_transfer_to"],
        json!(["billing"])
    );
}

#[tokio::test]
async fn test_full_graph_id_mismatch() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(
        &router,
        Method::PUT,
        &format!("{FULL_GRAPH}/other"),
        Some(sample_graph_json()),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_full_graph_lists_every_issue() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let mut graph = fixtures::sample_full_graph();
    graph.default_agent_id = None;
    if let Some(AgentDefinition::Internal(router_agent)) = graph.agents.get_mut("router") {
        router_agent.tools.push("missing-tool".to_string());
    }
    let body = serde_json::to_value(&graph).expect("graph serializes");

    let response = send(&router, Method::POST, FULL_GRAPH, Some(body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = response.body["errors"].as_array().cloned().unwrap_or_default();
    assert!(errors.len() >= 2, "{:?}", errors);
}

#[tokio::test]
async fn test_delete_full_graph_route() {
    let (_store, router) = memory_router();
    create_project(&router).await;

    let response = send(&router, Method::POST, FULL_GRAPH, Some(sample_graph_json())).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let uri = format!("{FULL_GRAPH}/helpdesk");
    let response = send(&router, Method::DELETE, &uri, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = send(&router, Method::GET, &uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = send(&router, Method::DELETE, &uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_full_routes() {
    let (_store, router) = memory_router();
    let body = serde_json::to_value(fixtures::sample_full_project()).expect("project serializes");

    let response = send(&router, Method::POST, "/tenants/acme/project-full", Some(body.clone())).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let response = send(&router, Method::POST, "/tenants/acme/project-full", Some(body.clone())).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let uri = "/tenants/acme/project-full/support";
    let response = send(&router, Method::PUT, uri, Some(body)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["graphs"]["helpdesk"].is_object());

    let response = send(&router, Method::DELETE, uri, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = send(&router, Method::GET, uri, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
