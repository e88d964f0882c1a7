//! Data-access behavior against the in-memory store.
//!
//! Covers cascades, tenant isolation, relation wiring and conversation
//! history ordering.

use agents_core::{
    Agent, AgentGraph, AgentRelation, ArtifactComponent, ContextConfig, ExternalAgent,
    GraphScope, McpToolConfig, McpTransportType, Message, MessageContent, MessageRole,
    MessageType, MessageVisibility, Pagination, Project, ProjectScope, RelationType,
    TenantScope, Tool, ToolStatus,
};
use agents_storage::access::{
    agent_graphs, agent_relations, agents, api_keys, artifact_components, context_configs,
    conversations, data_components, external_agents, projects, tools,
};
use agents_storage::{InMemoryStore, Store};
use chrono::Utc;
use proptest::prelude::*;
use tokio::runtime::Runtime;

// ============================================================================
// FIXTURES
// ============================================================================

fn project(tenant: &str, id: &str) -> Project {
    let now = Utc::now();
    Project {
        tenant_id: tenant.to_string(),
        id: id.to_string(),
        name: format!("Project {id}"),
        description: None,
        models: None,
        stop_when: None,
        created_at: now,
        updated_at: now,
    }
}

fn graph(scope: &ProjectScope, id: &str) -> AgentGraph {
    let now = Utc::now();
    AgentGraph {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        id: id.to_string(),
        name: format!("Graph {id}"),
        description: None,
        default_agent_id: None,
        context_config_id: None,
        models: None,
        status_updates: None,
        graph_prompt: None,
        stop_when: None,
        created_at: now,
        updated_at: now,
    }
}

fn agent(scope: &GraphScope, id: &str) -> Agent {
    let now = Utc::now();
    Agent {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        graph_id: scope.graph_id.clone(),
        id: id.to_string(),
        name: format!("Agent {id}"),
        description: None,
        prompt: "Be helpful.".to_string(),
        conversation_history_config: None,
        models: None,
        stop_when: None,
        created_at: now,
        updated_at: now,
    }
}

fn relation(scope: &GraphScope, id: &str, source: &str, target: &str) -> AgentRelation {
    let now = Utc::now();
    AgentRelation {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        graph_id: scope.graph_id.clone(),
        id: id.to_string(),
        source_agent_id: source.to_string(),
        target_agent_id: Some(target.to_string()),
        external_agent_id: None,
        relation_type: RelationType::Transfer,
        created_at: now,
        updated_at: now,
    }
}

fn tool(scope: &ProjectScope, id: &str) -> Tool {
    let now = Utc::now();
    Tool {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        id: id.to_string(),
        name: format!("Tool {id}"),
        config: McpToolConfig {
            server_url: "http://localhost:4000/mcp".to_string(),
            transport: McpTransportType::StreamableHttp,
            active_tools: None,
        },
        credential_reference_id: None,
        headers: None,
        image_url: None,
        capabilities: None,
        status: ToolStatus::Unknown,
        last_health_check: None,
        last_error: None,
        available_tools: None,
        last_tools_sync: None,
        created_at: now,
        updated_at: now,
    }
}

fn message(scope: &ProjectScope, conversation_id: &str, id: &str, text: &str) -> Message {
    let now = Utc::now();
    Message {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        role: MessageRole::User,
        from_agent_id: None,
        to_agent_id: None,
        from_external_agent_id: None,
        to_external_agent_id: None,
        content: MessageContent {
            text: Some(text.to_string()),
            parts: None,
        },
        visibility: MessageVisibility::UserFacing,
        message_type: MessageType::Chat,
        agent_id: None,
        task_id: None,
        parent_message_id: None,
        a2a_task_id: None,
        a2a_session_id: None,
        metadata: None,
        created_at: now,
        updated_at: now,
    }
}

fn artifact_component(scope: &ProjectScope, id: &str) -> ArtifactComponent {
    let now = Utc::now();
    ArtifactComponent {
        tenant_id: scope.tenant_id.clone(),
        project_id: scope.project_id.clone(),
        id: id.to_string(),
        name: format!("Artifact {id}"),
        description: "Saved output".to_string(),
        summary_props: None,
        full_props: None,
        created_at: now,
        updated_at: now,
    }
}

/// A project with one graph holding agents `router` and `worker` joined by
/// a transfer relation.
async fn seeded(store: &dyn Store) -> Result<GraphScope, String> {
    let project_scope = ProjectScope::new("acme", "support");
    let graph_scope = project_scope.graph("triage");
    projects::create_project(store, project("acme", "support"))
        .await
        .map_err(|e| e.to_string())?;
    agent_graphs::create_agent_graph(store, graph(&project_scope, "triage"))
        .await
        .map_err(|e| e.to_string())?;
    for id in ["router", "worker"] {
        agents::create_agent(store, agent(&graph_scope, id))
            .await
            .map_err(|e| e.to_string())?;
    }
    agent_relations::create_agent_relation(
        store,
        relation(&graph_scope, "router-worker", "router", "worker"),
    )
    .await
    .map_err(|e| e.to_string())?;
    Ok(graph_scope)
}

// ============================================================================
// CASCADES
// ============================================================================

#[tokio::test]
async fn test_delete_agent_removes_its_relations() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;

    let deleted = agents::delete_agent(&store, &scope, "worker")
        .await
        .map_err(|e| e.to_string())?;
    assert!(deleted);

    let remaining = agent_relations::list_agent_relations(&store, &scope)
        .await
        .map_err(|e| e.to_string())?;
    assert!(remaining.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_delete_graph_keeps_project_resources() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let project_scope = scope.project();
    tools::create_tool(&store, tool(&project_scope, "search"))
        .await
        .map_err(|e| e.to_string())?;
    tools::add_tool_to_agent(&store, &scope.agent("router"), "search", None, None)
        .await
        .map_err(|e| e.to_string())?;

    assert!(agent_graphs::delete_agent_graph(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);

    assert!(agents::list_agents(&store, &scope)
        .await
        .map_err(|e| e.to_string())?
        .is_empty());
    assert!(tools::list_agent_tool_relations(&store, &scope)
        .await
        .map_err(|e| e.to_string())?
        .is_empty());
    assert!(tools::get_tool(&store, &project_scope, "search")
        .await
        .map_err(|e| e.to_string())?
        .is_some());
    Ok(())
}

#[tokio::test]
async fn test_delete_project_empties_every_table() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let project_scope = scope.project();
    api_keys::create_api_key(&store, &scope, Some("ci".to_string()), None)
        .await
        .map_err(|e| e.to_string())?;

    assert!(projects::delete_project(&store, &project_scope)
        .await
        .map_err(|e| e.to_string())?);

    for table in agents_storage::ALL_TABLES {
        assert_eq!(store.row_count(table).await, 0, "table {}", table.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_project_reports_false() -> Result<(), String> {
    let store = InMemoryStore::new();
    let deleted = projects::delete_project(&store, &ProjectScope::new("acme", "ghost"))
        .await
        .map_err(|e| e.to_string())?;
    assert!(!deleted);
    Ok(())
}

// ============================================================================
// RELATIONS AND GRANTS
// ============================================================================

#[tokio::test]
async fn test_relation_to_missing_agent_is_rejected() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let result = agent_relations::create_agent_relation(
        &store,
        relation(&scope, "router-ghost", "router", "ghost"),
    )
    .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_related_agents_lists_transfer_targets() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let related = agent_relations::get_related_agents_for_graph(&store, &scope, "router")
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(related.transfer_targets(), vec!["worker"]);
    assert!(related.delegate_targets().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tool_status_update_records_sync_time() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    tools::create_tool(&store, tool(&scope, "search"))
        .await
        .map_err(|e| e.to_string())?;

    let updated = tools::update_tool_status(
        &store,
        &scope,
        "search",
        tools::ToolHealth {
            status: ToolStatus::Healthy,
            last_error: None,
            available_tools: Some(Vec::new()),
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    assert_eq!(updated.status, ToolStatus::Healthy);
    assert!(updated.last_health_check.is_some());
    assert!(updated.last_tools_sync.is_some());
    Ok(())
}

#[tokio::test]
async fn test_data_component_association_is_idempotent() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let project_scope = scope.project();
    let now = Utc::now();
    data_components::create_data_component(
        &store,
        agents_core::DataComponent {
            tenant_id: project_scope.tenant_id.clone(),
            project_id: project_scope.project_id.clone(),
            id: "weather-card".to_string(),
            name: "Weather card".to_string(),
            description: "Current conditions".to_string(),
            props: serde_json::json!({"type": "object"}),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    let router = scope.agent("router");
    let first = data_components::associate_data_component_with_agent(&store, &router, "weather-card")
        .await
        .map_err(|e| e.to_string())?;
    let second =
        data_components::associate_data_component_with_agent(&store, &router, "weather-card")
            .await
            .map_err(|e| e.to_string())?;
    assert_eq!(first.id, second.id);

    let components = data_components::get_data_components_for_agent(&store, &router)
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(components.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_graph_agents_include_external_agents() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let now = Utc::now();
    external_agents::create_external_agent(
        &store,
        ExternalAgent {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            graph_id: scope.graph_id.clone(),
            id: "partner".to_string(),
            name: "Partner".to_string(),
            description: None,
            base_url: "https://partner.example.com".to_string(),
            credential_reference_id: None,
            headers: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    let found = agent_graphs::get_graph_agents(&store, &scope)
        .await
        .map_err(|e| e.to_string())?;
    let mut internal: Vec<&str> = found.internal.iter().map(|a| a.id.as_str()).collect();
    internal.sort_unstable();
    assert_eq!(internal, vec!["router", "worker"]);
    assert_eq!(found.external.len(), 1);
    assert_eq!(found.external[0].id, "partner");

    let other = agent_graphs::get_graph_agents(&store, &scope.project().graph("billing"))
        .await
        .map_err(|e| e.to_string())?;
    assert!(other.internal.is_empty() && other.external.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_artifact_component_counts_follow_associations() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let project_scope = scope.project();
    for id in ["report", "chart"] {
        artifact_components::create_artifact_component(&store, artifact_component(&project_scope, id))
            .await
            .map_err(|e| e.to_string())?;
    }

    assert!(!artifact_components::graph_has_artifact_components(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);

    let worker = scope.agent("worker");
    for id in ["report", "chart", "report"] {
        artifact_components::associate_artifact_component_with_agent(&store, &worker, id)
            .await
            .map_err(|e| e.to_string())?;
    }

    assert_eq!(
        artifact_components::count_artifact_components_for_agent(&store, &worker)
            .await
            .map_err(|e| e.to_string())?,
        2
    );
    assert_eq!(
        artifact_components::count_artifact_components_for_agent(&store, &scope.agent("router"))
            .await
            .map_err(|e| e.to_string())?,
        0
    );
    assert!(artifact_components::graph_has_artifact_components(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);
    Ok(())
}

#[tokio::test]
async fn test_has_context_config_requires_existing_config() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let project_scope = scope.project();

    assert!(!context_configs::has_context_config(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);
    assert!(!context_configs::has_context_config(&store, &project_scope.graph("ghost"))
        .await
        .map_err(|e| e.to_string())?);

    let now = Utc::now();
    context_configs::create_context_config(
        &store,
        ContextConfig {
            tenant_id: project_scope.tenant_id.clone(),
            project_id: project_scope.project_id.clone(),
            id: "request-ctx".to_string(),
            name: "Request context".to_string(),
            description: None,
            request_context_schema: None,
            context_variables: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    agent_graphs::set_context_config(&store, &scope, Some("request-ctx"))
        .await
        .map_err(|e| e.to_string())?;
    assert!(context_configs::has_context_config(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);

    context_configs::delete_context_config(&store, &project_scope, "request-ctx")
        .await
        .map_err(|e| e.to_string())?;
    assert!(!context_configs::has_context_config(&store, &scope)
        .await
        .map_err(|e| e.to_string())?);
    Ok(())
}

// ============================================================================
// API KEYS
// ============================================================================

#[tokio::test]
async fn test_api_key_round_trip() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let created = api_keys::create_api_key(&store, &scope, None, None)
        .await
        .map_err(|e| e.to_string())?;

    let resolved = api_keys::validate_and_get_api_key(&store, &created.key)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("key should resolve")?;
    assert_eq!(resolved.id, created.api_key.id);

    let tampered = format!("{}x", created.key);
    assert!(api_keys::validate_and_get_api_key(&store, &tampered)
        .await
        .map_err(|e| e.to_string())?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn test_expired_api_key_does_not_resolve() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = seeded(&store).await?;
    let created = api_keys::create_api_key(
        &store,
        &scope,
        None,
        Some(Utc::now() - chrono::Duration::minutes(1)),
    )
    .await
    .map_err(|e| e.to_string())?;
    assert!(api_keys::validate_and_get_api_key(&store, &created.key)
        .await
        .map_err(|e| e.to_string())?
        .is_none());
    Ok(())
}

// ============================================================================
// CONVERSATIONS
// ============================================================================

#[tokio::test]
async fn test_create_or_get_conversation_returns_existing() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    let first = conversations::create_or_get_conversation(
        &store,
        &scope,
        conversations::NewConversation {
            id: Some("conv-1".to_string()),
            active_agent_id: "router".to_string(),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    let second = conversations::create_or_get_conversation(
        &store,
        &scope,
        conversations::NewConversation {
            id: Some("conv-1".to_string()),
            active_agent_id: "worker".to_string(),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    assert_eq!(first, second);
    assert_eq!(second.active_agent_id, "router");
    Ok(())
}

#[tokio::test]
async fn test_active_agent_follows_handoff() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    conversations::create_conversation(
        &store,
        &scope,
        conversations::NewConversation {
            id: Some("conv-1".to_string()),
            active_agent_id: "router".to_string(),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    assert_eq!(
        conversations::get_active_agent_for_conversation(&store, &scope, "conv-1")
            .await
            .map_err(|e| e.to_string())?
            .as_deref(),
        Some("router")
    );
    conversations::set_active_agent_for_conversation(&store, &scope, "conv-1", "worker")
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(
        conversations::get_active_agent_for_conversation(&store, &scope, "conv-1")
            .await
            .map_err(|e| e.to_string())?
            .as_deref(),
        Some("worker")
    );
    assert!(conversations::get_active_agent_for_conversation(&store, &scope, "missing")
        .await
        .map_err(|e| e.to_string())?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn test_delete_message_removes_one_message() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    conversations::create_conversation(
        &store,
        &scope,
        conversations::NewConversation {
            id: Some("conv-1".to_string()),
            active_agent_id: "router".to_string(),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    for id in ["m-1", "m-2"] {
        conversations::create_message(&store, message(&scope, "conv-1", id, "hi"))
            .await
            .map_err(|e| e.to_string())?;
    }

    assert!(conversations::delete_message(&store, &scope, "m-1")
        .await
        .map_err(|e| e.to_string())?);
    assert!(!conversations::delete_message(&store, &scope, "m-1")
        .await
        .map_err(|e| e.to_string())?);
    assert!(!conversations::delete_message(&store, &ProjectScope::new("globex", "support"), "m-2")
        .await
        .map_err(|e| e.to_string())?);
    assert_eq!(
        conversations::count_messages_by_conversation(&store, &scope, "conv-1")
            .await
            .map_err(|e| e.to_string())?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_message_requires_conversation() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    let result =
        conversations::create_message(&store, message(&scope, "missing", "m-1", "hello")).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_history_returns_latest_messages_oldest_first() -> Result<(), String> {
    let store = InMemoryStore::new();
    let scope = ProjectScope::new("acme", "support");
    conversations::create_conversation(
        &store,
        &scope,
        conversations::NewConversation {
            id: Some("conv-1".to_string()),
            active_agent_id: "router".to_string(),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    for i in 0..5 {
        let mut msg = message(&scope, "conv-1", &format!("m-{i}"), &format!("text {i}"));
        if i == 3 {
            msg.visibility = MessageVisibility::Internal;
        }
        conversations::create_message(&store, msg)
            .await
            .map_err(|e| e.to_string())?;
    }

    let last_two = conversations::get_conversation_history(
        &store,
        &scope,
        "conv-1",
        conversations::HistoryOptions {
            limit: Some(2),
            visibility: None,
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    let ids: Vec<&str> = last_two.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m-3", "m-4"]);

    let user_facing = conversations::get_conversation_history(
        &store,
        &scope,
        "conv-1",
        conversations::HistoryOptions {
            limit: Some(2),
            visibility: Some(vec![MessageVisibility::UserFacing]),
        },
    )
    .await
    .map_err(|e| e.to_string())?;
    let ids: Vec<&str> = user_facing.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m-2", "m-4"]);

    assert!(conversations::delete_conversation(&store, &scope, "conv-1")
        .await
        .map_err(|e| e.to_string())?);
    assert_eq!(
        conversations::count_messages_by_conversation(&store, &scope, "conv-1")
            .await
            .map_err(|e| e.to_string())?,
        0
    );
    Ok(())
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn tenant_id_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Projects created under one tenant never show up for another.
    #[test]
    fn prop_projects_are_tenant_isolated(
        tenant_a in tenant_id_strategy(),
        tenant_b in tenant_id_strategy(),
        count in 1usize..6,
    ) {
        prop_assume!(tenant_a != tenant_b);
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = InMemoryStore::new();
            for i in 0..count {
                projects::create_project(&store, project(&tenant_a, &format!("p-{i}")))
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            let own = projects::list_projects(&store, &TenantScope::new(tenant_a.clone()))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let other = projects::list_projects(&store, &TenantScope::new(tenant_b.clone()))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(own.len(), count);
            prop_assert!(other.is_empty());
            Ok(())
        })?;
    }

    /// Paging visits every row exactly once.
    #[test]
    fn prop_pagination_covers_all_rows(total in 0usize..25, limit in 1u32..10) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = InMemoryStore::new();
            for i in 0..total {
                projects::create_project(&store, project("acme", &format!("p-{i:02}")))
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            let tenant = TenantScope::new("acme");
            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let pagination = Pagination::new(Some(page), Some(limit))
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let result = projects::list_projects_paginated(&store, &tenant, pagination)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(result.pagination.total, total as u64);
                if result.data.is_empty() {
                    break;
                }
                seen.extend(result.data.into_iter().map(|p| p.id));
                page += 1;
            }
            let expected: Vec<String> = (0..total).map(|i| format!("p-{i:02}")).collect();
            prop_assert_eq!(seen, expected);
            Ok(())
        })?;
    }
}
