//! MCP tools and the agent-to-tool grants.

use agents_core::{
    generate_id, AgentScope, AgentTool, AgentToolRelation, AgentToolRelationUpdate, AgentsError,
    AgentsResult, GraphScope, Headers, McpToolDefinition, Paginated, Pagination, ProjectScope,
    StorageError, Tool, ToolStatus, ToolUpdate,
};
use chrono::Utc;
use std::collections::HashMap;

use crate::access::agents;
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, AGENT_TOOL_RELATIONS};

fn key(scope: &ProjectScope, tool_id: &str) -> Filter {
    Filter::project(scope).with("id", tool_id)
}

/// Result of a tool server health probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolHealth {
    pub status: ToolStatus,
    pub last_error: Option<String>,
    /// Tools advertised by the server, when the probe listed them.
    pub available_tools: Option<Vec<McpToolDefinition>>,
}

// ============================================================================
// TOOLS
// ============================================================================

pub async fn get_tool(store: &dyn Store, scope: &ProjectScope, tool_id: &str) -> AgentsResult<Option<Tool>> {
    repository::get(store, &key(scope, tool_id)).await
}

pub async fn list_tools(store: &dyn Store, scope: &ProjectScope) -> AgentsResult<Vec<Tool>> {
    repository::list(store, &Filter::project(scope)).await
}

/// Page through tools, optionally only those with a given health status.
pub async fn list_tools_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
    status: Option<ToolStatus>,
) -> AgentsResult<Paginated<Tool>> {
    let mut filter = Filter::project(scope);
    if let Some(status) = status {
        filter = filter.with("status", status.as_str());
    }
    repository::list_paginated(store, &filter, pagination).await
}

pub async fn create_tool(store: &dyn Store, tool: Tool) -> AgentsResult<Tool> {
    repository::create(store, tool).await
}

/// Create or replace a tool's definition. Health fields of an existing tool
/// are kept.
pub async fn upsert_tool(store: &dyn Store, mut tool: Tool) -> AgentsResult<Tool> {
    let scope = ProjectScope::new(tool.tenant_id.clone(), tool.project_id.clone());
    if let Some(existing) = get_tool(store, &scope, &tool.id).await? {
        tool.status = existing.status;
        tool.last_health_check = existing.last_health_check;
        tool.last_error = existing.last_error;
        tool.available_tools = existing.available_tools;
        tool.last_tools_sync = existing.last_tools_sync;
    }
    repository::upsert(store, tool).await
}

pub async fn update_tool(
    store: &dyn Store,
    scope: &ProjectScope,
    tool_id: &str,
    update: ToolUpdate,
) -> AgentsResult<Tool> {
    repository::update(store, &key(scope, tool_id), |tool: &mut Tool| update.apply(tool)).await
}

/// Record the outcome of a health check.
pub async fn update_tool_status(
    store: &dyn Store,
    scope: &ProjectScope,
    tool_id: &str,
    health: ToolHealth,
) -> AgentsResult<Tool> {
    let now = Utc::now();
    repository::update(store, &key(scope, tool_id), move |tool: &mut Tool| {
        tool.status = health.status;
        tool.last_health_check = Some(now);
        tool.last_error = health.last_error;
        if let Some(available) = health.available_tools {
            tool.available_tools = Some(available);
            tool.last_tools_sync = Some(now);
        }
    })
    .await
}

/// Delete a tool and every grant of it to an agent.
pub async fn delete_tool(store: &dyn Store, scope: &ProjectScope, tool_id: &str) -> AgentsResult<bool> {
    store
        .delete(
            &AGENT_TOOL_RELATIONS,
            &Filter::project(scope).with("tool_id", tool_id),
        )
        .await?;
    Ok(repository::delete::<Tool>(store, &key(scope, tool_id)).await? > 0)
}

// ============================================================================
// AGENT TOOL RELATIONS
// ============================================================================

fn relation_key(scope: &GraphScope, relation_id: &str) -> Filter {
    Filter::graph(scope).with("id", relation_id)
}

async fn ensure_grant_endpoints(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: &str,
    tool_id: &str,
) -> AgentsResult<()> {
    if !agents::agent_exists(store, scope, agent_id).await? {
        return Err(StorageError::MissingReference {
            entity: "Agent",
            id: agent_id.to_string(),
        }
        .into());
    }
    if get_tool(store, &scope.project(), tool_id).await?.is_none() {
        return Err(StorageError::MissingReference {
            entity: "Tool",
            id: tool_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub async fn get_agent_tool_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
) -> AgentsResult<Option<AgentToolRelation>> {
    repository::get(store, &relation_key(scope, relation_id)).await
}

pub async fn list_agent_tool_relations(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Vec<AgentToolRelation>> {
    repository::list(store, &Filter::graph(scope)).await
}

/// Page through grants, optionally only those of one agent.
pub async fn list_agent_tool_relations_paginated(
    store: &dyn Store,
    scope: &GraphScope,
    pagination: Pagination,
    agent_id: Option<&str>,
) -> AgentsResult<Paginated<AgentToolRelation>> {
    let mut filter = Filter::graph(scope);
    if let Some(agent_id) = agent_id {
        filter = filter.with("agent_id", agent_id);
    }
    repository::list_paginated(store, &filter, pagination).await
}

pub async fn create_agent_tool_relation(
    store: &dyn Store,
    relation: AgentToolRelation,
) -> AgentsResult<AgentToolRelation> {
    let scope = GraphScope::new(
        relation.tenant_id.clone(),
        relation.project_id.clone(),
        relation.graph_id.clone(),
    );
    ensure_grant_endpoints(store, &scope, &relation.agent_id, &relation.tool_id).await?;
    repository::create(store, relation).await
}

pub async fn update_agent_tool_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
    update: AgentToolRelationUpdate,
) -> AgentsResult<AgentToolRelation> {
    if let Some(tool_id) = update.tool_id.as_deref() {
        if get_tool(store, &scope.project(), tool_id).await?.is_none() {
            return Err(StorageError::MissingReference {
                entity: "Tool",
                id: tool_id.to_string(),
            }
            .into());
        }
    }
    repository::update(
        store,
        &relation_key(scope, relation_id),
        |relation: &mut AgentToolRelation| update.apply(relation),
    )
    .await
}

pub async fn delete_agent_tool_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
) -> AgentsResult<bool> {
    Ok(repository::delete::<AgentToolRelation>(store, &relation_key(scope, relation_id)).await? > 0)
}

/// Grant a tool to an agent.
pub async fn add_tool_to_agent(
    store: &dyn Store,
    agent: &AgentScope,
    tool_id: &str,
    selected_tools: Option<Vec<String>>,
    headers: Option<Headers>,
) -> AgentsResult<AgentToolRelation> {
    let now = Utc::now();
    create_agent_tool_relation(
        store,
        AgentToolRelation {
            tenant_id: agent.tenant_id.clone(),
            project_id: agent.project_id.clone(),
            graph_id: agent.graph_id.clone(),
            id: generate_id(),
            agent_id: agent.agent_id.clone(),
            tool_id: tool_id.to_string(),
            selected_tools,
            headers,
            created_at: now,
            updated_at: now,
        },
    )
    .await
}

/// Revoke every grant of a tool to an agent.
pub async fn remove_tool_from_agent(
    store: &dyn Store,
    agent: &AgentScope,
    tool_id: &str,
) -> AgentsResult<bool> {
    let removed = store
        .delete(
            &AGENT_TOOL_RELATIONS,
            &Filter::agent(agent).with("tool_id", tool_id),
        )
        .await?;
    Ok(removed > 0)
}

/// Grant a tool to an agent, or update the existing grant in place.
pub async fn upsert_agent_tool_relation(
    store: &dyn Store,
    agent: &AgentScope,
    tool_id: &str,
    selected_tools: Option<Vec<String>>,
    headers: Option<Headers>,
) -> AgentsResult<AgentToolRelation> {
    let existing: Option<AgentToolRelation> =
        repository::get(store, &Filter::agent(agent).with("tool_id", tool_id)).await?;
    match existing {
        Some(relation) => {
            repository::update(
                store,
                &relation_key(&agent.graph(), &relation.id),
                move |stored: &mut AgentToolRelation| {
                    stored.selected_tools = selected_tools;
                    stored.headers = headers;
                },
            )
            .await
        }
        None => add_tool_to_agent(store, agent, tool_id, selected_tools, headers).await,
    }
}

/// Tools granted to an agent, joined with the grant.
pub async fn get_tools_for_agent(store: &dyn Store, agent: &AgentScope) -> AgentsResult<Vec<AgentTool>> {
    let relations: Vec<AgentToolRelation> =
        repository::list(store, &Filter::agent(agent)).await?;
    if relations.is_empty() {
        return Ok(Vec::new());
    }
    let tools: HashMap<_, _> = list_tools(store, &agent.project())
        .await?
        .into_iter()
        .map(|tool| (tool.id.clone(), tool))
        .collect();
    relations
        .into_iter()
        .map(|relation| {
            let tool = tools
                .get(&relation.tool_id)
                .cloned()
                .ok_or_else(|| AgentsError::not_found("Tool", relation.tool_id.clone()))?;
            Ok(AgentTool { relation, tool })
        })
        .collect()
}

pub async fn delete_agent_tool_relations_by_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<u64> {
    store.delete(&AGENT_TOOL_RELATIONS, &Filter::agent(agent)).await
}
