//! Agent graphs.

use agents_core::{
    AgentGraph, AgentGraphUpdate, AgentsResult, GraphAgents, GraphScope, Paginated, Pagination,
    ProjectScope,
};
use tracing::debug;

use crate::repository;
use crate::store::Store;
use crate::table::{
    Filter, AGENTS, AGENT_ARTIFACT_COMPONENTS, AGENT_DATA_COMPONENTS, AGENT_GRAPHS,
    AGENT_RELATIONS, AGENT_TOOL_RELATIONS, API_KEYS, EXTERNAL_AGENTS,
};

fn key(scope: &GraphScope) -> Filter {
    Filter::project(&scope.project()).with("id", scope.graph_id.as_str())
}

pub async fn get_agent_graph(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Option<AgentGraph>> {
    repository::get(store, &key(scope)).await
}

pub async fn agent_graph_exists(store: &dyn Store, scope: &GraphScope) -> AgentsResult<bool> {
    Ok(store.count(&AGENT_GRAPHS, &key(scope)).await? > 0)
}

pub async fn list_agent_graphs(
    store: &dyn Store,
    project: &ProjectScope,
) -> AgentsResult<Vec<AgentGraph>> {
    repository::list(store, &Filter::project(project)).await
}

pub async fn list_agent_graphs_paginated(
    store: &dyn Store,
    project: &ProjectScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<AgentGraph>> {
    repository::list_paginated(store, &Filter::project(project), pagination).await
}

pub async fn create_agent_graph(store: &dyn Store, graph: AgentGraph) -> AgentsResult<AgentGraph> {
    repository::create(store, graph).await
}

pub async fn upsert_agent_graph(store: &dyn Store, graph: AgentGraph) -> AgentsResult<AgentGraph> {
    repository::upsert(store, graph).await
}

pub async fn update_agent_graph(
    store: &dyn Store,
    scope: &GraphScope,
    update: AgentGraphUpdate,
) -> AgentsResult<AgentGraph> {
    repository::update(store, &key(scope), |graph: &mut AgentGraph| update.apply(graph)).await
}

/// Point the graph at its entry agent, or clear it.
pub async fn set_default_agent(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: Option<&str>,
) -> AgentsResult<AgentGraph> {
    let agent_id = agent_id.map(str::to_string);
    repository::update(store, &key(scope), |graph: &mut AgentGraph| {
        graph.default_agent_id = agent_id
    })
    .await
}

/// Set or clear the context config the graph resolves before a run.
pub async fn set_context_config(
    store: &dyn Store,
    scope: &GraphScope,
    context_config_id: Option<&str>,
) -> AgentsResult<AgentGraph> {
    let context_config_id = context_config_id.map(str::to_string);
    repository::update(store, &key(scope), |graph: &mut AgentGraph| {
        graph.context_config_id = context_config_id
    })
    .await
}

/// Internal and external agents of a graph.
pub async fn get_graph_agents(store: &dyn Store, scope: &GraphScope) -> AgentsResult<GraphAgents> {
    let filter = Filter::graph(scope);
    Ok(GraphAgents {
        internal: repository::list(store, &filter).await?,
        external: repository::list(store, &filter).await?,
    })
}

/// Delete a graph with its agents, relations, associations and API keys.
/// Returns `false` when the graph did not exist.
pub async fn delete_agent_graph(store: &dyn Store, scope: &GraphScope) -> AgentsResult<bool> {
    if !agent_graph_exists(store, scope).await? {
        return Ok(false);
    }
    let scoped = Filter::graph(scope);
    for table in [
        &AGENT_RELATIONS,
        &AGENT_TOOL_RELATIONS,
        &AGENT_DATA_COMPONENTS,
        &AGENT_ARTIFACT_COMPONENTS,
        &EXTERNAL_AGENTS,
        &AGENTS,
        &API_KEYS,
    ] {
        let removed = store.delete(table, &scoped).await?;
        if removed > 0 {
            debug!(table = table.name, removed, graph = %scope, "Cascaded graph delete");
        }
    }
    Ok(store.delete(&AGENT_GRAPHS, &key(scope)).await? > 0)
}
