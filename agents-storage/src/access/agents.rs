//! Internal agents.

use agents_core::{Agent, AgentUpdate, AgentsResult, GraphScope, Paginated, Pagination};

use crate::access::{agent_relations, artifact_components, data_components, tools};
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, AGENTS};

fn key(scope: &GraphScope, agent_id: &str) -> Filter {
    Filter::graph(scope).with("id", agent_id)
}

pub async fn get_agent(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: &str,
) -> AgentsResult<Option<Agent>> {
    repository::get(store, &key(scope, agent_id)).await
}

pub async fn agent_exists(store: &dyn Store, scope: &GraphScope, agent_id: &str) -> AgentsResult<bool> {
    Ok(store.count(&AGENTS, &key(scope, agent_id)).await? > 0)
}

pub async fn list_agents(store: &dyn Store, scope: &GraphScope) -> AgentsResult<Vec<Agent>> {
    repository::list(store, &Filter::graph(scope)).await
}

pub async fn list_agents_paginated(
    store: &dyn Store,
    scope: &GraphScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<Agent>> {
    repository::list_paginated(store, &Filter::graph(scope), pagination).await
}

pub async fn create_agent(store: &dyn Store, agent: Agent) -> AgentsResult<Agent> {
    repository::create(store, agent).await
}

pub async fn upsert_agent(store: &dyn Store, agent: Agent) -> AgentsResult<Agent> {
    repository::upsert(store, agent).await
}

pub async fn update_agent(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: &str,
    update: AgentUpdate,
) -> AgentsResult<Agent> {
    repository::update(store, &key(scope, agent_id), |agent: &mut Agent| update.apply(agent)).await
}

/// Delete an agent together with its relations, tool grants and component
/// associations.
pub async fn delete_agent(store: &dyn Store, scope: &GraphScope, agent_id: &str) -> AgentsResult<bool> {
    if !agent_exists(store, scope, agent_id).await? {
        return Ok(false);
    }
    let agent_scope = scope.agent(agent_id);
    agent_relations::delete_relations_for_agent(store, scope, agent_id).await?;
    tools::delete_agent_tool_relations_by_agent(store, &agent_scope).await?;
    data_components::delete_data_component_associations_by_agent(store, &agent_scope).await?;
    artifact_components::delete_artifact_component_associations_by_agent(store, &agent_scope)
        .await?;
    Ok(repository::delete::<Agent>(store, &key(scope, agent_id)).await? > 0)
}
