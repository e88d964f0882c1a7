//! External agents.

use agents_core::{AgentsResult, ExternalAgent, ExternalAgentUpdate, GraphScope, Paginated, Pagination};

use crate::access::agent_relations;
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, EXTERNAL_AGENTS};

fn key(scope: &GraphScope, external_agent_id: &str) -> Filter {
    Filter::graph(scope).with("id", external_agent_id)
}

pub async fn get_external_agent(
    store: &dyn Store,
    scope: &GraphScope,
    external_agent_id: &str,
) -> AgentsResult<Option<ExternalAgent>> {
    repository::get(store, &key(scope, external_agent_id)).await
}

pub async fn external_agent_exists(
    store: &dyn Store,
    scope: &GraphScope,
    external_agent_id: &str,
) -> AgentsResult<bool> {
    Ok(store
        .count(&EXTERNAL_AGENTS, &key(scope, external_agent_id))
        .await?
        > 0)
}

pub async fn list_external_agents(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Vec<ExternalAgent>> {
    repository::list(store, &Filter::graph(scope)).await
}

pub async fn list_external_agents_paginated(
    store: &dyn Store,
    scope: &GraphScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<ExternalAgent>> {
    repository::list_paginated(store, &Filter::graph(scope), pagination).await
}

pub async fn create_external_agent(
    store: &dyn Store,
    agent: ExternalAgent,
) -> AgentsResult<ExternalAgent> {
    repository::create(store, agent).await
}

pub async fn upsert_external_agent(
    store: &dyn Store,
    agent: ExternalAgent,
) -> AgentsResult<ExternalAgent> {
    repository::upsert(store, agent).await
}

pub async fn update_external_agent(
    store: &dyn Store,
    scope: &GraphScope,
    external_agent_id: &str,
    update: ExternalAgentUpdate,
) -> AgentsResult<ExternalAgent> {
    repository::update(
        store,
        &key(scope, external_agent_id),
        |agent: &mut ExternalAgent| update.apply(agent),
    )
    .await
}

/// Delete an external agent and every relation pointing at it.
pub async fn delete_external_agent(
    store: &dyn Store,
    scope: &GraphScope,
    external_agent_id: &str,
) -> AgentsResult<bool> {
    agent_relations::delete_relations_to_external_agent(store, scope, external_agent_id).await?;
    Ok(repository::delete::<ExternalAgent>(store, &key(scope, external_agent_id)).await? > 0)
}
