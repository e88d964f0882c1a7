//! Context configs.

use agents_core::{
    AgentGraph, AgentsResult, ContextConfig, ContextConfigUpdate, GraphScope, Paginated,
    Pagination, ProjectScope,
};

use crate::access::agent_graphs;
use crate::repository;
use crate::store::Store;
use crate::table::Filter;

fn key(scope: &ProjectScope, config_id: &str) -> Filter {
    Filter::project(scope).with("id", config_id)
}

pub async fn get_context_config(
    store: &dyn Store,
    scope: &ProjectScope,
    config_id: &str,
) -> AgentsResult<Option<ContextConfig>> {
    repository::get(store, &key(scope, config_id)).await
}

pub async fn list_context_configs(
    store: &dyn Store,
    scope: &ProjectScope,
) -> AgentsResult<Vec<ContextConfig>> {
    repository::list(store, &Filter::project(scope)).await
}

pub async fn list_context_configs_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<ContextConfig>> {
    repository::list_paginated(store, &Filter::project(scope), pagination).await
}

pub async fn create_context_config(
    store: &dyn Store,
    config: ContextConfig,
) -> AgentsResult<ContextConfig> {
    repository::create(store, config).await
}

pub async fn upsert_context_config(
    store: &dyn Store,
    config: ContextConfig,
) -> AgentsResult<ContextConfig> {
    repository::upsert(store, config).await
}

pub async fn update_context_config(
    store: &dyn Store,
    scope: &ProjectScope,
    config_id: &str,
    update: ContextConfigUpdate,
) -> AgentsResult<ContextConfig> {
    repository::update(store, &key(scope, config_id), |config: &mut ContextConfig| {
        update.apply(config)
    })
    .await
}

/// Delete a context config. Graphs using it fall back to no context config.
pub async fn delete_context_config(
    store: &dyn Store,
    scope: &ProjectScope,
    config_id: &str,
) -> AgentsResult<bool> {
    let users: Vec<AgentGraph> = repository::list(
        store,
        &Filter::project(scope).with("context_config_id", config_id),
    )
    .await?;
    for graph in users {
        agent_graphs::set_context_config(store, &graph.scope(), None).await?;
    }
    Ok(repository::delete::<ContextConfig>(store, &key(scope, config_id)).await? > 0)
}

/// True when the graph points at a context config that exists.
pub async fn has_context_config(store: &dyn Store, scope: &GraphScope) -> AgentsResult<bool> {
    let Some(graph) = agent_graphs::get_agent_graph(store, scope).await? else {
        return Ok(false);
    };
    match graph.context_config_id.as_deref() {
        Some(config_id) => Ok(get_context_config(store, &scope.project(), config_id)
            .await?
            .is_some()),
        None => Ok(false),
    }
}
