//! Data components and their association with agents.

use agents_core::{
    generate_id, AgentDataComponent, AgentScope, AgentsResult, DataComponent, DataComponentUpdate,
    GraphScope, Paginated, Pagination, ProjectScope, StorageError,
};
use chrono::Utc;

use crate::access::agents;
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, AGENT_DATA_COMPONENTS};

fn key(scope: &ProjectScope, component_id: &str) -> Filter {
    Filter::project(scope).with("id", component_id)
}

fn association(agent: &AgentScope, component_id: &str) -> Filter {
    Filter::agent(agent).with("data_component_id", component_id)
}

pub async fn get_data_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<Option<DataComponent>> {
    repository::get(store, &key(scope, component_id)).await
}

pub async fn list_data_components(
    store: &dyn Store,
    scope: &ProjectScope,
) -> AgentsResult<Vec<DataComponent>> {
    repository::list(store, &Filter::project(scope)).await
}

pub async fn list_data_components_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<DataComponent>> {
    repository::list_paginated(store, &Filter::project(scope), pagination).await
}

pub async fn create_data_component(
    store: &dyn Store,
    component: DataComponent,
) -> AgentsResult<DataComponent> {
    repository::create(store, component).await
}

pub async fn upsert_data_component(
    store: &dyn Store,
    component: DataComponent,
) -> AgentsResult<DataComponent> {
    repository::upsert(store, component).await
}

pub async fn update_data_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
    update: DataComponentUpdate,
) -> AgentsResult<DataComponent> {
    repository::update(store, &key(scope, component_id), |component: &mut DataComponent| {
        update.apply(component)
    })
    .await
}

/// Delete a data component and its agent associations.
pub async fn delete_data_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<bool> {
    store
        .delete(
            &AGENT_DATA_COMPONENTS,
            &Filter::project(scope).with("data_component_id", component_id),
        )
        .await?;
    Ok(repository::delete::<DataComponent>(store, &key(scope, component_id)).await? > 0)
}

/// Associate a data component with an agent. Associating twice returns the
/// existing association.
pub async fn associate_data_component_with_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<AgentDataComponent> {
    if let Some(existing) = repository::get(store, &association(agent, component_id)).await? {
        return Ok(existing);
    }
    if !agents::agent_exists(store, &agent.graph(), &agent.agent_id).await? {
        return Err(StorageError::MissingReference {
            entity: "Agent",
            id: agent.agent_id.clone(),
        }
        .into());
    }
    if get_data_component(store, &agent.project(), component_id).await?.is_none() {
        return Err(StorageError::MissingReference {
            entity: "DataComponent",
            id: component_id.to_string(),
        }
        .into());
    }
    repository::create(
        store,
        AgentDataComponent {
            tenant_id: agent.tenant_id.clone(),
            project_id: agent.project_id.clone(),
            graph_id: agent.graph_id.clone(),
            id: generate_id(),
            agent_id: agent.agent_id.clone(),
            data_component_id: component_id.to_string(),
            created_at: Utc::now(),
        },
    )
    .await
}

pub async fn remove_data_component_from_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<bool> {
    Ok(store
        .delete(&AGENT_DATA_COMPONENTS, &association(agent, component_id))
        .await?
        > 0)
}

pub async fn is_data_component_associated_with_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<bool> {
    Ok(store
        .count(&AGENT_DATA_COMPONENTS, &association(agent, component_id))
        .await?
        > 0)
}

/// Data components associated with an agent, in association order.
pub async fn get_data_components_for_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<Vec<DataComponent>> {
    let associations: Vec<AgentDataComponent> =
        repository::list(store, &Filter::agent(agent)).await?;
    let mut components = Vec::with_capacity(associations.len());
    for association in associations {
        if let Some(component) =
            get_data_component(store, &agent.project(), &association.data_component_id).await?
        {
            components.push(component);
        }
    }
    Ok(components)
}

/// Every association of a data component across the project's graphs.
pub async fn get_agents_using_data_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<Vec<AgentDataComponent>> {
    repository::list(
        store,
        &Filter::project(scope).with("data_component_id", component_id),
    )
    .await
}

pub async fn list_data_component_associations(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Vec<AgentDataComponent>> {
    repository::list(store, &Filter::graph(scope)).await
}

pub async fn delete_data_component_associations_by_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<u64> {
    store.delete(&AGENT_DATA_COMPONENTS, &Filter::agent(agent)).await
}
