//! Artifact components and their association with agents.

use agents_core::{
    generate_id, AgentArtifactComponent, AgentScope, AgentsResult, ArtifactComponent, ArtifactComponentUpdate,
    GraphScope, Paginated, Pagination, ProjectScope, StorageError,
};
use chrono::Utc;

use crate::access::agents;
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, AGENT_ARTIFACT_COMPONENTS};

fn key(scope: &ProjectScope, component_id: &str) -> Filter {
    Filter::project(scope).with("id", component_id)
}

fn association(agent: &AgentScope, component_id: &str) -> Filter {
    Filter::agent(agent).with("artifact_component_id", component_id)
}

pub async fn get_artifact_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<Option<ArtifactComponent>> {
    repository::get(store, &key(scope, component_id)).await
}

pub async fn list_artifact_components(
    store: &dyn Store,
    scope: &ProjectScope,
) -> AgentsResult<Vec<ArtifactComponent>> {
    repository::list(store, &Filter::project(scope)).await
}

pub async fn list_artifact_components_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<ArtifactComponent>> {
    repository::list_paginated(store, &Filter::project(scope), pagination).await
}

pub async fn create_artifact_component(
    store: &dyn Store,
    component: ArtifactComponent,
) -> AgentsResult<ArtifactComponent> {
    repository::create(store, component).await
}

pub async fn upsert_artifact_component(
    store: &dyn Store,
    component: ArtifactComponent,
) -> AgentsResult<ArtifactComponent> {
    repository::upsert(store, component).await
}

pub async fn update_artifact_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
    update: ArtifactComponentUpdate,
) -> AgentsResult<ArtifactComponent> {
    repository::update(store, &key(scope, component_id), |component: &mut ArtifactComponent| {
        update.apply(component)
    })
    .await
}

/// Delete a artifact component and its agent associations.
pub async fn delete_artifact_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<bool> {
    store
        .delete(
            &AGENT_ARTIFACT_COMPONENTS,
            &Filter::project(scope).with("artifact_component_id", component_id),
        )
        .await?;
    Ok(repository::delete::<ArtifactComponent>(store, &key(scope, component_id)).await? > 0)
}

/// Associate a artifact component with an agent. Associating twice returns the
/// existing association.
pub async fn associate_artifact_component_with_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<AgentArtifactComponent> {
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
    if get_artifact_component(store, &agent.project(), component_id).await?.is_none() {
        return Err(StorageError::MissingReference {
            entity: "ArtifactComponent",
            id: component_id.to_string(),
        }
        .into());
    }
    repository::create(
        store,
        AgentArtifactComponent {
            tenant_id: agent.tenant_id.clone(),
            project_id: agent.project_id.clone(),
            graph_id: agent.graph_id.clone(),
            id: generate_id(),
            agent_id: agent.agent_id.clone(),
            artifact_component_id: component_id.to_string(),
            created_at: Utc::now(),
        },
    )
    .await
}

pub async fn remove_artifact_component_from_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<bool> {
    Ok(store
        .delete(&AGENT_ARTIFACT_COMPONENTS, &association(agent, component_id))
        .await?
        > 0)
}

pub async fn is_artifact_component_associated_with_agent(
    store: &dyn Store,
    agent: &AgentScope,
    component_id: &str,
) -> AgentsResult<bool> {
    Ok(store
        .count(&AGENT_ARTIFACT_COMPONENTS, &association(agent, component_id))
        .await?
        > 0)
}

/// Artifact components associated with an agent, in association order.
pub async fn get_artifact_components_for_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<Vec<ArtifactComponent>> {
    let associations: Vec<AgentArtifactComponent> =
        repository::list(store, &Filter::agent(agent)).await?;
    let mut components = Vec::with_capacity(associations.len());
    for association in associations {
        if let Some(component) =
            get_artifact_component(store, &agent.project(), &association.artifact_component_id).await?
        {
            components.push(component);
        }
    }
    Ok(components)
}

/// Every association of a artifact component across the project's graphs.
pub async fn get_agents_using_artifact_component(
    store: &dyn Store,
    scope: &ProjectScope,
    component_id: &str,
) -> AgentsResult<Vec<AgentArtifactComponent>> {
    repository::list(
        store,
        &Filter::project(scope).with("artifact_component_id", component_id),
    )
    .await
}

pub async fn list_artifact_component_associations(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Vec<AgentArtifactComponent>> {
    repository::list(store, &Filter::graph(scope)).await
}

pub async fn delete_artifact_component_associations_by_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<u64> {
    store.delete(&AGENT_ARTIFACT_COMPONENTS, &Filter::agent(agent)).await
}

/// Number of artifact components an agent can produce.
pub async fn count_artifact_components_for_agent(
    store: &dyn Store,
    agent: &AgentScope,
) -> AgentsResult<u64> {
    store
        .count(&AGENT_ARTIFACT_COMPONENTS, &Filter::agent(agent))
        .await
}

/// True when any agent of the graph can produce artifacts.
pub async fn graph_has_artifact_components(store: &dyn Store, scope: &GraphScope) -> AgentsResult<bool> {
    Ok(store
        .count(&AGENT_ARTIFACT_COMPONENTS, &Filter::graph(scope))
        .await?
        > 0)
}
