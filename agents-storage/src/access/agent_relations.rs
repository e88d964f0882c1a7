//! Transfer and delegate relations between agents of a graph.

use agents_core::{
    AgentRelation, AgentRelationUpdate, AgentsError, AgentsResult, GraphScope, Paginated,
    Pagination, RelatedAgent, RelatedAgents, RelatedExternalAgent, StorageError, ValidationError,
};
use std::collections::HashMap;

use crate::access::{agents, external_agents};
use crate::repository;
use crate::store::Store;
use crate::table::{Filter, AGENT_RELATIONS};

fn key(scope: &GraphScope, relation_id: &str) -> Filter {
    Filter::graph(scope).with("id", relation_id)
}

/// A relation points at exactly one of an internal or an external agent.
pub fn validate_relation_target(
    target_agent_id: Option<&str>,
    external_agent_id: Option<&str>,
) -> Result<(), ValidationError> {
    match (target_agent_id, external_agent_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        (Some(_), Some(_)) => Err(ValidationError::InvalidValue {
            field: "target_agent_id".to_string(),
            reason: "only one of target_agent_id and external_agent_id may be set".to_string(),
        }),
        (None, None) => Err(ValidationError::RequiredFieldMissing {
            field: "target_agent_id or external_agent_id".to_string(),
        }),
    }
}

/// Check that every agent a relation names exists in the graph.
async fn ensure_endpoints_exist(
    store: &dyn Store,
    scope: &GraphScope,
    relation: &AgentRelation,
) -> AgentsResult<()> {
    validate_relation_target(
        relation.target_agent_id.as_deref(),
        relation.external_agent_id.as_deref(),
    )?;
    if !agents::agent_exists(store, scope, &relation.source_agent_id).await? {
        return Err(StorageError::MissingReference {
            entity: "Agent",
            id: relation.source_agent_id.clone(),
        }
        .into());
    }
    if let Some(target) = relation.target_agent_id.as_deref() {
        if !agents::agent_exists(store, scope, target).await? {
            return Err(StorageError::MissingReference {
                entity: "Agent",
                id: target.to_string(),
            }
            .into());
        }
    }
    if let Some(external) = relation.external_agent_id.as_deref() {
        if !external_agents::external_agent_exists(store, scope, external).await? {
            return Err(StorageError::MissingReference {
                entity: "ExternalAgent",
                id: external.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

pub async fn get_agent_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
) -> AgentsResult<Option<AgentRelation>> {
    repository::get(store, &key(scope, relation_id)).await
}

pub async fn list_agent_relations(
    store: &dyn Store,
    scope: &GraphScope,
) -> AgentsResult<Vec<AgentRelation>> {
    repository::list(store, &Filter::graph(scope)).await
}

/// Page through relations, optionally only those leaving one agent.
pub async fn list_agent_relations_paginated(
    store: &dyn Store,
    scope: &GraphScope,
    pagination: Pagination,
    source_agent_id: Option<&str>,
) -> AgentsResult<Paginated<AgentRelation>> {
    let mut filter = Filter::graph(scope);
    if let Some(source) = source_agent_id {
        filter = filter.with("source_agent_id", source);
    }
    repository::list_paginated(store, &filter, pagination).await
}

pub async fn list_relations_by_source(
    store: &dyn Store,
    scope: &GraphScope,
    source_agent_id: &str,
) -> AgentsResult<Vec<AgentRelation>> {
    repository::list(
        store,
        &Filter::graph(scope).with("source_agent_id", source_agent_id),
    )
    .await
}

pub async fn create_agent_relation(
    store: &dyn Store,
    relation: AgentRelation,
) -> AgentsResult<AgentRelation> {
    let scope = GraphScope::new(
        relation.tenant_id.clone(),
        relation.project_id.clone(),
        relation.graph_id.clone(),
    );
    ensure_endpoints_exist(store, &scope, &relation).await?;
    repository::create(store, relation).await
}

pub async fn upsert_agent_relation(
    store: &dyn Store,
    relation: AgentRelation,
) -> AgentsResult<AgentRelation> {
    let scope = GraphScope::new(
        relation.tenant_id.clone(),
        relation.project_id.clone(),
        relation.graph_id.clone(),
    );
    ensure_endpoints_exist(store, &scope, &relation).await?;
    repository::upsert(store, relation).await
}

pub async fn update_agent_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
    update: AgentRelationUpdate,
) -> AgentsResult<AgentRelation> {
    let mut relation = get_agent_relation(store, scope, relation_id)
        .await?
        .ok_or_else(|| AgentsError::not_found("AgentRelation", relation_id))?;
    update.retarget(&mut relation);
    ensure_endpoints_exist(store, scope, &relation).await?;
    repository::update(store, &key(scope, relation_id), move |stored: &mut AgentRelation| {
        *stored = relation
    })
    .await
}

pub async fn delete_agent_relation(
    store: &dyn Store,
    scope: &GraphScope,
    relation_id: &str,
) -> AgentsResult<bool> {
    Ok(repository::delete::<AgentRelation>(store, &key(scope, relation_id)).await? > 0)
}

pub async fn delete_agent_relations_by_graph(store: &dyn Store, scope: &GraphScope) -> AgentsResult<u64> {
    store.delete(&AGENT_RELATIONS, &Filter::graph(scope)).await
}

/// Remove every relation leaving or entering an internal agent.
pub async fn delete_relations_for_agent(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: &str,
) -> AgentsResult<u64> {
    let graph = Filter::graph(scope);
    let outgoing = store
        .delete(&AGENT_RELATIONS, &graph.clone().with("source_agent_id", agent_id))
        .await?;
    let incoming = store
        .delete(&AGENT_RELATIONS, &graph.with("target_agent_id", agent_id))
        .await?;
    Ok(outgoing + incoming)
}

/// Remove every relation pointing at an external agent.
pub async fn delete_relations_to_external_agent(
    store: &dyn Store,
    scope: &GraphScope,
    external_agent_id: &str,
) -> AgentsResult<u64> {
    store
        .delete(
            &AGENT_RELATIONS,
            &Filter::graph(scope).with("external_agent_id", external_agent_id),
        )
        .await
}

/// Agents reachable from `agent_id`, resolved to their names.
///
/// Relations whose target no longer exists are skipped.
pub async fn get_related_agents_for_graph(
    store: &dyn Store,
    scope: &GraphScope,
    agent_id: &str,
) -> AgentsResult<RelatedAgents> {
    let relations = list_relations_by_source(store, scope, agent_id).await?;
    if relations.is_empty() {
        return Ok(RelatedAgents::default());
    }

    let internal: HashMap<_, _> = agents::list_agents(store, scope)
        .await?
        .into_iter()
        .map(|agent| (agent.id.clone(), agent))
        .collect();
    let external: HashMap<_, _> = external_agents::list_external_agents(store, scope)
        .await?
        .into_iter()
        .map(|agent| (agent.id.clone(), agent))
        .collect();

    let mut related = RelatedAgents::default();
    for relation in relations {
        if let Some(agent) = relation.target_agent_id.as_ref().and_then(|id| internal.get(id)) {
            related.internal_relations.push(RelatedAgent {
                id: agent.id.clone(),
                name: agent.name.clone(),
                description: agent.description.clone(),
                relation_type: relation.relation_type,
            });
        } else if let Some(agent) = relation
            .external_agent_id
            .as_ref()
            .and_then(|id| external.get(id))
        {
            related.external_relations.push(RelatedExternalAgent {
                id: agent.id.clone(),
                name: agent.name.clone(),
                description: agent.description.clone(),
                base_url: agent.base_url.clone(),
                relation_type: relation.relation_type,
            });
        }
    }
    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_target_rules() {
        assert!(validate_relation_target(Some("billing"), None).is_ok());
        assert!(validate_relation_target(None, Some("partner")).is_ok());
        assert!(validate_relation_target(None, None).is_err());
        assert!(validate_relation_target(Some("billing"), Some("partner")).is_err());
    }
}
