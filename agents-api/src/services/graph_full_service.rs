//! Full Graph Service
//!
//! Writes and reads a whole graph (agents, relations, tool grants, component
//! associations and the project resources they use) in one operation.
//!
//! Operations are sequences of awaited store calls without a transaction.
//! Failing to write the graph row or an agent row aborts the operation.
//! Failing to wire a single relation, tool grant or component association
//! is logged, counted and reported in [`GraphOutcome::failures`] while the
//! remaining wiring continues.

use std::collections::{BTreeMap, BTreeSet};

use agents_core::{
    AgentDefinition, AgentRelation, ArtifactComponentDefinition, ContextConfigDefinition,
    CredentialReferenceDefinition, DataComponentDefinition, ExternalAgentDefinition,
    FullGraphDefinition, GraphScope, InternalAgentDefinition, ProjectCatalog, ProjectScope,
    RelationType, Timestamp, ToolDefinition,
};
use agents_storage::access::{
    agent_graphs, agent_relations, agents, artifact_components, context_configs,
    credential_references, data_components, external_agents, projects, tools,
};
use agents_storage::Store;
use chrono::Utc;
use tracing::{debug, error, info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics::with_metrics;

// ============================================================================
// OUTCOME
// ============================================================================

/// Kind of per-agent wiring that can fail without aborting the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringKind {
    AgentRelation,
    ToolRelation,
    DataComponent,
    ArtifactComponent,
}

impl WiringKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WiringKind::AgentRelation => "agent_relation",
            WiringKind::ToolRelation => "tool_relation",
            WiringKind::DataComponent => "data_component",
            WiringKind::ArtifactComponent => "artifact_component",
        }
    }
}

/// One piece of wiring that could not be written.
#[derive(Debug, Clone, PartialEq)]
pub struct WiringFailure {
    pub kind: WiringKind,
    pub agent_id: String,
    pub target_id: String,
    pub reason: String,
}

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOutcome {
    /// The graph as read back from storage.
    pub graph: FullGraphDefinition,
    /// True when the graph did not exist before.
    pub created: bool,
    pub failures: Vec<WiringFailure>,
}

#[derive(Default)]
struct Wiring {
    failures: Vec<WiringFailure>,
}

impl Wiring {
    /// Keep the outcome of one wiring step, recording a failure.
    fn record<T>(
        &mut self,
        scope: &GraphScope,
        kind: WiringKind,
        agent_id: &str,
        target_id: &str,
        result: agents_core::AgentsResult<T>,
    ) {
        if let Err(e) = result {
            error!(
                graph = %scope,
                kind = kind.as_str(),
                agent_id,
                target_id,
                error = %e,
                "Failed to wire graph"
            );
            self.failures.push(WiringFailure {
                kind,
                agent_id: agent_id.to_string(),
                target_id: target_id.to_string(),
                reason: e.to_string(),
            });
        }
    }

    fn finish(self) -> Vec<WiringFailure> {
        for kind in [
            WiringKind::AgentRelation,
            WiringKind::ToolRelation,
            WiringKind::DataComponent,
            WiringKind::ArtifactComponent,
        ] {
            let count = self.failures.iter().filter(|f| f.kind == kind).count();
            if count > 0 {
                with_metrics(|m| m.record_wiring_failures(kind.as_str(), count));
            }
        }
        self.failures
    }
}

fn record_operation<T>(operation: &str, result: &ApiResult<T>) {
    let success = result.is_ok();
    with_metrics(|m| m.record_full_graph_operation(operation, success));
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Ids of the resources already stored in a project.
pub async fn load_project_catalog(store: &dyn Store, project: &ProjectScope) -> ApiResult<ProjectCatalog> {
    Ok(ProjectCatalog {
        tools: tools::list_tools(store, project)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect(),
        data_components: data_components::list_data_components(store, project)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect(),
        artifact_components: artifact_components::list_artifact_components(store, project)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect(),
        credential_references: credential_references::list_credential_references(store, project)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect(),
        context_configs: context_configs::list_context_configs(store, project)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect(),
    })
}

/// Validate a definition against the resources stored in its project.
pub async fn validate_full_graph(
    store: &dyn Store,
    project: &ProjectScope,
    graph: &FullGraphDefinition,
) -> ApiResult<()> {
    let catalog = load_project_catalog(store, project).await?;
    agents_core::validate_graph_definition(graph, &catalog)?;
    Ok(())
}

// ============================================================================
// CREATE
// ============================================================================

/// Create a graph with everything it references.
///
/// Fails with 404 when the project does not exist and 409 when the graph
/// already does.
#[instrument(skip(store, graph), fields(project = %project, graph_id = %graph.id))]
pub async fn create_full_graph(
    store: &dyn Store,
    project: &ProjectScope,
    graph: &FullGraphDefinition,
) -> ApiResult<GraphOutcome> {
    let result = create_inner(store, project, graph).await;
    record_operation("create", &result);
    result
}

async fn create_inner(
    store: &dyn Store,
    project: &ProjectScope,
    graph: &FullGraphDefinition,
) -> ApiResult<GraphOutcome> {
    if !projects::project_exists(store, project).await? {
        return Err(ApiError::entity_not_found("Project", &project.project_id));
    }
    validate_full_graph(store, project, graph).await?;

    let scope = project.graph(graph.id.clone());
    if agent_graphs::agent_graph_exists(store, &scope).await? {
        return Err(ApiError::entity_already_exists("AgentGraph", &graph.id));
    }

    let now = Utc::now();
    upsert_graph_resources(store, project, graph, now).await?;

    agent_graphs::create_agent_graph(store, graph.to_graph_row(project, now)).await?;
    for agent in graph.internal_agents() {
        agents::create_agent(store, agent.to_entity(&scope, now)).await?;
    }
    for agent in graph.external_agents() {
        external_agents::create_external_agent(store, agent.to_entity(&scope, now)).await?;
    }
    agent_graphs::set_default_agent(store, &scope, graph.default_agent_id.as_deref()).await?;
    agent_graphs::set_context_config(store, &scope, graph.effective_context_config_id()).await?;

    let mut wiring = Wiring::default();
    for agent in graph.internal_agents() {
        wire_tools(store, &scope, agent, &mut wiring).await;
    }
    for agent in graph.internal_agents() {
        wire_components(store, &scope, agent, &mut wiring).await;
    }
    for agent in graph.internal_agents() {
        wire_relations(store, &scope, agent, graph, now, &mut wiring).await;
    }
    let failures = wiring.finish();

    info!(
        graph = %scope,
        agents = graph.agents.len(),
        wiring_failures = failures.len(),
        "Created full graph"
    );

    let stored = read_back(store, &scope).await?;
    Ok(GraphOutcome {
        graph: stored,
        created: true,
        failures,
    })
}

/// Project-level resources a graph definition carries inline.
async fn upsert_graph_resources(
    store: &dyn Store,
    project: &ProjectScope,
    graph: &FullGraphDefinition,
    now: Timestamp,
) -> ApiResult<()> {
    for credential in graph.credential_references.values() {
        credential_references::upsert_credential_reference(store, credential.to_entity(project, now))
            .await?;
    }
    for tool in graph.tools.values() {
        tools::upsert_tool(store, tool.to_entity(project, now)).await?;
    }
    if let Some(config) = &graph.context_config {
        context_configs::upsert_context_config(store, config.to_entity(project, now)).await?;
    }
    for component in graph.data_components.values() {
        data_components::upsert_data_component(store, component.to_entity(project, now)).await?;
    }
    for component in graph.artifact_components.values() {
        artifact_components::upsert_artifact_component(store, component.to_entity(project, now))
            .await?;
    }
    Ok(())
}

async fn wire_tools(
    store: &dyn Store,
    scope: &GraphScope,
    agent: &InternalAgentDefinition,
    wiring: &mut Wiring,
) {
    let agent_scope = scope.agent(agent.id.clone());
    for tool_id in &agent.tools {
        let result = tools::upsert_agent_tool_relation(
            store,
            &agent_scope,
            tool_id,
            agent.selected_tools.get(tool_id).cloned(),
            agent.tool_headers.get(tool_id).cloned(),
        )
        .await;
        wiring.record(scope, WiringKind::ToolRelation, &agent.id, tool_id, result);
    }
}

async fn wire_components(
    store: &dyn Store,
    scope: &GraphScope,
    agent: &InternalAgentDefinition,
    wiring: &mut Wiring,
) {
    let agent_scope = scope.agent(agent.id.clone());
    for component_id in &agent.data_components {
        let result =
            data_components::associate_data_component_with_agent(store, &agent_scope, component_id)
                .await;
        wiring.record(scope, WiringKind::DataComponent, &agent.id, component_id, result);
    }
    for component_id in &agent.artifact_components {
        let result = artifact_components::associate_artifact_component_with_agent(
            store,
            &agent_scope,
            component_id,
        )
        .await;
        wiring.record(scope, WiringKind::ArtifactComponent, &agent.id, component_id, result);
    }
}

/// Build the relation rows for one agent's transfer and delegate lists.
fn relations_for(
    scope: &GraphScope,
    agent: &InternalAgentDefinition,
    graph: &FullGraphDefinition,
    now: Timestamp,
) -> Vec<AgentRelation> {
    let edge = |target: &String, relation_type: RelationType| {
        let external = graph
            .agents
            .get(target)
            .is_some_and(|a| !a.is_internal());
        AgentRelation {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            graph_id: scope.graph_id.clone(),
            id: agents_core::generate_id(),
            source_agent_id: agent.id.clone(),
            target_agent_id: (!external).then(|| target.clone()),
            external_agent_id: external.then(|| target.clone()),
            relation_type,
            created_at: now,
            updated_at: now,
        }
    };
    agent
        .can_transfer_to
        .iter()
        .map(|target| edge(target, RelationType::Transfer))
        .chain(
            agent
                .can_delegate_to
                .iter()
                .map(|target| edge(target, RelationType::Delegate)),
        )
        .collect()
}

async fn wire_relations(
    store: &dyn Store,
    scope: &GraphScope,
    agent: &InternalAgentDefinition,
    graph: &FullGraphDefinition,
    now: Timestamp,
    wiring: &mut Wiring,
) {
    for relation in relations_for(scope, agent, graph, now) {
        let target = relation
            .target_agent_id
            .clone()
            .or_else(|| relation.external_agent_id.clone())
            .unwrap_or_default();
        let result = agent_relations::create_agent_relation(store, relation).await;
        wiring.record(scope, WiringKind::AgentRelation, &agent.id, &target, result);
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Replace a stored graph with `graph`, creating it when absent.
///
/// Agents and external agents missing from the definition are deleted with
/// their relations. Tool grants are reconciled per agent. Component
/// associations and agent relations are rebuilt.
#[instrument(skip(store, graph), fields(project = %project, graph_id = %graph.id))]
pub async fn update_full_graph(
    store: &dyn Store,
    project: &ProjectScope,
    graph: &FullGraphDefinition,
) -> ApiResult<GraphOutcome> {
    let scope = project.graph(graph.id.clone());
    if !agent_graphs::agent_graph_exists(store, &scope).await? {
        debug!(graph = %scope, "Graph absent, creating");
        return create_full_graph(store, project, graph).await;
    }
    let result = update_inner(store, project, &scope, graph).await;
    record_operation("update", &result);
    result
}

async fn update_inner(
    store: &dyn Store,
    project: &ProjectScope,
    scope: &GraphScope,
    graph: &FullGraphDefinition,
) -> ApiResult<GraphOutcome> {
    validate_full_graph(store, project, graph).await?;

    let now = Utc::now();
    upsert_graph_resources(store, project, graph, now).await?;

    for agent in graph.internal_agents() {
        agents::upsert_agent(store, agent.to_entity(scope, now)).await?;
    }
    for agent in graph.external_agents() {
        external_agents::upsert_external_agent(store, agent.to_entity(scope, now)).await?;
    }

    let internal_ids: BTreeSet<&str> = graph.internal_agents().map(|a| a.id.as_str()).collect();
    let external_ids: BTreeSet<&str> = graph.external_agents().map(|a| a.id.as_str()).collect();

    for stored in agents::list_agents(store, scope).await? {
        if !internal_ids.contains(stored.id.as_str()) {
            agents::delete_agent(store, scope, &stored.id).await?;
            debug!(graph = %scope, agent_id = %stored.id, "Deleted orphaned agent");
        }
    }
    for stored in external_agents::list_external_agents(store, scope).await? {
        if !external_ids.contains(stored.id.as_str()) {
            external_agents::delete_external_agent(store, scope, &stored.id).await?;
            debug!(graph = %scope, external_agent_id = %stored.id, "Deleted orphaned external agent");
        }
    }

    let mut wiring = Wiring::default();

    let stored_grants = tools::list_agent_tool_relations(store, scope).await?;
    for agent in graph.internal_agents() {
        for grant in stored_grants.iter().filter(|g| g.agent_id == agent.id) {
            if !agent.tools.contains(&grant.tool_id) {
                let result = tools::delete_agent_tool_relation(store, scope, &grant.id).await;
                wiring.record(scope, WiringKind::ToolRelation, &agent.id, &grant.tool_id, result);
            }
        }
        wire_tools(store, scope, agent, &mut wiring).await;
    }

    for agent in graph.internal_agents() {
        let agent_scope = scope.agent(agent.id.clone());
        data_components::delete_data_component_associations_by_agent(store, &agent_scope).await?;
        artifact_components::delete_artifact_component_associations_by_agent(store, &agent_scope)
            .await?;
        wire_components(store, scope, agent, &mut wiring).await;
    }

    agent_relations::delete_agent_relations_by_graph(store, scope).await?;
    for agent in graph.internal_agents() {
        wire_relations(store, scope, agent, graph, now, &mut wiring).await;
    }

    let mut row = graph.to_graph_row(project, now);
    row.default_agent_id = graph.default_agent_id.clone();
    row.context_config_id = graph.effective_context_config_id().map(str::to_string);
    agent_graphs::upsert_agent_graph(store, row).await?;

    let failures = wiring.finish();
    info!(
        graph = %scope,
        agents = graph.agents.len(),
        wiring_failures = failures.len(),
        "Updated full graph"
    );

    let stored = read_back(store, scope).await?;
    Ok(GraphOutcome {
        graph: stored,
        created: false,
        failures,
    })
}

// ============================================================================
// READ
// ============================================================================

async fn read_back(store: &dyn Store, scope: &GraphScope) -> ApiResult<FullGraphDefinition> {
    get_full_graph(store, scope)
        .await?
        .ok_or_else(|| ApiError::internal_error(format!("Graph '{}' vanished after write", scope.graph_id)))
}

/// Assemble a graph definition from storage. `None` when the graph does
/// not exist.
#[instrument(skip(store), fields(graph = %scope))]
pub async fn get_full_graph(
    store: &dyn Store,
    scope: &GraphScope,
) -> ApiResult<Option<FullGraphDefinition>> {
    let Some(row) = agent_graphs::get_agent_graph(store, scope).await? else {
        return Ok(None);
    };
    let project = scope.project();
    let mut definition = FullGraphDefinition::from_graph_row(&row);

    let stored_agents = agents::list_agents(store, scope).await?;
    let stored_external = external_agents::list_external_agents(store, scope).await?;
    let relations = agent_relations::list_agent_relations(store, scope).await?;
    let grants = tools::list_agent_tool_relations(store, scope).await?;
    let data_links = data_components::list_data_component_associations(store, scope).await?;
    let artifact_links = artifact_components::list_artifact_component_associations(store, scope).await?;

    let project_tools: BTreeMap<_, _> = tools::list_tools(store, &project)
        .await?
        .into_iter()
        .map(|t| (t.id.clone(), t))
        .collect();
    let project_data: BTreeMap<_, _> = data_components::list_data_components(store, &project)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
    let project_artifacts: BTreeMap<_, _> =
        artifact_components::list_artifact_components(store, &project)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
    let project_credentials: BTreeMap<_, _> =
        credential_references::list_credential_references(store, &project)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

    let mut credential_ids = BTreeSet::new();

    for agent in &stored_agents {
        let mut internal = InternalAgentDefinition::from_entity(agent);
        for relation in relations.iter().filter(|r| r.source_agent_id == agent.id) {
            let target = relation
                .target_agent_id
                .as_ref()
                .or(relation.external_agent_id.as_ref());
            let Some(target) = target else { continue };
            match relation.relation_type {
                RelationType::Transfer => internal.can_transfer_to.push(target.clone()),
                RelationType::Delegate => internal.can_delegate_to.push(target.clone()),
            }
        }
        for grant in grants.iter().filter(|g| g.agent_id == agent.id) {
            internal.tools.push(grant.tool_id.clone());
            if let Some(selected) = &grant.selected_tools {
                internal.selected_tools.insert(grant.tool_id.clone(), selected.clone());
            }
            if let Some(headers) = &grant.headers {
                internal.tool_headers.insert(grant.tool_id.clone(), headers.clone());
            }
            if let Some(tool) = project_tools.get(&grant.tool_id) {
                definition
                    .tools
                    .insert(tool.id.clone(), ToolDefinition::from(tool));
                credential_ids.extend(tool.credential_reference_id.clone());
            }
        }
        for link in data_links.iter().filter(|l| l.agent_id == agent.id) {
            internal.data_components.push(link.data_component_id.clone());
            if let Some(component) = project_data.get(&link.data_component_id) {
                definition
                    .data_components
                    .insert(component.id.clone(), DataComponentDefinition::from(component));
            }
        }
        for link in artifact_links.iter().filter(|l| l.agent_id == agent.id) {
            internal.artifact_components.push(link.artifact_component_id.clone());
            if let Some(component) = project_artifacts.get(&link.artifact_component_id) {
                definition.artifact_components.insert(
                    component.id.clone(),
                    ArtifactComponentDefinition::from(component),
                );
            }
        }
        definition
            .agents
            .insert(agent.id.clone(), AgentDefinition::Internal(internal));
    }

    for external in &stored_external {
        credential_ids.extend(external.credential_reference_id.clone());
        definition.agents.insert(
            external.id.clone(),
            AgentDefinition::External(ExternalAgentDefinition::from(external)),
        );
    }

    for id in credential_ids {
        if let Some(credential) = project_credentials.get(&id) {
            definition
                .credential_references
                .insert(id, CredentialReferenceDefinition::from(credential));
        }
    }

    if let Some(config_id) = row.context_config_id.as_deref() {
        if let Some(config) = context_configs::get_context_config(store, &project, config_id).await? {
            definition.context_config = Some(ContextConfigDefinition::from(&config));
        }
    }

    Ok(Some(definition))
}

// ============================================================================
// DELETE
// ============================================================================

/// Delete a graph and everything scoped to it. Project-level tools,
/// components, credentials and context configs are kept.
///
/// Returns `false` when the graph did not exist.
#[instrument(skip(store), fields(graph = %scope))]
pub async fn delete_full_graph(store: &dyn Store, scope: &GraphScope) -> ApiResult<bool> {
    let result = delete_inner(store, scope).await;
    record_operation("delete", &result);
    result
}

async fn delete_inner(store: &dyn Store, scope: &GraphScope) -> ApiResult<bool> {
    if !agent_graphs::agent_graph_exists(store, scope).await? {
        return Ok(false);
    }

    agent_relations::delete_agent_relations_by_graph(store, scope).await?;
    let stored_agents = agents::list_agents(store, scope).await?;
    for agent in &stored_agents {
        let agent_scope = scope.agent(agent.id.clone());
        tools::delete_agent_tool_relations_by_agent(store, &agent_scope).await?;
        data_components::delete_data_component_associations_by_agent(store, &agent_scope).await?;
        artifact_components::delete_artifact_component_associations_by_agent(store, &agent_scope)
            .await?;
    }
    for agent in &stored_agents {
        agents::delete_agent(store, scope, &agent.id).await?;
    }
    for external in external_agents::list_external_agents(store, scope).await? {
        external_agents::delete_external_agent(store, scope, &external.id).await?;
    }

    let deleted = agent_graphs::delete_agent_graph(store, scope).await?;
    info!(graph = %scope, agents = stored_agents.len(), "Deleted full graph");
    Ok(deleted)
}
