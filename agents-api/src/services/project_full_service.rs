//! Full Project Service
//!
//! A project document carries the project row, its project-level resources
//! and every graph. Graphs are written through the full graph service, so a
//! project write has the same partial-failure behavior per graph.

use std::collections::{BTreeMap, BTreeSet};

use agents_core::{
    ArtifactComponentDefinition, ContextConfigDefinition, CredentialReferenceDefinition,
    DataComponentDefinition, FullProjectDefinition, ProjectScope, TenantScope, Timestamp,
    ToolDefinition,
};
use agents_storage::access::{
    agent_graphs, artifact_components, context_configs, credential_references, data_components,
    projects, tools,
};
use agents_storage::Store;
use chrono::Utc;
use tracing::{info, instrument};

use super::graph_full_service::{
    create_full_graph, delete_full_graph, get_full_graph, update_full_graph, WiringFailure,
};
use crate::error::{ApiError, ApiResult};

/// Result of a project create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOutcome {
    /// The project as read back from storage.
    pub project: FullProjectDefinition,
    pub created: bool,
    /// Wiring failures per graph id. Graphs without failures are absent.
    pub failures: BTreeMap<String, Vec<WiringFailure>>,
}

impl ProjectOutcome {
    pub fn failure_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }
}

/// Create a project with its resources and graphs. 409 when the project
/// exists.
#[instrument(skip(store, project), fields(tenant = %tenant, project_id = %project.id))]
pub async fn create_full_project(
    store: &dyn Store,
    tenant: &TenantScope,
    project: &FullProjectDefinition,
) -> ApiResult<ProjectOutcome> {
    agents_core::validate_project_definition(project)?;
    let scope = tenant.project(project.id.clone());
    if projects::project_exists(store, &scope).await? {
        return Err(ApiError::entity_already_exists("Project", &project.id));
    }

    let now = Utc::now();
    projects::create_project(store, project.to_project_row(tenant, now)).await?;
    upsert_project_resources(store, &scope, project, now).await?;

    let mut failures = BTreeMap::new();
    for graph in project.graphs.values() {
        let outcome = create_full_graph(store, &scope, graph).await?;
        if !outcome.failures.is_empty() {
            failures.insert(graph.id.clone(), outcome.failures);
        }
    }

    info!(project = %scope, graphs = project.graphs.len(), "Created full project");
    let stored = read_back(store, &scope).await?;
    Ok(ProjectOutcome {
        project: stored,
        created: true,
        failures,
    })
}

/// Replace a stored project, creating it when absent. Graphs missing from
/// the document are deleted. Project-level resources are upserted and
/// never deleted.
#[instrument(skip(store, project), fields(project = %scope))]
pub async fn update_full_project(
    store: &dyn Store,
    scope: &ProjectScope,
    project: &FullProjectDefinition,
) -> ApiResult<ProjectOutcome> {
    if !projects::project_exists(store, scope).await? {
        return create_full_project(store, &scope.tenant(), project).await;
    }
    agents_core::validate_project_definition(project)?;

    let now = Utc::now();
    projects::upsert_project(store, project.to_project_row(&scope.tenant(), now)).await?;
    upsert_project_resources(store, scope, project, now).await?;

    let mut failures = BTreeMap::new();
    for graph in project.graphs.values() {
        let outcome = update_full_graph(store, scope, graph).await?;
        if !outcome.failures.is_empty() {
            failures.insert(graph.id.clone(), outcome.failures);
        }
    }

    let keep: BTreeSet<&str> = project.graphs.keys().map(String::as_str).collect();
    for stored in agent_graphs::list_agent_graphs(store, scope).await? {
        if !keep.contains(stored.id.as_str()) {
            delete_full_graph(store, &scope.graph(stored.id.clone())).await?;
        }
    }

    info!(project = %scope, graphs = project.graphs.len(), "Updated full project");
    let stored = read_back(store, scope).await?;
    Ok(ProjectOutcome {
        project: stored,
        created: false,
        failures,
    })
}

async fn upsert_project_resources(
    store: &dyn Store,
    scope: &ProjectScope,
    project: &FullProjectDefinition,
    now: Timestamp,
) -> ApiResult<()> {
    for credential in project.credential_references.values() {
        credential_references::upsert_credential_reference(store, credential.to_entity(scope, now))
            .await?;
    }
    for tool in project.tools.values() {
        tools::upsert_tool(store, tool.to_entity(scope, now)).await?;
    }
    for component in project.data_components.values() {
        data_components::upsert_data_component(store, component.to_entity(scope, now)).await?;
    }
    for component in project.artifact_components.values() {
        artifact_components::upsert_artifact_component(store, component.to_entity(scope, now))
            .await?;
    }
    for config in project.context_configs.values() {
        context_configs::upsert_context_config(store, config.to_entity(scope, now)).await?;
    }
    Ok(())
}

async fn read_back(store: &dyn Store, scope: &ProjectScope) -> ApiResult<FullProjectDefinition> {
    get_full_project(store, scope).await?.ok_or_else(|| {
        ApiError::internal_error(format!("Project '{}' vanished after write", scope.project_id))
    })
}

/// Assemble a project document from storage. `None` when the project does
/// not exist.
///
/// Project-level resources are listed once at the top. Graphs refer to them
/// by id and carry no resource maps of their own.
#[instrument(skip(store), fields(project = %scope))]
pub async fn get_full_project(
    store: &dyn Store,
    scope: &ProjectScope,
) -> ApiResult<Option<FullProjectDefinition>> {
    let Some(row) = projects::get_project(store, scope).await? else {
        return Ok(None);
    };
    let mut definition = FullProjectDefinition::from_project_row(&row);

    definition.tools = tools::list_tools(store, scope)
        .await?
        .iter()
        .map(|t| (t.id.clone(), ToolDefinition::from(t)))
        .collect();
    definition.data_components = data_components::list_data_components(store, scope)
        .await?
        .iter()
        .map(|c| (c.id.clone(), DataComponentDefinition::from(c)))
        .collect();
    definition.artifact_components = artifact_components::list_artifact_components(store, scope)
        .await?
        .iter()
        .map(|c| (c.id.clone(), ArtifactComponentDefinition::from(c)))
        .collect();
    definition.credential_references =
        credential_references::list_credential_references(store, scope)
            .await?
            .iter()
            .map(|c| (c.id.clone(), CredentialReferenceDefinition::from(c)))
            .collect();
    definition.context_configs = context_configs::list_context_configs(store, scope)
        .await?
        .iter()
        .map(|c| (c.id.clone(), ContextConfigDefinition::from(c)))
        .collect();

    for graph_row in agent_graphs::list_agent_graphs(store, scope).await? {
        let graph_scope = scope.graph(graph_row.id.clone());
        let Some(mut graph) = get_full_graph(store, &graph_scope).await? else {
            continue;
        };
        graph.tools.clear();
        graph.data_components.clear();
        graph.artifact_components.clear();
        graph.credential_references.clear();
        graph.context_config = None;
        definition.graphs.insert(graph.id.clone(), graph);
    }

    Ok(Some(definition))
}

/// Delete a project with every graph and resource in it. Returns `false`
/// when the project did not exist.
#[instrument(skip(store), fields(project = %scope))]
pub async fn delete_full_project(store: &dyn Store, scope: &ProjectScope) -> ApiResult<bool> {
    if !projects::project_exists(store, scope).await? {
        return Ok(false);
    }
    let graphs = agent_graphs::list_agent_graphs(store, scope).await?;
    for graph in &graphs {
        delete_full_graph(store, &scope.graph(graph.id.clone())).await?;
    }
    let deleted = projects::delete_project(store, scope).await?;
    info!(project = %scope, graphs = graphs.len(), "Deleted full project");
    Ok(deleted)
}
