//! Agent Graph REST API Routes
//!
//! Graph rows only. Whole graphs with their agents and wiring are served by
//! the full graph routes.

use agents_core::{validate_resource_id, AgentGraph, AgentGraphUpdate, RelatedAgents};
use agents_storage::access::{agent_graphs, agent_relations, agents};
use agents_storage::SharedStore;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use super::{created, deleted, ensure_project_exists, ok};
use crate::{
    error::{ApiError, ApiResult},
    extractors::{AgentPath, GraphPath, ProjectPath},
    state::AppState,
    types::{CreateAgentGraphRequest, ListResponse, PaginationQuery},
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/agent-graphs
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Graphs in the project", body = ListResponse<AgentGraph>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agent_graphs(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page =
        agent_graphs::list_agent_graphs_paginated(store.as_ref(), &project, query.pagination()?)
            .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/agent-graphs
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = CreateAgentGraphRequest,
    responses(
        (status = 201, description = "Graph created", body = crate::types::DataResponse<AgentGraph>),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
        (status = 409, description = "Graph already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_agent_graph(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<CreateAgentGraphRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let graph =
        agent_graphs::create_agent_graph(store.as_ref(), req.into_entity(&project, Utc::now()))
            .await?;
    Ok(created(graph))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    responses(
        (status = 200, description = "Graph", body = crate::types::DataResponse<AgentGraph>),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_agent_graph(
    State(store): State<SharedStore>,
    GraphPath(scope): GraphPath,
) -> ApiResult<impl IntoResponse> {
    let graph = agent_graphs::get_agent_graph(store.as_ref(), &scope)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("AgentGraph", &scope.graph_id))?;
    Ok(ok(graph))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = AgentGraphUpdate,
    responses(
        (status = 200, description = "Graph updated", body = crate::types::DataResponse<AgentGraph>),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
        (status = 422, description = "Default agent is not in the graph", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_agent_graph(
    State(store): State<SharedStore>,
    GraphPath(scope): GraphPath,
    Json(req): Json<AgentGraphUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    if let Some(default_agent_id) = &req.default_agent_id {
        if !agents::agent_exists(store.as_ref(), &scope, default_agent_id).await? {
            return Err(ApiError::unprocessable(format!(
                "Default agent '{}' is not an agent of graph '{}'",
                default_agent_id, scope.graph_id
            )));
        }
    }
    let graph = agent_graphs::update_agent_graph(store.as_ref(), &scope, req).await?;
    Ok(ok(graph))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    responses(
        (status = 204, description = "Graph deleted"),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_agent_graph(
    State(store): State<SharedStore>,
    GraphPath(scope): GraphPath,
) -> ApiResult<impl IntoResponse> {
    let removed = agent_graphs::delete_agent_graph(store.as_ref(), &scope).await?;
    deleted(removed, "AgentGraph", &scope.graph_id)
}

/// GET /tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}/related-agents/{agent_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/agent-graphs/{graph_id}/related-agents/{agent_id}",
    tag = "Agent Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Source agent id"),
    ),
    responses(
        (status = 200, description = "Agents reachable from the source agent", body = crate::types::DataResponse<RelatedAgents>),
        (status = 404, description = "Agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_related_agents(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
) -> ApiResult<impl IntoResponse> {
    let graph = agent.graph();
    if !agents::agent_exists(store.as_ref(), &graph, &agent.agent_id).await? {
        return Err(ApiError::entity_not_found("Agent", &agent.agent_id));
    }
    let related =
        agent_relations::get_related_agents_for_graph(store.as_ref(), &graph, &agent.agent_id)
            .await?;
    Ok(ok(related))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agent_graphs).post(create_agent_graph))
        .route(
            "/:graph_id",
            get(get_agent_graph)
                .put(update_agent_graph)
                .delete(delete_agent_graph),
        )
        .route("/:graph_id/related-agents/:agent_id", get(get_related_agents))
}
