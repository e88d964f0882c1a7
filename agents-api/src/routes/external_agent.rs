//! External Agent REST API Routes

use agents_core::{validate_resource_id, ExternalAgent, ExternalAgentDefinition, ExternalAgentUpdate};
use agents_storage::access::{agent_graphs, external_agents};
use agents_storage::SharedStore;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use super::{created, deleted, ok};
use crate::{
    error::{ApiError, ApiResult},
    extractors::{GraphPath, PathId},
    state::AppState,
    types::{ListResponse, PaginationQuery},
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents",
    tag = "External Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "External agents in the graph", body = ListResponse<ExternalAgent>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_external_agents(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page =
        external_agents::list_external_agents_paginated(store.as_ref(), &graph, query.pagination()?)
            .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents",
    tag = "External Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = ExternalAgentDefinition,
    responses(
        (status = 201, description = "External agent created", body = crate::types::DataResponse<ExternalAgent>),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
        (status = 409, description = "External agent already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_external_agent(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Json(req): Json<ExternalAgentDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    req.base_url.validate_non_empty("base_url")?;
    if !agent_graphs::agent_graph_exists(store.as_ref(), &graph).await? {
        return Err(ApiError::entity_not_found("AgentGraph", &graph.graph_id));
    }
    let agent =
        external_agents::create_external_agent(store.as_ref(), req.to_entity(&graph, Utc::now()))
            .await?;
    Ok(created(agent))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}",
    tag = "External Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "External agent id"),
    ),
    responses(
        (status = 200, description = "External agent", body = crate::types::DataResponse<ExternalAgent>),
        (status = 404, description = "External agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_external_agent(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let agent = external_agents::get_external_agent(store.as_ref(), &graph, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("ExternalAgent", &id))?;
    Ok(ok(agent))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}",
    tag = "External Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "External agent id"),
    ),
    request_body = ExternalAgentUpdate,
    responses(
        (status = 200, description = "External agent updated", body = crate::types::DataResponse<ExternalAgent>),
        (status = 404, description = "External agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_external_agent(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
    Json(req): Json<ExternalAgentUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    let agent = external_agents::update_external_agent(store.as_ref(), &graph, &id, req).await?;
    Ok(ok(agent))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}
///
/// Relations delegating to the agent are removed with it.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/external-agents/{id}",
    tag = "External Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "External agent id"),
    ),
    responses(
        (status = 204, description = "External agent deleted"),
        (status = 404, description = "External agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_external_agent(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = external_agents::delete_external_agent(store.as_ref(), &graph, &id).await?;
    deleted(removed, "ExternalAgent", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_external_agents).post(create_external_agent))
        .route(
            "/:id",
            get(get_external_agent)
                .put(update_external_agent)
                .delete(delete_external_agent),
        )
}
