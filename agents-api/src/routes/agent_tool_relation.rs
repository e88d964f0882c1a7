//! Agent Tool Relation REST API Routes
//!
//! Grants of project tools to the agents of one graph.

use agents_core::{validate_resource_id, AgentToolRelation, AgentToolRelationUpdate};
use agents_storage::access::tools;
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
    types::{AgentToolRelationQuery, CreateAgentToolRelationRequest, ListResponse},
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations",
    tag = "Agent Tool Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        AgentToolRelationQuery,
    ),
    responses(
        (status = 200, description = "Tool grants in the graph", body = ListResponse<AgentToolRelation>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agent_tool_relations(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Query(query): Query<AgentToolRelationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = tools::list_agent_tool_relations_paginated(
        store.as_ref(),
        &graph,
        query.pagination()?,
        query.agent_id.as_deref(),
    )
    .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations",
    tag = "Agent Tool Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = CreateAgentToolRelationRequest,
    responses(
        (status = 201, description = "Tool granted", body = crate::types::DataResponse<AgentToolRelation>),
        (status = 422, description = "Agent or tool does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_agent_tool_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Json(req): Json<CreateAgentToolRelationRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(id) = &req.id {
        validate_resource_id("id", id)?;
    }
    req.agent_id.validate_non_empty("agent_id")?;
    req.tool_id.validate_non_empty("tool_id")?;

    let relation =
        tools::create_agent_tool_relation(store.as_ref(), req.into_entity(&graph, Utc::now()))
            .await?;
    Ok(created(relation))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}",
    tag = "Agent Tool Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Grant id"),
    ),
    responses(
        (status = 200, description = "Tool grant", body = crate::types::DataResponse<AgentToolRelation>),
        (status = 404, description = "Grant not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_agent_tool_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let relation = tools::get_agent_tool_relation(store.as_ref(), &graph, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("AgentToolRelation", &id))?;
    Ok(ok(relation))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}",
    tag = "Agent Tool Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Grant id"),
    ),
    request_body = AgentToolRelationUpdate,
    responses(
        (status = 200, description = "Tool grant updated", body = crate::types::DataResponse<AgentToolRelation>),
        (status = 404, description = "Grant not found", body = crate::error::ProblemDetails),
        (status = 422, description = "Tool does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_agent_tool_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
    Json(req): Json<AgentToolRelationUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    let relation = tools::update_agent_tool_relation(store.as_ref(), &graph, &id, req).await?;
    Ok(ok(relation))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-tool-relations/{id}",
    tag = "Agent Tool Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Grant id"),
    ),
    responses(
        (status = 204, description = "Tool grant deleted"),
        (status = 404, description = "Grant not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_agent_tool_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = tools::delete_agent_tool_relation(store.as_ref(), &graph, &id).await?;
    deleted(removed, "AgentToolRelation", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_agent_tool_relations).post(create_agent_tool_relation),
        )
        .route(
            "/:id",
            get(get_agent_tool_relation)
                .put(update_agent_tool_relation)
                .delete(delete_agent_tool_relation),
        )
}
