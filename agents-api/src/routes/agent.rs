//! Agent REST API Routes
//!
//! Internal agents of one graph. Deleting an agent also removes its
//! relations, tool grants and component associations.

use agents_core::{validate_resource_id, Agent, AgentUpdate};
use agents_storage::access::{agent_graphs, agents};
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
    extractors::{AgentPath, GraphPath},
    state::AppState,
    types::{CreateAgentRequest, ListResponse, PaginationQuery},
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents",
    tag = "Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Agents in the graph", body = ListResponse<Agent>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agents(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = agents::list_agents_paginated(store.as_ref(), &graph, query.pagination()?).await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents",
    tag = "Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = crate::types::DataResponse<Agent>),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
        (status = 409, description = "Agent already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_agent(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Json(req): Json<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    if !agent_graphs::agent_graph_exists(store.as_ref(), &graph).await? {
        return Err(ApiError::entity_not_found("AgentGraph", &graph.graph_id));
    }
    let agent = agents::create_agent(store.as_ref(), req.into_entity(&graph, Utc::now())).await?;
    Ok(created(agent))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}",
    tag = "Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    responses(
        (status = 200, description = "Agent", body = crate::types::DataResponse<Agent>),
        (status = 404, description = "Agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_agent(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
) -> ApiResult<impl IntoResponse> {
    let found = agents::get_agent(store.as_ref(), &agent.graph(), &agent.agent_id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Agent", &agent.agent_id))?;
    Ok(ok(found))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}",
    tag = "Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    request_body = AgentUpdate,
    responses(
        (status = 200, description = "Agent updated", body = crate::types::DataResponse<Agent>),
        (status = 400, description = "Empty update", body = crate::error::ProblemDetails),
        (status = 404, description = "Agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_agent(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
    Json(req): Json<AgentUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    if let Some(name) = &req.name {
        name.validate_non_empty("name")?;
    }
    let updated = agents::update_agent(store.as_ref(), &agent.graph(), &agent.agent_id, req).await?;
    Ok(ok(updated))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}",
    tag = "Agents",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    responses(
        (status = 204, description = "Agent deleted"),
        (status = 404, description = "Agent not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_agent(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
) -> ApiResult<impl IntoResponse> {
    let removed = agents::delete_agent(store.as_ref(), &agent.graph(), &agent.agent_id).await?;
    deleted(removed, "Agent", &agent.agent_id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents).post(create_agent))
        .route(
            "/:agent_id",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
}
