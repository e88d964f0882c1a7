//! Agent Relation REST API Routes
//!
//! Transfer and delegate edges between the agents of one graph.

use agents_core::{validate_resource_id, AgentRelation, AgentRelationUpdate, RelationType};
use agents_storage::access::agent_relations;
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
    types::{AgentRelationQuery, CreateAgentRelationRequest, ListResponse},
    validation::HasUpdates,
};

/// Control can only be transferred to an internal agent.
fn ensure_transfer_is_internal(
    relation_type: RelationType,
    external_agent_id: Option<&str>,
) -> ApiResult<()> {
    if relation_type == RelationType::Transfer && external_agent_id.is_some() {
        return Err(ApiError::bad_request(
            "Transfer relations must target an internal agent",
        ));
    }
    Ok(())
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations",
    tag = "Agent Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        AgentRelationQuery,
    ),
    responses(
        (status = 200, description = "Relations in the graph", body = ListResponse<AgentRelation>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agent_relations(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Query(query): Query<AgentRelationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = agent_relations::list_agent_relations_paginated(
        store.as_ref(),
        &graph,
        query.pagination()?,
        query.source_agent_id.as_deref(),
    )
    .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations",
    tag = "Agent Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = CreateAgentRelationRequest,
    responses(
        (status = 201, description = "Relation created", body = crate::types::DataResponse<AgentRelation>),
        (status = 400, description = "Invalid target", body = crate::error::ProblemDetails),
        (status = 422, description = "An endpoint agent does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_agent_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Json(req): Json<CreateAgentRelationRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(id) = &req.id {
        validate_resource_id("id", id)?;
    }
    agent_relations::validate_relation_target(
        req.target_agent_id.as_deref(),
        req.external_agent_id.as_deref(),
    )?;
    ensure_transfer_is_internal(req.relation_type, req.external_agent_id.as_deref())?;

    let relation =
        agent_relations::create_agent_relation(store.as_ref(), req.into_entity(&graph, Utc::now()))
            .await?;
    Ok(created(relation))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}",
    tag = "Agent Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Relation id"),
    ),
    responses(
        (status = 200, description = "Relation", body = crate::types::DataResponse<AgentRelation>),
        (status = 404, description = "Relation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_agent_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let relation = agent_relations::get_agent_relation(store.as_ref(), &graph, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("AgentRelation", &id))?;
    Ok(ok(relation))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}
///
/// Setting one target column clears the other.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}",
    tag = "Agent Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Relation id"),
    ),
    request_body = AgentRelationUpdate,
    responses(
        (status = 200, description = "Relation updated", body = crate::types::DataResponse<AgentRelation>),
        (status = 404, description = "Relation not found", body = crate::error::ProblemDetails),
        (status = 422, description = "An endpoint agent does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_agent_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
    Json(req): Json<AgentRelationUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    let mut preview = agent_relations::get_agent_relation(store.as_ref(), &graph, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("AgentRelation", &id))?;
    req.clone().retarget(&mut preview);
    ensure_transfer_is_internal(preview.relation_type, preview.external_agent_id.as_deref())?;

    let relation = agent_relations::update_agent_relation(store.as_ref(), &graph, &id, req).await?;
    Ok(ok(relation))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agent-relations/{id}",
    tag = "Agent Relations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("id" = String, Path, description = "Relation id"),
    ),
    responses(
        (status = 204, description = "Relation deleted"),
        (status = 404, description = "Relation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_agent_relation(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = agent_relations::delete_agent_relation(store.as_ref(), &graph, &id).await?;
    deleted(removed, "AgentRelation", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agent_relations).post(create_agent_relation))
        .route(
            "/:id",
            get(get_agent_relation)
                .put(update_agent_relation)
                .delete(delete_agent_relation),
        )
}
