//! Tool REST API Routes
//!
//! MCP tool servers registered in a project. Health fields are written only
//! through the status endpoint.

use agents_core::{validate_resource_id, ProjectScope, Tool, ToolDefinition, ToolUpdate};
use agents_storage::access::{credential_references, tools};
use agents_storage::{SharedStore, Store};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use super::{created, deleted, ensure_project_exists, ok};
use crate::{
    error::{ApiError, ApiResult},
    extractors::{PathId, ProjectPath},
    state::AppState,
    types::{ListResponse, ToolQuery, UpdateToolStatusRequest},
    validation::{HasUpdates, ValidateNonEmpty},
};

async fn ensure_credential_exists(
    store: &dyn Store,
    project: &ProjectScope,
    credential_id: Option<&str>,
) -> ApiResult<()> {
    let Some(credential_id) = credential_id else {
        return Ok(());
    };
    if credential_references::get_credential_reference(store, project, credential_id)
        .await?
        .is_none()
    {
        return Err(ApiError::unprocessable(format!(
            "Credential reference '{}' does not exist",
            credential_id
        )));
    }
    Ok(())
}

/// GET /tenants/{tenant_id}/projects/{project_id}/tools
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ToolQuery,
    ),
    responses(
        (status = 200, description = "Tools in the project", body = ListResponse<Tool>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_tools(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<ToolQuery>,
) -> ApiResult<impl IntoResponse> {
    let page =
        tools::list_tools_paginated(store.as_ref(), &project, query.pagination()?, query.status)
            .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/tools
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = ToolDefinition,
    responses(
        (status = 201, description = "Tool created", body = crate::types::DataResponse<Tool>),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
        (status = 409, description = "Tool already exists", body = crate::error::ProblemDetails),
        (status = 422, description = "Credential reference does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_tool(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<ToolDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    req.config.server_url.validate_non_empty("config.server_url")?;
    ensure_project_exists(store.as_ref(), &project).await?;
    ensure_credential_exists(store.as_ref(), &project, req.credential_reference_id.as_deref())
        .await?;

    let tool = tools::create_tool(store.as_ref(), req.to_entity(&project, Utc::now())).await?;
    Ok(created(tool))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/tools/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools/{id}",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Tool id"),
    ),
    responses(
        (status = 200, description = "Tool", body = crate::types::DataResponse<Tool>),
        (status = 404, description = "Tool not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_tool(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let tool = tools::get_tool(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Tool", &id))?;
    Ok(ok(tool))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/tools/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools/{id}",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Tool id"),
    ),
    request_body = ToolUpdate,
    responses(
        (status = 200, description = "Tool updated", body = crate::types::DataResponse<Tool>),
        (status = 404, description = "Tool not found", body = crate::error::ProblemDetails),
        (status = 422, description = "Credential reference does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_tool(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<ToolUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    ensure_credential_exists(store.as_ref(), &project, req.credential_reference_id.as_deref())
        .await?;
    let tool = tools::update_tool(store.as_ref(), &project, &id, req).await?;
    Ok(ok(tool))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/tools/{id}/status
///
/// Records a health check result. A reported tool list replaces the cached one.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools/{id}/status",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Tool id"),
    ),
    request_body = UpdateToolStatusRequest,
    responses(
        (status = 200, description = "Health recorded", body = crate::types::DataResponse<Tool>),
        (status = 404, description = "Tool not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_tool_status(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<UpdateToolStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let tool = tools::update_tool_status(store.as_ref(), &project, &id, req.into()).await?;
    tracing::debug!(tool_id = %id, status = tool.status.as_str(), "Recorded tool health");
    Ok(ok(tool))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/tools/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/tools/{id}",
    tag = "Tools",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Tool id"),
    ),
    responses(
        (status = 204, description = "Tool and its grants deleted"),
        (status = 404, description = "Tool not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_tool(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = tools::delete_tool(store.as_ref(), &project, &id).await?;
    deleted(removed, "Tool", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tools).post(create_tool))
        .route("/:id", get(get_tool).put(update_tool).delete(delete_tool))
        .route("/:id/status", put(update_tool_status))
}
