//! Context Config REST API Routes

use agents_core::{validate_resource_id, ContextConfig, ContextConfigDefinition, ContextConfigUpdate};
use agents_storage::access::context_configs;
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
    extractors::{PathId, ProjectPath},
    state::AppState,
    types::{ListResponse, PaginationQuery},
    validation::{validate_optional_json_schema, HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/context-configs
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/context-configs",
    tag = "Context Configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Context configs", body = ListResponse<ContextConfig>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_context_configs(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page =
        context_configs::list_context_configs_paginated(store.as_ref(), &project, query.pagination()?)
            .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/context-configs
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/context-configs",
    tag = "Context Configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = ContextConfigDefinition,
    responses(
        (status = 201, description = "Context config created", body = crate::types::DataResponse<ContextConfig>),
        (status = 409, description = "Context config already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_context_config(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<ContextConfigDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    validate_optional_json_schema("request_context_schema", req.request_context_schema.as_ref())?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let config =
        context_configs::create_context_config(store.as_ref(), req.to_entity(&project, Utc::now()))
            .await?;
    Ok(created(config))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/context-configs/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/context-configs/{id}",
    tag = "Context Configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Context config id"),
    ),
    responses(
        (status = 200, description = "Context config", body = crate::types::DataResponse<ContextConfig>),
        (status = 404, description = "Context config not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_context_config(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let config = context_configs::get_context_config(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("ContextConfig", &id))?;
    Ok(ok(config))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/context-configs/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/context-configs/{id}",
    tag = "Context Configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Context config id"),
    ),
    request_body = ContextConfigUpdate,
    responses(
        (status = 200, description = "Context config updated", body = crate::types::DataResponse<ContextConfig>),
        (status = 404, description = "Context config not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_context_config(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<ContextConfigUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    validate_optional_json_schema("request_context_schema", req.request_context_schema.as_ref())?;
    let config = context_configs::update_context_config(store.as_ref(), &project, &id, req).await?;
    Ok(ok(config))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/context-configs/{id}
///
/// Graphs pointing at the config are detached from it.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/context-configs/{id}",
    tag = "Context Configs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Context config id"),
    ),
    responses(
        (status = 204, description = "Context config deleted"),
        (status = 404, description = "Context config not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_context_config(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = context_configs::delete_context_config(store.as_ref(), &project, &id).await?;
    deleted(removed, "ContextConfig", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_context_configs).post(create_context_config))
        .route(
            "/:id",
            get(get_context_config)
                .put(update_context_config)
                .delete(delete_context_config),
        )
}
