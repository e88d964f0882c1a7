//! Artifact Component REST API Routes
//!
//! `summary_props` and `full_props` must be JSON Schema objects when given.

use agents_core::{
    validate_resource_id, ArtifactComponent, ArtifactComponentDefinition, ArtifactComponentUpdate,
};
use agents_storage::access::artifact_components;
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

/// GET /tenants/{tenant_id}/projects/{project_id}/artifact-components
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/artifact-components",
    tag = "Artifact Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Artifact components", body = ListResponse<ArtifactComponent>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_artifact_components(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = artifact_components::list_artifact_components_paginated(
        store.as_ref(),
        &project,
        query.pagination()?,
    )
    .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/artifact-components
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/artifact-components",
    tag = "Artifact Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = ArtifactComponentDefinition,
    responses(
        (status = 201, description = "Artifact component created", body = crate::types::DataResponse<ArtifactComponent>),
        (status = 400, description = "Props are not JSON Schemas", body = crate::error::ProblemDetails),
        (status = 409, description = "Artifact component already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_artifact_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<ArtifactComponentDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    validate_optional_json_schema("summary_props", req.summary_props.as_ref())?;
    validate_optional_json_schema("full_props", req.full_props.as_ref())?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let component = artifact_components::create_artifact_component(
        store.as_ref(),
        req.to_entity(&project, Utc::now()),
    )
    .await?;
    Ok(created(component))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}",
    tag = "Artifact Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Artifact component id"),
    ),
    responses(
        (status = 200, description = "Artifact component", body = crate::types::DataResponse<ArtifactComponent>),
        (status = 404, description = "Artifact component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_artifact_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let component = artifact_components::get_artifact_component(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("ArtifactComponent", &id))?;
    Ok(ok(component))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}",
    tag = "Artifact Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Artifact component id"),
    ),
    request_body = ArtifactComponentUpdate,
    responses(
        (status = 200, description = "Artifact component updated", body = crate::types::DataResponse<ArtifactComponent>),
        (status = 404, description = "Artifact component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_artifact_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<ArtifactComponentUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    validate_optional_json_schema("summary_props", req.summary_props.as_ref())?;
    validate_optional_json_schema("full_props", req.full_props.as_ref())?;
    let component =
        artifact_components::update_artifact_component(store.as_ref(), &project, &id, req).await?;
    Ok(ok(component))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/artifact-components/{id}",
    tag = "Artifact Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Artifact component id"),
    ),
    responses(
        (status = 204, description = "Artifact component and its associations deleted"),
        (status = 404, description = "Artifact component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_artifact_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed =
        artifact_components::delete_artifact_component(store.as_ref(), &project, &id).await?;
    deleted(removed, "ArtifactComponent", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_artifact_components).post(create_artifact_component),
        )
        .route(
            "/:id",
            get(get_artifact_component)
                .put(update_artifact_component)
                .delete(delete_artifact_component),
        )
}
