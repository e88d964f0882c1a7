//! Data Component REST API Routes

use agents_core::{validate_resource_id, DataComponent, DataComponentDefinition, DataComponentUpdate};
use agents_storage::access::data_components;
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
    validation::{validate_json_schema, HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/data-components
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/data-components",
    tag = "Data Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Data components", body = ListResponse<DataComponent>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_data_components(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page =
        data_components::list_data_components_paginated(store.as_ref(), &project, query.pagination()?)
            .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/data-components
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/data-components",
    tag = "Data Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = DataComponentDefinition,
    responses(
        (status = 201, description = "Data component created", body = crate::types::DataResponse<DataComponent>),
        (status = 400, description = "Props is not a JSON Schema", body = crate::error::ProblemDetails),
        (status = 409, description = "Data component already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_data_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<DataComponentDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    validate_json_schema("props", &req.props)?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let component =
        data_components::create_data_component(store.as_ref(), req.to_entity(&project, Utc::now()))
            .await?;
    Ok(created(component))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/data-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/data-components/{id}",
    tag = "Data Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Data component id"),
    ),
    responses(
        (status = 200, description = "Data component", body = crate::types::DataResponse<DataComponent>),
        (status = 404, description = "Data component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_data_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let component = data_components::get_data_component(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("DataComponent", &id))?;
    Ok(ok(component))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/data-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/data-components/{id}",
    tag = "Data Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Data component id"),
    ),
    request_body = DataComponentUpdate,
    responses(
        (status = 200, description = "Data component updated", body = crate::types::DataResponse<DataComponent>),
        (status = 404, description = "Data component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_data_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<DataComponentUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    if let Some(props) = &req.props {
        validate_json_schema("props", props)?;
    }
    let component = data_components::update_data_component(store.as_ref(), &project, &id, req).await?;
    Ok(ok(component))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/data-components/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/data-components/{id}",
    tag = "Data Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Data component id"),
    ),
    responses(
        (status = 204, description = "Data component and its associations deleted"),
        (status = 404, description = "Data component not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_data_component(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = data_components::delete_data_component(store.as_ref(), &project, &id).await?;
    deleted(removed, "DataComponent", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_data_components).post(create_data_component))
        .route(
            "/:id",
            get(get_data_component)
                .put(update_data_component)
                .delete(delete_data_component),
        )
}
