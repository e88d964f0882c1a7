//! Project REST API Routes

use agents_core::{validate_resource_id, Paginated, Project, ProjectUpdate};
use agents_storage::access::projects;
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
    auth::ensure_project_access,
    error::{ApiError, ApiResult},
    extractors::{ProjectPath, TenantPath},
    middleware::AuthExtractor,
    state::AppState,
    types::{CreateProjectRequest, ListResponse, PaginationQuery},
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects
///
/// A key bound to one project only sees that project.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects",
    tag = "Projects",
    params(("tenant_id" = String, Path, description = "Tenant id"), PaginationQuery),
    responses(
        (status = 200, description = "Projects", body = ListResponse<Project>),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_projects(
    State(store): State<SharedStore>,
    TenantPath(tenant): TenantPath,
    AuthExtractor(auth): AuthExtractor,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination()?;
    let page = match auth.project_id.as_deref() {
        Some(project_id) => {
            let visible: Vec<Project> = projects::get_project(store.as_ref(), &tenant.project(project_id))
                .await?
                .into_iter()
                .collect();
            let total = visible.len() as u64;
            let data = visible
                .into_iter()
                .skip(pagination.offset() as usize)
                .take(pagination.limit as usize)
                .collect();
            Paginated::new(data, pagination, total)
        }
        None => projects::list_projects_paginated(store.as_ref(), &tenant, pagination).await?,
    };
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects",
    tag = "Projects",
    params(("tenant_id" = String, Path, description = "Tenant id")),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = crate::types::DataResponse<Project>),
        (status = 400, description = "Invalid request", body = crate::error::ProblemDetails),
        (status = 409, description = "Project already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_project(
    State(store): State<SharedStore>,
    TenantPath(tenant): TenantPath,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.name.validate_non_empty("name")?;
    ensure_project_access(&auth, &tenant.tenant_id, &req.id)?;

    let project = projects::create_project(store.as_ref(), req.into_entity(&tenant, Utc::now())).await?;
    tracing::info!(tenant = %tenant, project_id = %project.id, "Created project");
    Ok(created(project))
}

/// GET /tenants/{tenant_id}/projects/{project_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}",
    tag = "Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    responses(
        (status = 200, description = "Project", body = crate::types::DataResponse<Project>),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_project(
    State(store): State<SharedStore>,
    ProjectPath(scope): ProjectPath,
) -> ApiResult<impl IntoResponse> {
    let project = projects::get_project(store.as_ref(), &scope)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Project", &scope.project_id))?;
    Ok(ok(project))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}",
    tag = "Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Project updated", body = crate::types::DataResponse<Project>),
        (status = 400, description = "Empty update", body = crate::error::ProblemDetails),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_project(
    State(store): State<SharedStore>,
    ProjectPath(scope): ProjectPath,
    Json(req): Json<ProjectUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    if let Some(name) = &req.name {
        name.validate_non_empty("name")?;
    }
    let project = projects::update_project(store.as_ref(), &scope, req).await?;
    Ok(ok(project))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}
///
/// Removes every row scoped to the project.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}",
    tag = "Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_project(
    State(store): State<SharedStore>,
    ProjectPath(scope): ProjectPath,
) -> ApiResult<impl IntoResponse> {
    let removed = projects::delete_project(store.as_ref(), &scope).await?;
    deleted(removed, "Project", &scope.project_id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
}
