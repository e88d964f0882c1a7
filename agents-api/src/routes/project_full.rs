//! Full Project REST API Routes

use agents_core::{validate_resource_id, FullProjectDefinition};
use agents_storage::SharedStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use super::{deleted, ok};
use crate::{
    auth::ensure_project_access,
    error::{ApiError, ApiResult},
    extractors::{ProjectPath, TenantPath},
    middleware::AuthExtractor,
    services::{self, ProjectOutcome},
    state::AppState,
    types::DataResponse,
};

fn outcome_response(
    outcome: ProjectOutcome,
) -> (StatusCode, Json<DataResponse<FullProjectDefinition>>) {
    let failures = outcome.failure_count();
    if failures > 0 {
        tracing::warn!(
            project_id = %outcome.project.id,
            failures,
            graphs = ?outcome.failures.keys().collect::<Vec<_>>(),
            "Full project written with wiring failures"
        );
    }
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(DataResponse::new(outcome.project)))
}

/// POST /tenants/{tenant_id}/project-full
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/project-full",
    tag = "Full Projects",
    params(("tenant_id" = String, Path, description = "Tenant id")),
    request_body = FullProjectDefinition,
    responses(
        (status = 201, description = "Project created", body = DataResponse<FullProjectDefinition>),
        (status = 400, description = "Invalid project definition", body = crate::error::ProblemDetails),
        (status = 409, description = "Project already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_full_project(
    State(store): State<SharedStore>,
    TenantPath(tenant): TenantPath,
    AuthExtractor(auth): AuthExtractor,
    Json(body): Json<FullProjectDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &body.id)?;
    ensure_project_access(&auth, &tenant.tenant_id, &body.id)?;
    let outcome = services::create_full_project(store.as_ref(), &tenant, &body).await?;
    Ok(outcome_response(outcome))
}

/// GET /tenants/{tenant_id}/project-full/{project_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/project-full/{project_id}",
    tag = "Full Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    responses(
        (status = 200, description = "Project with resources and graphs", body = DataResponse<FullProjectDefinition>),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_full_project(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
) -> ApiResult<impl IntoResponse> {
    let definition = services::get_full_project(store.as_ref(), &project)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Project", &project.project_id))?;
    Ok(ok(definition))
}

/// PUT /tenants/{tenant_id}/project-full/{project_id}
///
/// Creates the project when it does not exist. Graphs missing from the body
/// are deleted; project-level resources missing from it are kept.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/project-full/{project_id}",
    tag = "Full Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = FullProjectDefinition,
    responses(
        (status = 200, description = "Project updated", body = DataResponse<FullProjectDefinition>),
        (status = 201, description = "Project created", body = DataResponse<FullProjectDefinition>),
        (status = 400, description = "Invalid definition or id mismatch", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_full_project(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(body): Json<FullProjectDefinition>,
) -> ApiResult<impl IntoResponse> {
    crate::ensure_ids_match!("id", project.project_id.as_str(), Some(body.id.as_str()));
    let outcome = services::update_full_project(store.as_ref(), &project, &body).await?;
    Ok(outcome_response(outcome))
}

/// DELETE /tenants/{tenant_id}/project-full/{project_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/project-full/{project_id}",
    tag = "Full Projects",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    responses(
        (status = 204, description = "Project and everything in it deleted"),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_full_project(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
) -> ApiResult<impl IntoResponse> {
    let removed = services::delete_full_project(store.as_ref(), &project).await?;
    deleted(removed, "Project", &project.project_id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_full_project))
        .route(
            "/:project_id",
            get(get_full_project)
                .put(update_full_project)
                .delete(delete_full_project),
        )
}
