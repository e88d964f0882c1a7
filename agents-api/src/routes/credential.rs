//! Credential Reference REST API Routes
//!
//! Only references are stored. Secret material stays in the named
//! credential store.

use agents_core::{
    validate_resource_id, CredentialReference, CredentialReferenceDefinition,
    CredentialReferenceUpdate,
};
use agents_storage::access::credential_references;
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
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/credentials
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/credentials",
    tag = "Credentials",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Credential references", body = ListResponse<CredentialReference>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_credentials(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = credential_references::list_credential_references_paginated(
        store.as_ref(),
        &project,
        query.pagination()?,
    )
    .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/credentials
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/credentials",
    tag = "Credentials",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = CredentialReferenceDefinition,
    responses(
        (status = 201, description = "Credential reference created", body = crate::types::DataResponse<CredentialReference>),
        (status = 409, description = "Credential reference already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_credential(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<CredentialReferenceDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &req.id)?;
    req.credential_store_id.validate_non_empty("credential_store_id")?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let credential = credential_references::create_credential_reference(
        store.as_ref(),
        req.to_entity(&project, Utc::now()),
    )
    .await?;
    Ok(created(credential))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/credentials/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/credentials/{id}",
    tag = "Credentials",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Credential reference id"),
    ),
    responses(
        (status = 200, description = "Credential reference", body = crate::types::DataResponse<CredentialReference>),
        (status = 404, description = "Credential reference not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_credential(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let credential = credential_references::get_credential_reference(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("CredentialReference", &id))?;
    Ok(ok(credential))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/credentials/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/credentials/{id}",
    tag = "Credentials",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Credential reference id"),
    ),
    request_body = CredentialReferenceUpdate,
    responses(
        (status = 200, description = "Credential reference updated", body = crate::types::DataResponse<CredentialReference>),
        (status = 404, description = "Credential reference not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_credential(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<CredentialReferenceUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    let credential =
        credential_references::update_credential_reference(store.as_ref(), &project, &id, req)
            .await?;
    Ok(ok(credential))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/credentials/{id}
///
/// Tools and external agents using the reference are detached from it.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/credentials/{id}",
    tag = "Credentials",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Credential reference id"),
    ),
    responses(
        (status = 204, description = "Credential reference deleted"),
        (status = 404, description = "Credential reference not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_credential(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed =
        credential_references::delete_credential_reference(store.as_ref(), &project, &id).await?;
    deleted(removed, "CredentialReference", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_credentials).post(create_credential))
        .route(
            "/:id",
            get(get_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
}
