//! API Key REST API Routes
//!
//! Keys are issued per graph. The plaintext key appears once, in the create
//! response; every other response carries only the prefix.

use agents_core::ApiKeyUpdate;
use agents_storage::access::{agent_graphs, api_keys};
use agents_storage::SharedStore;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::{created, deleted, ok};
use crate::{
    auth::{AuthContext, AuthMethod},
    error::{ApiError, ApiResult},
    extractors::{PathId, ProjectPath},
    middleware::AuthExtractor,
    state::AppState,
    types::{ApiKeyQuery, ApiKeyResponse, CreateApiKeyRequest, CreateApiKeyResponse, ListResponse},
    validation::HasUpdates,
};

/// A caller holding an API key cannot manage keys.
fn ensure_can_manage_keys(auth: &AuthContext) -> ApiResult<()> {
    if auth.auth_method == AuthMethod::ApiKey {
        return Err(ApiError::forbidden("API keys cannot manage API keys"));
    }
    Ok(())
}

/// GET /tenants/{tenant_id}/projects/{project_id}/api-keys
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/api-keys",
    tag = "API Keys",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ApiKeyQuery,
    ),
    responses(
        (status = 200, description = "API keys, without their secrets", body = ListResponse<ApiKeyResponse>),
        (status = 403, description = "Caller authenticated with an API key", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_api_keys(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    AuthExtractor(auth): AuthExtractor,
    Query(query): Query<ApiKeyQuery>,
) -> ApiResult<impl IntoResponse> {
    ensure_can_manage_keys(&auth)?;
    let page = api_keys::list_api_keys_paginated(
        store.as_ref(),
        &project,
        query.pagination()?,
        query.graph_id.as_deref(),
    )
    .await?;
    Ok(Json(ListResponse::from(page.map(ApiKeyResponse::from))))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/api-keys
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/api-keys",
    tag = "API Keys",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API key issued", body = crate::types::DataResponse<CreateApiKeyResponse>),
        (status = 403, description = "Caller authenticated with an API key", body = crate::error::ProblemDetails),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_api_key(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateApiKeyRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_can_manage_keys(&auth)?;
    agents_core::validate_resource_id("graph_id", &req.graph_id)?;
    let graph = project.graph(req.graph_id.clone());
    if !agent_graphs::agent_graph_exists(store.as_ref(), &graph).await? {
        return Err(ApiError::entity_not_found("AgentGraph", &req.graph_id));
    }

    let issued = api_keys::create_api_key(store.as_ref(), &graph, req.name, req.expires_at).await?;
    tracing::info!(
        project = %project,
        graph_id = %graph.graph_id,
        public_id = %issued.api_key.public_id,
        "Issued API key"
    );
    Ok(created(CreateApiKeyResponse {
        api_key: ApiKeyResponse::from(issued.api_key),
        key: issued.key,
    }))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/api-keys/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/api-keys/{id}",
    tag = "API Keys",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "API key id"),
    ),
    responses(
        (status = 200, description = "API key", body = crate::types::DataResponse<ApiKeyResponse>),
        (status = 404, description = "API key not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_api_key(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    AuthExtractor(auth): AuthExtractor,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    ensure_can_manage_keys(&auth)?;
    let api_key = api_keys::get_api_key(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("ApiKey", &id))?;
    Ok(ok(ApiKeyResponse::from(api_key)))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/api-keys/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/api-keys/{id}",
    tag = "API Keys",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "API key id"),
    ),
    request_body = ApiKeyUpdate,
    responses(
        (status = 200, description = "API key updated", body = crate::types::DataResponse<ApiKeyResponse>),
        (status = 404, description = "API key not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_api_key(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    AuthExtractor(auth): AuthExtractor,
    PathId(id): PathId,
    Json(req): Json<ApiKeyUpdate>,
) -> ApiResult<impl IntoResponse> {
    ensure_can_manage_keys(&auth)?;
    req.validate_has_updates()?;
    let api_key = api_keys::update_api_key(store.as_ref(), &project, &id, req).await?;
    Ok(ok(ApiKeyResponse::from(api_key)))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/api-keys/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/api-keys/{id}",
    tag = "API Keys",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "API key id"),
    ),
    responses(
        (status = 204, description = "API key revoked"),
        (status = 404, description = "API key not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_api_key(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    AuthExtractor(auth): AuthExtractor,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    ensure_can_manage_keys(&auth)?;
    let removed = api_keys::delete_api_key(store.as_ref(), &project, &id).await?;
    deleted(removed, "ApiKey", &id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route(
            "/:id",
            get(get_api_key).put(update_api_key).delete(delete_api_key),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_callers_cannot_manage_keys() {
        let mut auth = AuthContext::admin("svc", AuthMethod::Jwt);
        assert!(ensure_can_manage_keys(&auth).is_ok());
        auth.auth_method = AuthMethod::ApiKey;
        assert!(ensure_can_manage_keys(&auth).is_err());
    }
}
