//! Agent Component REST API Routes
//!
//! Associations between one agent and the project's data and artifact
//! components. Associating twice is idempotent.

use agents_core::{ArtifactComponent, DataComponent};
use agents_storage::access::{artifact_components, data_components};
use agents_storage::SharedStore;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use super::{created, deleted, ok};
use crate::{
    error::ApiResult,
    extractors::{AgentPath, ComponentId},
    state::AppState,
    types::AssociateComponentRequest,
    validation::ValidateNonEmpty,
};

// ============================================================================
// DATA COMPONENTS
// ============================================================================

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    responses(
        (status = 200, description = "Data components of the agent", body = crate::types::DataResponse<Vec<DataComponent>>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agent_data_components(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
) -> ApiResult<impl IntoResponse> {
    let components = data_components::get_data_components_for_agent(store.as_ref(), &agent).await?;
    Ok(ok(components))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    request_body = AssociateComponentRequest,
    responses(
        (status = 201, description = "Data component associated", body = crate::types::DataResponse<agents_core::AgentDataComponent>),
        (status = 422, description = "Agent or component does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn associate_data_component(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
    Json(req): Json<AssociateComponentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.component_id.validate_non_empty("component_id")?;
    let association =
        data_components::associate_data_component_with_agent(store.as_ref(), &agent, &req.component_id)
            .await?;
    Ok(created(association))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components/{component_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/data-components/{component_id}",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
        ("component_id" = String, Path, description = "Data component id"),
    ),
    responses(
        (status = 204, description = "Association removed"),
        (status = 404, description = "Association not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn remove_data_component(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
    ComponentId(component_id): ComponentId,
) -> ApiResult<impl IntoResponse> {
    let removed =
        data_components::remove_data_component_from_agent(store.as_ref(), &agent, &component_id)
            .await?;
    deleted(removed, "AgentDataComponent", &component_id)
}

// ============================================================================
// ARTIFACT COMPONENTS
// ============================================================================

/// GET /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    responses(
        (status = 200, description = "Artifact components of the agent", body = crate::types::DataResponse<Vec<ArtifactComponent>>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_agent_artifact_components(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
) -> ApiResult<impl IntoResponse> {
    let components =
        artifact_components::get_artifact_components_for_agent(store.as_ref(), &agent).await?;
    Ok(ok(components))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
    ),
    request_body = AssociateComponentRequest,
    responses(
        (status = 201, description = "Artifact component associated", body = crate::types::DataResponse<agents_core::AgentArtifactComponent>),
        (status = 422, description = "Agent or component does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn associate_artifact_component(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
    Json(req): Json<AssociateComponentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.component_id.validate_non_empty("component_id")?;
    let association = artifact_components::associate_artifact_component_with_agent(
        store.as_ref(),
        &agent,
        &req.component_id,
    )
    .await?;
    Ok(created(association))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components/{component_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graphs/{graph_id}/agents/{agent_id}/artifact-components/{component_id}",
    tag = "Agent Components",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
        ("agent_id" = String, Path, description = "Agent id"),
        ("component_id" = String, Path, description = "Artifact component id"),
    ),
    responses(
        (status = 204, description = "Association removed"),
        (status = 404, description = "Association not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn remove_artifact_component(
    State(store): State<SharedStore>,
    AgentPath(agent): AgentPath,
    ComponentId(component_id): ComponentId,
) -> ApiResult<impl IntoResponse> {
    let removed = artifact_components::remove_artifact_component_from_agent(
        store.as_ref(),
        &agent,
        &component_id,
    )
    .await?;
    deleted(removed, "AgentArtifactComponent", &component_id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/data-components",
            get(list_agent_data_components).post(associate_data_component),
        )
        .route(
            "/data-components/:component_id",
            delete(remove_data_component),
        )
        .route(
            "/artifact-components",
            get(list_agent_artifact_components).post(associate_artifact_component),
        )
        .route(
            "/artifact-components/:component_id",
            delete(remove_artifact_component),
        )
}
