//! Full Graph REST API Routes
//!
//! Whole-graph documents. Writes return the graph as read back from storage;
//! wiring that could not be written is logged and left out of it.

use agents_core::{validate_resource_id, FullGraphDefinition};
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
    error::{ApiError, ApiResult},
    extractors::{GraphPath, ProjectPath},
    services::{self, GraphOutcome},
    state::AppState,
    types::DataResponse,
};

/// 201 for a graph that did not exist before, 200 otherwise.
fn outcome_response(outcome: GraphOutcome) -> (StatusCode, Json<DataResponse<FullGraphDefinition>>) {
    if !outcome.failures.is_empty() {
        tracing::warn!(
            graph_id = %outcome.graph.id,
            failures = outcome.failures.len(),
            "Full graph written with wiring failures"
        );
    }
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(DataResponse::new(outcome.graph)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/graph
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/graph",
    tag = "Full Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = FullGraphDefinition,
    responses(
        (status = 201, description = "Graph created", body = DataResponse<FullGraphDefinition>),
        (status = 400, description = "Invalid graph definition", body = crate::error::ProblemDetails),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
        (status = 409, description = "Graph already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_full_graph(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(body): Json<FullGraphDefinition>,
) -> ApiResult<impl IntoResponse> {
    validate_resource_id("id", &body.id)?;
    let outcome = services::create_full_graph(store.as_ref(), &project, &body).await?;
    Ok(outcome_response(outcome))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}",
    tag = "Full Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    responses(
        (status = 200, description = "Graph with agents and resources", body = DataResponse<FullGraphDefinition>),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_full_graph(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
) -> ApiResult<impl IntoResponse> {
    let definition = services::get_full_graph(store.as_ref(), &graph)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("AgentGraph", &graph.graph_id))?;
    Ok(ok(definition))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}
///
/// Creates the graph when it does not exist.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}",
    tag = "Full Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    request_body = FullGraphDefinition,
    responses(
        (status = 200, description = "Graph updated", body = DataResponse<FullGraphDefinition>),
        (status = 201, description = "Graph created", body = DataResponse<FullGraphDefinition>),
        (status = 400, description = "Invalid definition or id mismatch", body = crate::error::ProblemDetails),
        (status = 404, description = "Project not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_full_graph(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
    Json(body): Json<FullGraphDefinition>,
) -> ApiResult<impl IntoResponse> {
    crate::ensure_ids_match!("id", graph.graph_id.as_str(), Some(body.id.as_str()));
    let outcome = services::update_full_graph(store.as_ref(), &graph.project(), &body).await?;
    Ok(outcome_response(outcome))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}
///
/// Project-level tools, components and credentials are kept.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}",
    tag = "Full Graphs",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("graph_id" = String, Path, description = "Graph id"),
    ),
    responses(
        (status = 204, description = "Graph deleted"),
        (status = 404, description = "Graph not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_full_graph(
    State(store): State<SharedStore>,
    GraphPath(graph): GraphPath,
) -> ApiResult<impl IntoResponse> {
    let removed = services::delete_full_graph(store.as_ref(), &graph).await?;
    deleted(removed, "AgentGraph", &graph.graph_id)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_full_graph))
        .route(
            "/:graph_id",
            get(get_full_graph)
                .put(update_full_graph)
                .delete(delete_full_graph),
        )
}
