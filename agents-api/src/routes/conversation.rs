//! Conversation REST API Routes
//!
//! Storage and retrieval of conversations and their messages. Nothing here
//! runs an agent.

use agents_core::{validate_resource_id, Conversation, ConversationUpdate, Message};
use agents_storage::access::conversations;
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
    types::{
        ConversationQuery, CreateConversationRequest, CreateMessageRequest, ListResponse,
        PaginationQuery,
    },
    validation::{HasUpdates, ValidateNonEmpty},
};

/// GET /tenants/{tenant_id}/projects/{project_id}/conversations
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ConversationQuery,
    ),
    responses(
        (status = 200, description = "Conversations", body = ListResponse<Conversation>),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_conversations(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = conversations::list_conversations_paginated(
        store.as_ref(),
        &project,
        query.pagination()?,
        query.user_id.as_deref(),
    )
    .await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/conversations
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
    ),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = crate::types::DataResponse<Conversation>),
        (status = 409, description = "Conversation already exists", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_conversation(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(id) = &req.id {
        validate_resource_id("id", id)?;
    }
    req.active_agent_id.validate_non_empty("active_agent_id")?;
    ensure_project_exists(store.as_ref(), &project).await?;

    let conversation =
        conversations::create_conversation(store.as_ref(), &project, req.into()).await?;
    Ok(created(conversation))
}

/// GET /tenants/{tenant_id}/projects/{project_id}/conversations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations/{id}",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Conversation id"),
    ),
    responses(
        (status = 200, description = "Conversation", body = crate::types::DataResponse<Conversation>),
        (status = 404, description = "Conversation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn get_conversation(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let conversation = conversations::get_conversation(store.as_ref(), &project, &id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Conversation", &id))?;
    Ok(ok(conversation))
}

/// PUT /tenants/{tenant_id}/projects/{project_id}/conversations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations/{id}",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Conversation id"),
    ),
    request_body = ConversationUpdate,
    responses(
        (status = 200, description = "Conversation updated", body = crate::types::DataResponse<Conversation>),
        (status = 404, description = "Conversation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn update_conversation(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<ConversationUpdate>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;
    let conversation = conversations::update_conversation(store.as_ref(), &project, &id, req).await?;
    Ok(ok(conversation))
}

/// DELETE /tenants/{tenant_id}/projects/{project_id}/conversations/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations/{id}",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Conversation id"),
    ),
    responses(
        (status = 204, description = "Conversation and its messages deleted"),
        (status = 404, description = "Conversation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn delete_conversation(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let removed = conversations::delete_conversation(store.as_ref(), &project, &id).await?;
    deleted(removed, "Conversation", &id)
}

// ============================================================================
// MESSAGES
// ============================================================================

/// GET /tenants/{tenant_id}/projects/{project_id}/conversations/{id}/messages
///
/// Oldest first.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations/{id}/messages",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Conversation id"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Messages", body = ListResponse<Message>),
        (status = 404, description = "Conversation not found", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn list_messages(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<impl IntoResponse> {
    if conversations::get_conversation(store.as_ref(), &project, &id)
        .await?
        .is_none()
    {
        return Err(ApiError::entity_not_found("Conversation", &id));
    }
    let page =
        conversations::list_messages(store.as_ref(), &project, &id, query.pagination()?).await?;
    Ok(Json(ListResponse::from(page)))
}

/// POST /tenants/{tenant_id}/projects/{project_id}/conversations/{id}/messages
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tenants/{tenant_id}/projects/{project_id}/conversations/{id}/messages",
    tag = "Conversations",
    params(
        ("tenant_id" = String, Path, description = "Tenant id"),
        ("project_id" = String, Path, description = "Project id"),
        ("id" = String, Path, description = "Conversation id"),
    ),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message appended", body = crate::types::DataResponse<Message>),
        (status = 422, description = "Conversation does not exist", body = crate::error::ProblemDetails),
    ),
    security(("api_key" = []), ("bearer_auth" = []))
))]
pub async fn create_message(
    State(store): State<SharedStore>,
    ProjectPath(project): ProjectPath,
    PathId(id): PathId,
    Json(req): Json<CreateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(message_id) = &req.id {
        validate_resource_id("id", message_id)?;
    }
    let message =
        conversations::create_message(store.as_ref(), req.into_entity(&project, &id, Utc::now()))
            .await?;
    Ok(created(message))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations).post(create_conversation))
        .route(
            "/:id",
            get(get_conversation)
                .put(update_conversation)
                .delete(delete_conversation),
        )
        .route("/:id/messages", get(list_messages).post(create_message))
}
