//! Conversations and their messages.
//!
//! Conversations are stored and served only; nothing here routes messages
//! between agents.

use agents_core::{
    generate_id, AgentsError, AgentsResult, Conversation, ConversationUpdate, Message,
    MessageVisibility, Paginated, Pagination, ProjectScope,
};
use chrono::Utc;

use crate::repository;
use crate::store::Store;
use crate::table::{Filter, Page, MESSAGES};

fn key(scope: &ProjectScope, conversation_id: &str) -> Filter {
    Filter::project(scope).with("id", conversation_id)
}

fn messages_of(scope: &ProjectScope, conversation_id: &str) -> Filter {
    Filter::project(scope).with("conversation_id", conversation_id)
}

/// Fields for starting a conversation. `id` is generated when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewConversation {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub active_agent_id: String,
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Options for reading conversation history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryOptions {
    /// Most recent messages to return. `None` returns all.
    pub limit: Option<u64>,
    /// Only messages with one of these visibilities. `None` returns all.
    pub visibility: Option<Vec<MessageVisibility>>,
}

// ============================================================================
// CONVERSATIONS
// ============================================================================

pub async fn get_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
) -> AgentsResult<Option<Conversation>> {
    repository::get(store, &key(scope, conversation_id)).await
}

/// Page through conversations, optionally only those of one user.
pub async fn list_conversations_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
    user_id: Option<&str>,
) -> AgentsResult<Paginated<Conversation>> {
    let mut filter = Filter::project(scope);
    if let Some(user_id) = user_id {
        filter = filter.with("user_id", user_id);
    }
    repository::list_paginated(store, &filter, pagination).await
}

pub async fn create_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    new: NewConversation,
) -> AgentsResult<Conversation> {
    let now = Utc::now();
    repository::create(
        store,
        Conversation {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: new.id.unwrap_or_else(generate_id),
            user_id: new.user_id,
            active_agent_id: new.active_agent_id,
            title: new.title,
            last_context_resolution: None,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        },
    )
    .await
}

/// Return the conversation with the requested id, creating it first when it
/// does not exist.
pub async fn create_or_get_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    new: NewConversation,
) -> AgentsResult<Conversation> {
    if let Some(id) = new.id.as_deref() {
        if let Some(existing) = get_conversation(store, scope, id).await? {
            return Ok(existing);
        }
    }
    match create_conversation(store, scope, new.clone()).await {
        Err(err) if err.is_conflict() => {
            let id = new.id.unwrap_or_default();
            get_conversation(store, scope, &id)
                .await?
                .ok_or_else(|| AgentsError::not_found("Conversation", id))
        }
        other => other,
    }
}

pub async fn update_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
    update: ConversationUpdate,
) -> AgentsResult<Conversation> {
    repository::update(
        store,
        &key(scope, conversation_id),
        |conversation: &mut Conversation| update.apply(conversation),
    )
    .await
}

pub async fn set_active_agent_for_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
    agent_id: &str,
) -> AgentsResult<Conversation> {
    let agent_id = agent_id.to_string();
    repository::update(
        store,
        &key(scope, conversation_id),
        move |conversation: &mut Conversation| conversation.active_agent_id = agent_id,
    )
    .await
}

pub async fn get_active_agent_for_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
) -> AgentsResult<Option<String>> {
    Ok(get_conversation(store, scope, conversation_id)
        .await?
        .map(|conversation| conversation.active_agent_id))
}

/// Delete a conversation and its messages.
pub async fn delete_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
) -> AgentsResult<bool> {
    store
        .delete(&MESSAGES, &messages_of(scope, conversation_id))
        .await?;
    Ok(repository::delete::<Conversation>(store, &key(scope, conversation_id)).await? > 0)
}

// ============================================================================
// MESSAGES
// ============================================================================

pub async fn create_message(store: &dyn Store, message: Message) -> AgentsResult<Message> {
    let scope = ProjectScope::new(message.tenant_id.clone(), message.project_id.clone());
    if get_conversation(store, &scope, &message.conversation_id)
        .await?
        .is_none()
    {
        return Err(agents_core::StorageError::MissingReference {
            entity: "Conversation",
            id: message.conversation_id.clone(),
        }
        .into());
    }
    repository::create(store, message).await
}

pub async fn get_message(
    store: &dyn Store,
    scope: &ProjectScope,
    message_id: &str,
) -> AgentsResult<Option<Message>> {
    repository::get(store, &Filter::project(scope).with("id", message_id)).await
}

/// Messages of a conversation, oldest first.
pub async fn list_messages(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
    pagination: Pagination,
) -> AgentsResult<Paginated<Message>> {
    repository::list_paginated(store, &messages_of(scope, conversation_id), pagination).await
}

/// The most recent messages of a conversation, returned oldest first.
pub async fn get_conversation_history(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
    options: HistoryOptions,
) -> AgentsResult<Vec<Message>> {
    let filter = messages_of(scope, conversation_id);
    let mut messages: Vec<Message> = match (&options.visibility, options.limit) {
        // Without a visibility filter the window can be pushed to the store.
        (None, Some(limit)) => {
            let total = store.count(&MESSAGES, &filter).await?;
            let page = Page {
                offset: total.saturating_sub(limit),
                limit,
            };
            store
                .select(&MESSAGES, &filter, Some(page))
                .await?
                .into_iter()
                .map(<Message as crate::component::Component>::from_record)
                .collect::<AgentsResult<_>>()?
        }
        _ => repository::list(store, &filter).await?,
    };
    if let Some(visibility) = &options.visibility {
        messages.retain(|message| visibility.contains(&message.visibility));
        if let Some(limit) = options.limit {
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            let excess = messages.len().saturating_sub(limit);
            messages.drain(..excess);
        }
    }
    Ok(messages)
}

pub async fn delete_message(
    store: &dyn Store,
    scope: &ProjectScope,
    message_id: &str,
) -> AgentsResult<bool> {
    Ok(repository::delete::<Message>(store, &Filter::project(scope).with("id", message_id)).await? > 0)
}

pub async fn count_messages_by_conversation(
    store: &dyn Store,
    scope: &ProjectScope,
    conversation_id: &str,
) -> AgentsResult<u64> {
    store.count(&MESSAGES, &messages_of(scope, conversation_id)).await
}
