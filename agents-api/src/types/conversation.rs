//! Conversation and Message Request Types

use agents_core::{
    generate_id, Message, MessageContent, MessageRole, MessageType, MessageVisibility,
    ProjectScope, Timestamp,
};
use agents_storage::access::conversations::NewConversation;
use serde::{Deserialize, Serialize};

use super::paginated_query;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateConversationRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub active_agent_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

impl From<CreateConversationRequest> for NewConversation {
    fn from(request: CreateConversationRequest) -> Self {
        NewConversation {
            id: request.id,
            user_id: request.user_id,
            active_agent_id: request.active_agent_id,
            title: request.title,
            metadata: request.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateMessageRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub from_agent_id: Option<String>,
    #[serde(default)]
    pub to_agent_id: Option<String>,
    #[serde(default)]
    pub from_external_agent_id: Option<String>,
    #[serde(default)]
    pub to_external_agent_id: Option<String>,
    pub content: MessageContent,
    #[serde(default)]
    pub visibility: MessageVisibility,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub parent_message_id: Option<String>,
    #[serde(default)]
    pub a2a_task_id: Option<String>,
    #[serde(default)]
    pub a2a_session_id: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

impl CreateMessageRequest {
    pub fn into_entity(
        self,
        project: &ProjectScope,
        conversation_id: &str,
        now: Timestamp,
    ) -> Message {
        Message {
            tenant_id: project.tenant_id.clone(),
            project_id: project.project_id.clone(),
            id: self.id.unwrap_or_else(generate_id),
            conversation_id: conversation_id.to_string(),
            role: self.role,
            from_agent_id: self.from_agent_id,
            to_agent_id: self.to_agent_id,
            from_external_agent_id: self.from_external_agent_id,
            to_external_agent_id: self.to_external_agent_id,
            content: self.content,
            visibility: self.visibility,
            message_type: self.message_type,
            agent_id: self.agent_id,
            task_id: self.task_id,
            parent_message_id: self.parent_message_id,
            a2a_task_id: self.a2a_task_id,
            a2a_session_id: self.a2a_session_id,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

paginated_query! {
    ConversationQuery { user_id: String }
}
