//! Stored entities.
//!
//! Each struct mirrors one relational table: scope columns first, then the
//! resource id, then payload columns, then timestamps. Field names are the
//! column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::enums::{
    CredentialStoreType, McpTransportType, MessageRole, MessageType, MessageVisibility,
    RelationType, ToolStatus,
};
use crate::identity::{AgentScope, GraphScope, ProjectScope};
use crate::settings::{
    ConversationHistoryConfig, ModelSettings, StatusUpdateSettings, StopWhen,
};

/// Timestamp type used on every entity.
pub type Timestamp = DateTime<Utc>;

/// Free-form string headers forwarded to remote services.
pub type Headers = BTreeMap<String, String>;

// ============================================================================
// PROJECTS AND GRAPHS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Project {
    pub tenant_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub models: Option<ModelSettings>,
    #[serde(default)]
    pub stop_when: Option<StopWhen>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Project {
    pub fn scope(&self) -> ProjectScope {
        ProjectScope::new(self.tenant_id.clone(), self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentGraph {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_agent_id: Option<String>,
    #[serde(default)]
    pub context_config_id: Option<String>,
    #[serde(default)]
    pub models: Option<ModelSettings>,
    #[serde(default)]
    pub status_updates: Option<StatusUpdateSettings>,
    #[serde(default)]
    pub graph_prompt: Option<String>,
    #[serde(default)]
    pub stop_when: Option<StopWhen>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl AgentGraph {
    pub fn scope(&self) -> GraphScope {
        GraphScope::new(
            self.tenant_id.clone(),
            self.project_id.clone(),
            self.id.clone(),
        )
    }
}

// ============================================================================
// AGENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Agent {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub conversation_history_config: Option<ConversationHistoryConfig>,
    #[serde(default)]
    pub models: Option<ModelSettings>,
    #[serde(default)]
    pub stop_when: Option<StopWhen>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Agent {
    pub fn scope(&self) -> AgentScope {
        GraphScope::new(
            self.tenant_id.clone(),
            self.project_id.clone(),
            self.graph_id.clone(),
        )
        .agent(self.id.clone())
    }
}

/// Directed edge between two agents of the same graph. Exactly one of
/// `target_agent_id` and `external_agent_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentRelation {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub source_agent_id: String,
    #[serde(default)]
    pub target_agent_id: Option<String>,
    #[serde(default)]
    pub external_agent_id: Option<String>,
    pub relation_type: RelationType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Agent reachable over the A2A protocol at `base_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExternalAgent {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub credential_reference_id: Option<String>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

// ============================================================================
// TOOLS
// ============================================================================

/// Connection settings for an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct McpToolConfig {
    pub server_url: String,
    #[serde(default)]
    pub transport: McpTransportType,
    /// Subset of server tools exposed to agents; `None` exposes all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tools: Option<Vec<String>>,
}

/// A tool advertised by an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct McpToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub input_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Tool {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub name: String,
    pub config: McpToolConfig,
    #[serde(default)]
    pub credential_reference_id: Option<String>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub capabilities: Option<serde_json::Value>,
    #[serde(default)]
    pub status: ToolStatus,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_health_check: Option<Timestamp>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub available_tools: Option<Vec<McpToolDefinition>>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_tools_sync: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Grants an agent access to a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentToolRelation {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub agent_id: String,
    pub tool_id: String,
    /// Server tools the agent may call; `None` allows all active tools.
    #[serde(default)]
    pub selected_tools: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

// ============================================================================
// COMPONENTS
// ============================================================================

/// Structured UI payload an agent can emit. `props` is a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DataComponent {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub name: String,
    pub description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub props: serde_json::Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentDataComponent {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub agent_id: String,
    pub data_component_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Persisted artifact shape, with a short summary schema and a full schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArtifactComponent {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub summary_props: Option<serde_json::Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub full_props: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentArtifactComponent {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub agent_id: String,
    pub artifact_component_id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

// ============================================================================
// CONTEXT AND CREDENTIALS
// ============================================================================

/// Request-context schema and context variables resolved before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContextConfig {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub request_context_schema: Option<serde_json::Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub context_variables: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Pointer to a secret held in an external credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CredentialReference {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    #[serde(rename = "type")]
    pub store_type: CredentialStoreType,
    pub credential_store_id: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub retrieval_params: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

// ============================================================================
// API KEYS
// ============================================================================

/// Stored API key. Only the SHA-256 hash of the secret is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub id: String,
    pub public_id: String,
    pub key_hash: String,
    pub key_prefix: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_used_at: Option<Timestamp>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ApiKey {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

// ============================================================================
// CONVERSATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Conversation {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub active_agent_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_context_resolution: Option<Timestamp>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Message body: plain text and/or structured parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    pub parts: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    pub tenant_id: String,
    pub project_id: String,
    pub id: String,
    pub conversation_id: String,
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
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_credential_reference_serializes_type_column() {
        let now = Utc::now();
        let credential = CredentialReference {
            tenant_id: "acme".to_string(),
            project_id: "support".to_string(),
            id: "zendesk".to_string(),
            store_type: CredentialStoreType::Nango,
            credential_store_id: "nango-default".to_string(),
            retrieval_params: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&credential).unwrap();
        assert_eq!(value["type"], "nango");
        assert!(value.get("store_type").is_none());
    }

    #[test]
    fn test_api_key_expiry() {
        let now = Utc::now();
        let mut key = ApiKey {
            tenant_id: "acme".to_string(),
            project_id: "support".to_string(),
            graph_id: "triage".to_string(),
            id: "k1".to_string(),
            public_id: "abc123def456".to_string(),
            key_hash: String::new(),
            key_prefix: "sk_abc123def456".to_string(),
            name: None,
            last_used_at: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!key.is_expired(now));
        key.expires_at = Some(now - Duration::seconds(1));
        assert!(key.is_expired(now));
        key.expires_at = Some(now + Duration::hours(1));
        assert!(!key.is_expired(now));
    }
}
