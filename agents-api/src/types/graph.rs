//! Graph, Agent and Relation Request Types

use agents_core::{
    generate_id, Agent, AgentGraph, AgentRelation, AgentToolRelation, ConversationHistoryConfig,
    GraphScope, Headers, McpToolDefinition, ModelSettings, ProjectScope, RelationType,
    StatusUpdateSettings, StopWhen, Timestamp, ToolStatus,
};
use agents_storage::access::tools::ToolHealth;
use serde::{Deserialize, Serialize};

use super::paginated_query;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentGraphRequest {
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
}

impl CreateAgentGraphRequest {
    pub fn into_entity(self, project: &ProjectScope, now: Timestamp) -> AgentGraph {
        AgentGraph {
            tenant_id: project.tenant_id.clone(),
            project_id: project.project_id.clone(),
            id: self.id,
            name: self.name,
            description: self.description,
            default_agent_id: self.default_agent_id,
            context_config_id: self.context_config_id,
            models: self.models,
            status_updates: self.status_updates,
            graph_prompt: self.graph_prompt,
            stop_when: self.stop_when,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub conversation_history_config: Option<ConversationHistoryConfig>,
    #[serde(default)]
    pub models: Option<ModelSettings>,
    #[serde(default)]
    pub stop_when: Option<StopWhen>,
}

impl CreateAgentRequest {
    pub fn into_entity(self, graph: &GraphScope, now: Timestamp) -> Agent {
        Agent {
            tenant_id: graph.tenant_id.clone(),
            project_id: graph.project_id.clone(),
            graph_id: graph.graph_id.clone(),
            id: self.id,
            name: self.name,
            description: self.description,
            prompt: self.prompt,
            conversation_history_config: self.conversation_history_config,
            models: self.models,
            stop_when: self.stop_when,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Exactly one of `target_agent_id` and `external_agent_id` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentRelationRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub source_agent_id: String,
    #[serde(default)]
    pub target_agent_id: Option<String>,
    #[serde(default)]
    pub external_agent_id: Option<String>,
    pub relation_type: RelationType,
}

impl CreateAgentRelationRequest {
    pub fn into_entity(self, graph: &GraphScope, now: Timestamp) -> AgentRelation {
        AgentRelation {
            tenant_id: graph.tenant_id.clone(),
            project_id: graph.project_id.clone(),
            graph_id: graph.graph_id.clone(),
            id: self.id.unwrap_or_else(generate_id),
            source_agent_id: self.source_agent_id,
            target_agent_id: self.target_agent_id,
            external_agent_id: self.external_agent_id,
            relation_type: self.relation_type,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentToolRelationRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub agent_id: String,
    pub tool_id: String,
    #[serde(default)]
    pub selected_tools: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<Headers>,
}

impl CreateAgentToolRelationRequest {
    pub fn into_entity(self, graph: &GraphScope, now: Timestamp) -> AgentToolRelation {
        AgentToolRelation {
            tenant_id: graph.tenant_id.clone(),
            project_id: graph.project_id.clone(),
            graph_id: graph.graph_id.clone(),
            id: self.id.unwrap_or_else(generate_id),
            agent_id: self.agent_id,
            tool_id: self.tool_id,
            selected_tools: self.selected_tools,
            headers: self.headers,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST .../agents/:agent_id/{data,artifact}-components`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssociateComponentRequest {
    pub component_id: String,
}

paginated_query! {
    AgentRelationQuery { source_agent_id: String }
}

paginated_query! {
    AgentToolRelationQuery { agent_id: String }
}

paginated_query! {
    ToolQuery { status: ToolStatus }
}

/// Body of `PUT .../tools/:id/status`, written by the tool health checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateToolStatusRequest {
    pub status: ToolStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub available_tools: Option<Vec<McpToolDefinition>>,
}

impl From<UpdateToolStatusRequest> for ToolHealth {
    fn from(request: UpdateToolStatusRequest) -> Self {
        ToolHealth {
            status: request.status,
            last_error: request.last_error,
            available_tools: request.available_tools,
        }
    }
}
