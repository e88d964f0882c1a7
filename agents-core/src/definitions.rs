//! Full graph and full project definitions.
//!
//! These are the documents accepted by the graph-full and project-full
//! endpoints. A definition nests every resource a graph needs, keyed by
//! resource id, so a whole graph can be written or read in one request.
//! Maps are `BTreeMap` so serialized documents have a stable key order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{
    Agent, AgentGraph, ArtifactComponent, ContextConfig, CredentialReference, DataComponent,
    ExternalAgent, Headers, McpToolConfig, Project, Timestamp, Tool,
};
use crate::enums::CredentialStoreType;
use crate::identity::{GraphScope, ProjectScope, TenantScope};
use crate::settings::{
    ConversationHistoryConfig, ModelSettings, StatusUpdateSettings, StopWhen,
};

// ============================================================================
// AGENTS
// ============================================================================

/// An agent inside a graph definition, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentDefinition {
    Internal(InternalAgentDefinition),
    External(ExternalAgentDefinition),
}

impl AgentDefinition {
    pub fn id(&self) -> &str {
        match self {
            AgentDefinition::Internal(agent) => &agent.id,
            AgentDefinition::External(agent) => &agent.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AgentDefinition::Internal(agent) => &agent.name,
            AgentDefinition::External(agent) => &agent.name,
        }
    }

    pub fn as_internal(&self) -> Option<&InternalAgentDefinition> {
        match self {
            AgentDefinition::Internal(agent) => Some(agent),
            AgentDefinition::External(_) => None,
        }
    }

    pub fn as_external(&self) -> Option<&ExternalAgentDefinition> {
        match self {
            AgentDefinition::External(agent) => Some(agent),
            AgentDefinition::Internal(_) => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AgentDefinition::Internal(_))
    }
}

/// An agent run by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InternalAgentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt: String,
    /// Agents control may be transferred to. Internal agents only.
    #[serde(default)]
    pub can_transfer_to: Vec<String>,
    /// Agents this agent may delegate to. Internal or external.
    #[serde(default)]
    pub can_delegate_to: Vec<String>,
    /// Tool ids the agent may use.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Per tool, the server tools the agent may call. Missing means all.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selected_tools: BTreeMap<String, Vec<String>>,
    /// Per tool, extra headers sent when the agent calls it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_headers: BTreeMap<String, Headers>,
    #[serde(default)]
    pub data_components: Vec<String>,
    #[serde(default)]
    pub artifact_components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_when: Option<StopWhen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history_config: Option<ConversationHistoryConfig>,
}

impl InternalAgentDefinition {
    /// Build the agent row. Relations and associations are written separately.
    pub fn to_entity(&self, scope: &GraphScope, now: Timestamp) -> Agent {
        Agent {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            graph_id: scope.graph_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            prompt: self.prompt.clone(),
            conversation_history_config: self.conversation_history_config.clone(),
            models: self.models.clone(),
            stop_when: self.stop_when.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Agent fields only; relation lists start empty.
    pub fn from_entity(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            prompt: agent.prompt.clone(),
            models: agent.models.clone(),
            stop_when: agent.stop_when.clone(),
            conversation_history_config: agent.conversation_history_config.clone(),
            ..Default::default()
        }
    }
}

/// An agent reached over A2A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExternalAgentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl ExternalAgentDefinition {
    pub fn to_entity(&self, scope: &GraphScope, now: Timestamp) -> ExternalAgent {
        ExternalAgent {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            graph_id: scope.graph_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            base_url: self.base_url.clone(),
            credential_reference_id: self.credential_reference_id.clone(),
            headers: self.headers.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&ExternalAgent> for ExternalAgentDefinition {
    fn from(agent: &ExternalAgent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            base_url: agent.base_url.clone(),
            credential_reference_id: agent.credential_reference_id.clone(),
            headers: agent.headers.clone(),
        }
    }
}

// ============================================================================
// PROJECT RESOURCES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    pub config: McpToolConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub capabilities: Option<serde_json::Value>,
}

impl ToolDefinition {
    /// Build a tool row with unknown health.
    pub fn to_entity(&self, scope: &ProjectScope, now: Timestamp) -> Tool {
        Tool {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            config: self.config.clone(),
            credential_reference_id: self.credential_reference_id.clone(),
            headers: self.headers.clone(),
            image_url: self.image_url.clone(),
            capabilities: self.capabilities.clone(),
            status: Default::default(),
            last_health_check: None,
            last_error: None,
            available_tools: None,
            last_tools_sync: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Tool> for ToolDefinition {
    fn from(tool: &Tool) -> Self {
        Self {
            id: tool.id.clone(),
            name: tool.name.clone(),
            config: tool.config.clone(),
            credential_reference_id: tool.credential_reference_id.clone(),
            headers: tool.headers.clone(),
            image_url: tool.image_url.clone(),
            capabilities: tool.capabilities.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DataComponentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub props: serde_json::Value,
}

impl DataComponentDefinition {
    pub fn to_entity(&self, scope: &ProjectScope, now: Timestamp) -> DataComponent {
        DataComponent {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            props: self.props.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&DataComponent> for DataComponentDefinition {
    fn from(component: &DataComponent) -> Self {
        Self {
            id: component.id.clone(),
            name: component.name.clone(),
            description: component.description.clone(),
            props: component.props.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArtifactComponentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub summary_props: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub full_props: Option<serde_json::Value>,
}

impl ArtifactComponentDefinition {
    pub fn to_entity(&self, scope: &ProjectScope, now: Timestamp) -> ArtifactComponent {
        ArtifactComponent {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            summary_props: self.summary_props.clone(),
            full_props: self.full_props.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&ArtifactComponent> for ArtifactComponentDefinition {
    fn from(component: &ArtifactComponent) -> Self {
        Self {
            id: component.id.clone(),
            name: component.name.clone(),
            description: component.description.clone(),
            summary_props: component.summary_props.clone(),
            full_props: component.full_props.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CredentialReferenceDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub store_type: CredentialStoreType,
    pub credential_store_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub retrieval_params: Option<serde_json::Value>,
}

impl CredentialReferenceDefinition {
    pub fn to_entity(&self, scope: &ProjectScope, now: Timestamp) -> CredentialReference {
        CredentialReference {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            store_type: self.store_type,
            credential_store_id: self.credential_store_id.clone(),
            retrieval_params: self.retrieval_params.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&CredentialReference> for CredentialReferenceDefinition {
    fn from(credential: &CredentialReference) -> Self {
        Self {
            id: credential.id.clone(),
            store_type: credential.store_type,
            credential_store_id: credential.credential_store_id.clone(),
            retrieval_params: credential.retrieval_params.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContextConfigDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub request_context_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub context_variables: Option<serde_json::Value>,
}

impl ContextConfigDefinition {
    pub fn to_entity(&self, scope: &ProjectScope, now: Timestamp) -> ContextConfig {
        ContextConfig {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            request_context_schema: self.request_context_schema.clone(),
            context_variables: self.context_variables.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&ContextConfig> for ContextConfigDefinition {
    fn from(config: &ContextConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            request_context_schema: config.request_context_schema.clone(),
            context_variables: config.context_variables.clone(),
        }
    }
}

// ============================================================================
// FULL GRAPH
// ============================================================================

/// A graph with every agent, relation and referenced resource inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FullGraphDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_agent_id: Option<String>,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, ToolDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_components: BTreeMap<String, DataComponentDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifact_components: BTreeMap<String, ArtifactComponentDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credential_references: BTreeMap<String, CredentialReferenceDefinition>,
    /// Context config created alongside the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_config: Option<ContextConfigDefinition>,
    /// Existing project context config used by the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updates: Option<StatusUpdateSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_when: Option<StopWhen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub updated_at: Option<Timestamp>,
}

impl FullGraphDefinition {
    /// Minimal definition with no agents.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            default_agent_id: None,
            agents: BTreeMap::new(),
            tools: BTreeMap::new(),
            data_components: BTreeMap::new(),
            artifact_components: BTreeMap::new(),
            credential_references: BTreeMap::new(),
            context_config: None,
            context_config_id: None,
            models: None,
            status_updates: None,
            graph_prompt: None,
            stop_when: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Context config id the graph row should point at.
    pub fn effective_context_config_id(&self) -> Option<&str> {
        self.context_config
            .as_ref()
            .map(|config| config.id.as_str())
            .or(self.context_config_id.as_deref())
    }

    pub fn internal_agents(&self) -> impl Iterator<Item = &InternalAgentDefinition> {
        self.agents.values().filter_map(AgentDefinition::as_internal)
    }

    pub fn external_agents(&self) -> impl Iterator<Item = &ExternalAgentDefinition> {
        self.agents.values().filter_map(AgentDefinition::as_external)
    }

    /// Graph row without the default agent, which is set once agents exist.
    pub fn to_graph_row(&self, scope: &ProjectScope, now: Timestamp) -> AgentGraph {
        AgentGraph {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            default_agent_id: None,
            context_config_id: None,
            models: self.models.clone(),
            status_updates: self.status_updates.clone(),
            graph_prompt: self.graph_prompt.clone(),
            stop_when: self.stop_when.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Graph metadata from a stored row; nested maps start empty.
    pub fn from_graph_row(graph: &AgentGraph) -> Self {
        let mut definition = Self::new(graph.id.clone(), graph.name.clone());
        definition.description = graph.description.clone();
        definition.default_agent_id = graph.default_agent_id.clone();
        definition.context_config_id = graph.context_config_id.clone();
        definition.models = graph.models.clone();
        definition.status_updates = graph.status_updates.clone();
        definition.graph_prompt = graph.graph_prompt.clone();
        definition.stop_when = graph.stop_when.clone();
        definition.created_at = Some(graph.created_at);
        definition.updated_at = Some(graph.updated_at);
        definition
    }
}

// ============================================================================
// FULL PROJECT
// ============================================================================

/// A project with every graph and project-level resource inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FullProjectDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_when: Option<StopWhen>,
    #[serde(default)]
    pub graphs: BTreeMap<String, FullGraphDefinition>,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolDefinition>,
    #[serde(default)]
    pub data_components: BTreeMap<String, DataComponentDefinition>,
    #[serde(default)]
    pub artifact_components: BTreeMap<String, ArtifactComponentDefinition>,
    #[serde(default)]
    pub credential_references: BTreeMap<String, CredentialReferenceDefinition>,
    #[serde(default)]
    pub context_configs: BTreeMap<String, ContextConfigDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub updated_at: Option<Timestamp>,
}

impl FullProjectDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            models: None,
            stop_when: None,
            graphs: BTreeMap::new(),
            tools: BTreeMap::new(),
            data_components: BTreeMap::new(),
            artifact_components: BTreeMap::new(),
            credential_references: BTreeMap::new(),
            context_configs: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn to_project_row(&self, tenant: &TenantScope, now: Timestamp) -> Project {
        Project {
            tenant_id: tenant.tenant_id.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            models: self.models.clone(),
            stop_when: self.stop_when.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Project metadata from a stored row; nested maps start empty.
    pub fn from_project_row(project: &Project) -> Self {
        let mut definition = Self::new(project.id.clone(), project.name.clone());
        definition.description = project.description.clone();
        definition.models = project.models.clone();
        definition.stop_when = project.stop_when.clone();
        definition.created_at = Some(project.created_at);
        definition.updated_at = Some(project.updated_at);
        definition
    }
}
