//! OpenAPI Specification for the Agents API
//!
//! Built with utoipa from the route annotations and the `ToSchema` derives
//! in `agents-core` and this crate.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorCode, ProblemDetails};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{
    agent, agent_component, agent_graph, agent_relation, agent_tool_relation, api_key,
    artifact_component, context_config, conversation, credential, data_component,
    external_agent, graph_full, health, project, project_full, tool,
};
use crate::types::*;

use agents_core::{
    Agent, AgentArtifactComponent, AgentDataComponent, AgentDefinition, AgentGraph,
    AgentGraphUpdate, AgentRelation, AgentRelationUpdate, AgentTool, AgentToolRelation,
    AgentToolRelationUpdate, AgentUpdate, ApiKeyUpdate, ArtifactComponent,
    ArtifactComponentDefinition, ArtifactComponentUpdate, ContextConfig, ContextConfigDefinition,
    ContextConfigUpdate, Conversation, ConversationHistoryConfig, ConversationUpdate,
    CredentialReference, CredentialReferenceDefinition, CredentialReferenceUpdate,
    CredentialStoreType, DataComponent, DataComponentDefinition, DataComponentUpdate,
    ExternalAgent, ExternalAgentDefinition, ExternalAgentUpdate, FullGraphDefinition,
    FullProjectDefinition, GraphAgents, HistoryMode, InternalAgentDefinition, McpToolConfig,
    McpToolDefinition, McpTransportType, Message, MessageContent, MessageRole, MessageType,
    MessageVisibility, ModelSetting, ModelSettings, PaginationInfo, Project, ProjectUpdate,
    RelatedAgent, RelatedAgents, RelatedExternalAgent, RelationType, StatusUpdateSettings,
    StopWhen, Tool, ToolDefinition, ToolStatus, ToolUpdate,
};

/// OpenAPI document for the Agents API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agents API",
        version = "0.1.0",
        description = "Multi-tenant management API for agent graphs, their tools, components and conversations",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Projects", description = "Top-level containers for graphs and resources"),
        (name = "Agent Graphs", description = "Graph rows and relation lookups"),
        (name = "Agents", description = "Internal agents of a graph"),
        (name = "Agent Relations", description = "Transfer and delegate edges between agents"),
        (name = "External Agents", description = "Remote agents reachable by delegation"),
        (name = "Agent Tool Relations", description = "Tool grants to agents"),
        (name = "Agent Components", description = "Data and artifact components used by an agent"),
        (name = "Tools", description = "MCP tool servers"),
        (name = "Data Components", description = "Structured output schemas"),
        (name = "Artifact Components", description = "Artifact output schemas"),
        (name = "Context Configs", description = "Request context definitions"),
        (name = "Credentials", description = "References into credential stores"),
        (name = "API Keys", description = "Graph-scoped API keys"),
        (name = "Conversations", description = "Stored conversations and messages"),
        (name = "Full Graphs", description = "Whole-graph documents"),
        (name = "Full Projects", description = "Whole-project documents"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Projects ===
        project::list_projects,
        project::create_project,
        project::get_project,
        project::update_project,
        project::delete_project,

        // === Agent Graphs ===
        agent_graph::list_agent_graphs,
        agent_graph::create_agent_graph,
        agent_graph::get_agent_graph,
        agent_graph::update_agent_graph,
        agent_graph::delete_agent_graph,
        agent_graph::get_related_agents,

        // === Agents ===
        agent::list_agents,
        agent::create_agent,
        agent::get_agent,
        agent::update_agent,
        agent::delete_agent,

        // === Agent Relations ===
        agent_relation::list_agent_relations,
        agent_relation::create_agent_relation,
        agent_relation::get_agent_relation,
        agent_relation::update_agent_relation,
        agent_relation::delete_agent_relation,

        // === External Agents ===
        external_agent::list_external_agents,
        external_agent::create_external_agent,
        external_agent::get_external_agent,
        external_agent::update_external_agent,
        external_agent::delete_external_agent,

        // === Agent Tool Relations ===
        agent_tool_relation::list_agent_tool_relations,
        agent_tool_relation::create_agent_tool_relation,
        agent_tool_relation::get_agent_tool_relation,
        agent_tool_relation::update_agent_tool_relation,
        agent_tool_relation::delete_agent_tool_relation,

        // === Agent Components ===
        agent_component::list_agent_data_components,
        agent_component::associate_data_component,
        agent_component::remove_data_component,
        agent_component::list_agent_artifact_components,
        agent_component::associate_artifact_component,
        agent_component::remove_artifact_component,

        // === Tools ===
        tool::list_tools,
        tool::create_tool,
        tool::get_tool,
        tool::update_tool,
        tool::update_tool_status,
        tool::delete_tool,

        // === Data Components ===
        data_component::list_data_components,
        data_component::create_data_component,
        data_component::get_data_component,
        data_component::update_data_component,
        data_component::delete_data_component,

        // === Artifact Components ===
        artifact_component::list_artifact_components,
        artifact_component::create_artifact_component,
        artifact_component::get_artifact_component,
        artifact_component::update_artifact_component,
        artifact_component::delete_artifact_component,

        // === Context Configs ===
        context_config::list_context_configs,
        context_config::create_context_config,
        context_config::get_context_config,
        context_config::update_context_config,
        context_config::delete_context_config,

        // === Credentials ===
        credential::list_credentials,
        credential::create_credential,
        credential::get_credential,
        credential::update_credential,
        credential::delete_credential,

        // === API Keys ===
        api_key::list_api_keys,
        api_key::create_api_key,
        api_key::get_api_key,
        api_key::update_api_key,
        api_key::delete_api_key,

        // === Conversations ===
        conversation::list_conversations,
        conversation::create_conversation,
        conversation::get_conversation,
        conversation::update_conversation,
        conversation::delete_conversation,
        conversation::list_messages,
        conversation::create_message,

        // === Full Documents ===
        graph_full::create_full_graph,
        graph_full::get_full_graph,
        graph_full::update_full_graph,
        graph_full::delete_full_graph,
        project_full::create_full_project,
        project_full::get_full_project,
        project_full::update_full_project,
        project_full::delete_full_project,

        // === Health and Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        crate::telemetry::metrics::metrics_handler,
    ),
    components(
        schemas(
            // Entities
            Project, AgentGraph, Agent, AgentRelation, ExternalAgent, Tool, McpToolConfig,
            McpToolDefinition, AgentToolRelation, DataComponent, AgentDataComponent,
            ArtifactComponent, AgentArtifactComponent, ContextConfig, CredentialReference,
            Conversation, Message, MessageContent,

            // Settings and enums
            ModelSetting, ModelSettings, StopWhen, StatusUpdateSettings, ConversationHistoryConfig,
            RelationType, ToolStatus, CredentialStoreType, McpTransportType, MessageRole,
            MessageVisibility, MessageType, HistoryMode,

            // Definitions
            AgentDefinition, InternalAgentDefinition, ExternalAgentDefinition, ToolDefinition,
            DataComponentDefinition, ArtifactComponentDefinition, CredentialReferenceDefinition,
            ContextConfigDefinition, FullGraphDefinition, FullProjectDefinition,

            // Views
            GraphAgents, RelatedAgent, RelatedExternalAgent, RelatedAgents, AgentTool,

            // Updates
            ProjectUpdate, AgentGraphUpdate, AgentUpdate, AgentRelationUpdate, ExternalAgentUpdate,
            ToolUpdate, AgentToolRelationUpdate, DataComponentUpdate, ArtifactComponentUpdate,
            ContextConfigUpdate, CredentialReferenceUpdate, ApiKeyUpdate, ConversationUpdate,

            // Requests and responses
            CreateProjectRequest, CreateAgentGraphRequest, CreateAgentRequest,
            CreateAgentRelationRequest, CreateAgentToolRelationRequest, AssociateComponentRequest,
            UpdateToolStatusRequest, CreateApiKeyRequest, CreateApiKeyResponse, ApiKeyResponse,
            CreateConversationRequest, CreateMessageRequest, PaginationInfo,

            // Errors and health
            ProblemDetails, ErrorCode, HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // API key issued per graph
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate OpenAPI spec as YAML string.
    pub fn to_yaml() -> Result<String, String> {
        serde_yaml::to_string(&Self::openapi()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Agents API");

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("api_key"));
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("FullGraphDefinition"));
        assert!(components.schemas.contains_key("ProblemDetails"));
        Ok(())
    }

    #[test]
    fn test_openapi_paths_use_braced_parameters() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;
        assert!(paths.contains_key("/tenants/{tenant_id}/projects"));
        assert!(paths.contains_key("/tenants/{tenant_id}/projects/{project_id}/graph/{graph_id}"));
        assert!(paths.contains_key("/tenants/{tenant_id}/project-full/{project_id}"));
        assert!(paths.keys().all(|path| !path.contains("/:")));
    }

    #[test]
    fn test_timestamps_are_date_time_strings() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| e.to_string())?;
        let doc: serde_json::Value = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let schemas = &doc["components"]["schemas"];

        for (schema, field) in [
            ("AgentGraph", "created_at"),
            ("Tool", "last_health_check"),
            ("FullGraphDefinition", "updated_at"),
            ("ApiKeyResponse", "expires_at"),
            ("ApiKeyUpdate", "expires_at"),
        ] {
            let property = &schemas[schema]["properties"][field];
            assert_eq!(property["format"], "date-time", "{schema}.{field}: {property}");
        }
        Ok(())
    }

    #[test]
    fn test_openapi_json_and_yaml() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| e.to_string())?;
        serde_json::from_str::<serde_json::Value>(&json).map_err(|e| e.to_string())?;
        assert!(json.contains("\"bearer_auth\""));

        let yaml = ApiDoc::to_yaml()?;
        assert!(yaml.contains("Agents API"));
        Ok(())
    }
}
