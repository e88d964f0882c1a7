//! Partial updates.
//!
//! Each `*Update` lists the columns a caller may change. `None` leaves the
//! column untouched. `apply` writes the present values onto an entity and
//! leaves timestamps to the repository.

use serde::{Deserialize, Serialize};

use crate::entities::{
    Agent, AgentGraph, AgentRelation, AgentToolRelation, ApiKey, ArtifactComponent, ContextConfig,
    Conversation, CredentialReference, DataComponent, ExternalAgent, Headers, McpToolConfig,
    Project, Tool,
};
use crate::enums::{CredentialStoreType, RelationType};
use crate::settings::{
    ConversationHistoryConfig, ModelSettings, StatusUpdateSettings, StopWhen,
};

/// Generates an update struct. Fields under `set` replace a required column;
/// fields under `wrap` fill a nullable column.
macro_rules! entity_update {
    (
        $(#[$meta:meta])*
        $name:ident => $entity:ty {
            set { $($set:ident : $set_ty:ty),* $(,)? }
            wrap { $($wrap:ident : $wrap_ty:ty),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $set: Option<$set_ty>,
            )*
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $wrap: Option<$wrap_ty>,
            )*
        }

        impl $name {
            /// True when at least one column would change.
            pub fn has_updates(&self) -> bool {
                false $(|| self.$set.is_some())* $(|| self.$wrap.is_some())*
            }

            pub fn apply(self, entity: &mut $entity) {
                $(
                    if let Some(value) = self.$set {
                        entity.$set = value;
                    }
                )*
                $(
                    if let Some(value) = self.$wrap {
                        entity.$wrap = Some(value);
                    }
                )*
            }
        }
    };
}

entity_update! {
    ProjectUpdate => Project {
        set { name: String }
        wrap { description: String, models: ModelSettings, stop_when: StopWhen }
    }
}

entity_update! {
    AgentGraphUpdate => AgentGraph {
        set { name: String }
        wrap {
            description: String,
            default_agent_id: String,
            context_config_id: String,
            models: ModelSettings,
            status_updates: StatusUpdateSettings,
            graph_prompt: String,
            stop_when: StopWhen,
        }
    }
}

entity_update! {
    AgentUpdate => Agent {
        set { name: String, prompt: String }
        wrap {
            description: String,
            conversation_history_config: ConversationHistoryConfig,
            models: ModelSettings,
            stop_when: StopWhen,
        }
    }
}

entity_update! {
    /// Retargeting a relation replaces both target columns; see
    /// `AgentRelationUpdate::retarget`.
    AgentRelationUpdate => AgentRelation {
        set { source_agent_id: String, relation_type: RelationType }
        wrap { target_agent_id: String, external_agent_id: String }
    }
}

impl AgentRelationUpdate {
    /// Apply, clearing the other target column when one target is set.
    pub fn retarget(self, relation: &mut AgentRelation) {
        let internal = self.target_agent_id.is_some();
        let external = self.external_agent_id.is_some();
        self.apply(relation);
        if internal && !external {
            relation.external_agent_id = None;
        } else if external && !internal {
            relation.target_agent_id = None;
        }
    }
}

entity_update! {
    ExternalAgentUpdate => ExternalAgent {
        set { name: String, base_url: String }
        wrap { description: String, credential_reference_id: String, headers: Headers }
    }
}

entity_update! {
    ToolUpdate => Tool {
        set { name: String, config: McpToolConfig }
        wrap {
            credential_reference_id: String,
            headers: Headers,
            image_url: String,
            capabilities: serde_json::Value,
        }
    }
}

entity_update! {
    AgentToolRelationUpdate => AgentToolRelation {
        set { tool_id: String }
        wrap { selected_tools: Vec<String>, headers: Headers }
    }
}

entity_update! {
    DataComponentUpdate => DataComponent {
        set { name: String, description: String, props: serde_json::Value }
        wrap {}
    }
}

entity_update! {
    ArtifactComponentUpdate => ArtifactComponent {
        set { name: String, description: String }
        wrap { summary_props: serde_json::Value, full_props: serde_json::Value }
    }
}

entity_update! {
    ContextConfigUpdate => ContextConfig {
        set { name: String }
        wrap {
            description: String,
            request_context_schema: serde_json::Value,
            context_variables: serde_json::Value,
        }
    }
}

/// Update for a credential reference. `type` switches the backing store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CredentialReferenceUpdate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub store_type: Option<CredentialStoreType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_params: Option<serde_json::Value>,
}

impl CredentialReferenceUpdate {
    pub fn has_updates(&self) -> bool {
        self.store_type.is_some()
            || self.credential_store_id.is_some()
            || self.retrieval_params.is_some()
    }

    pub fn apply(self, credential: &mut CredentialReference) {
        if let Some(store_type) = self.store_type {
            credential.store_type = store_type;
        }
        if let Some(store_id) = self.credential_store_id {
            credential.credential_store_id = store_id;
        }
        if let Some(params) = self.retrieval_params {
            credential.retrieval_params = Some(params);
        }
    }
}

entity_update! {
    ApiKeyUpdate => ApiKey {
        set {}
        wrap { name: String, expires_at: chrono::DateTime<chrono::Utc> }
    }
}

entity_update! {
    ConversationUpdate => Conversation {
        set { active_agent_id: String }
        wrap { user_id: String, title: String, metadata: serde_json::Value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn agent() -> Agent {
        let now = Utc::now();
        Agent {
            tenant_id: "t".to_string(),
            project_id: "p".to_string(),
            graph_id: "g".to_string(),
            id: "router".to_string(),
            name: "Router".to_string(),
            description: None,
            prompt: "Route".to_string(),
            conversation_history_config: None,
            models: None,
            stop_when: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_update_has_no_updates() {
        assert!(!AgentUpdate::default().has_updates());
        assert!(!DataComponentUpdate::default().has_updates());
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut entity = agent();
        let update = AgentUpdate {
            prompt: Some("Route carefully".to_string()),
            description: Some("Front door".to_string()),
            ..Default::default()
        };
        assert!(update.has_updates());
        update.apply(&mut entity);
        assert_eq!(entity.prompt, "Route carefully");
        assert_eq!(entity.description.as_deref(), Some("Front door"));
        assert_eq!(entity.name, "Router");
    }

    #[test]
    fn test_retarget_clears_other_target() {
        let now = Utc::now();
        let mut relation = AgentRelation {
            tenant_id: "t".to_string(),
            project_id: "p".to_string(),
            graph_id: "g".to_string(),
            id: "r1".to_string(),
            source_agent_id: "router".to_string(),
            target_agent_id: Some("billing".to_string()),
            external_agent_id: None,
            relation_type: RelationType::Transfer,
            created_at: now,
            updated_at: now,
        };
        AgentRelationUpdate {
            external_agent_id: Some("partner".to_string()),
            relation_type: Some(RelationType::Delegate),
            ..Default::default()
        }
        .retarget(&mut relation);
        assert_eq!(relation.target_agent_id, None);
        assert_eq!(relation.external_agent_id.as_deref(), Some("partner"));
        assert_eq!(relation.relation_type, RelationType::Delegate);
    }
}
