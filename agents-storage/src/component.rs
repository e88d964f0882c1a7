//! Mapping between entities and table rows.
//!
//! Every entity implements [`Component`], which names its table and key so
//! the generic functions in [`crate::repository`] can store any of them.

use agents_core::{
    Agent, AgentArtifactComponent, AgentDataComponent, AgentGraph, AgentRelation,
    AgentToolRelation, AgentsResult, ApiKey, ArtifactComponent, ContextConfig, Conversation,
    CredentialReference, DataComponent, ExternalAgent, Message, Project, StorageError, Timestamp,
    Tool,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

use crate::table::{self, Filter, Record, Table};

// ============================================================================
// COMPONENT TRAIT
// ============================================================================

pub trait Component: Sized + Send + Sync + Clone + DeserializeOwned + Serialize + 'static {
    /// Entity name used in errors and logs (e.g. "Agent").
    const ENTITY_NAME: &'static str;

    fn table() -> &'static Table;

    fn id(&self) -> &str;

    /// Filter matching exactly this row.
    fn key_filter(&self) -> Filter;

    fn created_at(&self) -> Timestamp;

    /// Set timestamps. Tables without `updated_at` ignore the second value.
    fn stamp(&mut self, created_at: Timestamp, updated_at: Timestamp);

    fn to_record(&self) -> AgentsResult<Record> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(record)) => Ok(record),
            Ok(other) => Err(StorageError::Decode {
                table: Self::table().name,
                reason: format!("expected an object, got {other}"),
            }
            .into()),
            Err(e) => Err(StorageError::Decode {
                table: Self::table().name,
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn from_record(record: Record) -> AgentsResult<Self> {
        serde_json::from_value(JsonValue::Object(record)).map_err(|e| {
            StorageError::Decode {
                table: Self::table().name,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Implement [`Component`] for an entity whose key is its scope columns plus
/// `id`.
///
/// ```ignore
/// impl_component! {
///     Agent {
///         entity_name: "Agent",
///         table: AGENTS,
///         scope: [tenant_id, project_id, graph_id],
///         timestamps: created_and_updated,
///     }
/// }
/// ```
macro_rules! impl_component {
    (@stamp created_and_updated, $self:ident, $created:ident, $updated:ident) => {
        $self.created_at = $created;
        $self.updated_at = $updated;
    };
    (@stamp created_only, $self:ident, $created:ident, $updated:ident) => {
        let _ = $updated;
        $self.created_at = $created;
    };
    (
        $entity:ty {
            entity_name: $entity_name:literal,
            table: $table:ident,
            scope: [$($scope:ident),+],
            timestamps: $timestamps:ident $(,)?
        }
    ) => {
        impl Component for $entity {
            const ENTITY_NAME: &'static str = $entity_name;

            fn table() -> &'static Table {
                &table::$table
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn key_filter(&self) -> Filter {
                Filter::new()
                    $(.with(stringify!($scope), self.$scope.as_str()))+
                    .with("id", self.id.as_str())
            }

            fn created_at(&self) -> Timestamp {
                self.created_at
            }

            fn stamp(&mut self, created_at: Timestamp, updated_at: Timestamp) {
                impl_component!(@stamp $timestamps, self, created_at, updated_at);
            }
        }
    };
}

impl_component! {
    Project {
        entity_name: "Project",
        table: PROJECTS,
        scope: [tenant_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    AgentGraph {
        entity_name: "AgentGraph",
        table: AGENT_GRAPHS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    Agent {
        entity_name: "Agent",
        table: AGENTS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    AgentRelation {
        entity_name: "AgentRelation",
        table: AGENT_RELATIONS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    ExternalAgent {
        entity_name: "ExternalAgent",
        table: EXTERNAL_AGENTS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    Tool {
        entity_name: "Tool",
        table: TOOLS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    AgentToolRelation {
        entity_name: "AgentToolRelation",
        table: AGENT_TOOL_RELATIONS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    DataComponent {
        entity_name: "DataComponent",
        table: DATA_COMPONENTS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    AgentDataComponent {
        entity_name: "AgentDataComponent",
        table: AGENT_DATA_COMPONENTS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_only,
    }
}

impl_component! {
    ArtifactComponent {
        entity_name: "ArtifactComponent",
        table: ARTIFACT_COMPONENTS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    AgentArtifactComponent {
        entity_name: "AgentArtifactComponent",
        table: AGENT_ARTIFACT_COMPONENTS,
        scope: [tenant_id, project_id, graph_id],
        timestamps: created_only,
    }
}

impl_component! {
    ContextConfig {
        entity_name: "ContextConfig",
        table: CONTEXT_CONFIGS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    CredentialReference {
        entity_name: "CredentialReference",
        table: CREDENTIAL_REFERENCES,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    ApiKey {
        entity_name: "ApiKey",
        table: API_KEYS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    Conversation {
        entity_name: "Conversation",
        table: CONVERSATIONS,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

impl_component! {
    Message {
        entity_name: "Message",
        table: MESSAGES,
        scope: [tenant_id, project_id],
        timestamps: created_and_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents_core::{CredentialStoreType, ProjectScope};
    use chrono::Utc;

    fn every_record_column_is_known<C: Component>(entity: &C) {
        let record = entity.to_record().unwrap();
        for column in record.keys() {
            assert!(
                C::table().has_column(column),
                "{} has unknown column {column}",
                C::ENTITY_NAME
            );
        }
        for column in C::table().columns {
            assert!(
                record.contains_key(*column),
                "{} does not serialize column {column}",
                C::ENTITY_NAME
            );
        }
    }

    #[test]
    fn test_credential_reference_columns() {
        let now = Utc::now();
        let scope = ProjectScope::new("acme", "support");
        let credential = CredentialReference {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            id: "zendesk".to_string(),
            store_type: CredentialStoreType::Memory,
            credential_store_id: "memory-default".to_string(),
            retrieval_params: None,
            created_at: now,
            updated_at: now,
        };
        every_record_column_is_known(&credential);
        assert_eq!(
            credential.key_filter().describe(),
            "acme/support/zendesk"
        );
        let back = CredentialReference::from_record(credential.to_record().unwrap()).unwrap();
        assert_eq!(back, credential);
    }

    #[test]
    fn test_association_stamp_ignores_updated_at() {
        let now = Utc::now();
        let later = now + chrono::Duration::seconds(5);
        let mut association = AgentDataComponent {
            tenant_id: "acme".to_string(),
            project_id: "support".to_string(),
            graph_id: "triage".to_string(),
            id: "a1".to_string(),
            agent_id: "router".to_string(),
            data_component_id: "card".to_string(),
            created_at: now,
        };
        association.stamp(later, later);
        assert_eq!(association.created_at(), later);
        every_record_column_is_known(&association);
    }

    #[test]
    fn test_decode_error_names_table() {
        let err = Agent::from_record(Record::new()).unwrap_err();
        assert!(err.to_string().contains("agents"));
    }
}
