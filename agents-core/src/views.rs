//! Read models assembled from several tables.

use serde::{Deserialize, Serialize};

use crate::entities::{Agent, AgentToolRelation, ExternalAgent, Tool};
use crate::enums::RelationType;

/// Internal and external agents of one graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GraphAgents {
    pub internal: Vec<Agent>,
    pub external: Vec<ExternalAgent>,
}

impl GraphAgents {
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.external.is_empty()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.internal.iter().any(|a| a.id == agent_id)
            || self.external.iter().any(|a| a.id == agent_id)
    }
}

/// An internal agent reachable from another agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RelatedAgent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub relation_type: RelationType,
}

/// An external agent reachable from an internal agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RelatedExternalAgent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_url: String,
    pub relation_type: RelationType,
}

/// Outgoing relations of one agent, split by target kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RelatedAgents {
    pub internal_relations: Vec<RelatedAgent>,
    pub external_relations: Vec<RelatedExternalAgent>,
}

impl RelatedAgents {
    /// Ids of agents control can be transferred to.
    pub fn transfer_targets(&self) -> Vec<&str> {
        self.internal_relations
            .iter()
            .filter(|r| r.relation_type == RelationType::Transfer)
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Ids of internal and external agents work can be delegated to.
    pub fn delegate_targets(&self) -> Vec<&str> {
        self.internal_relations
            .iter()
            .filter(|r| r.relation_type == RelationType::Delegate)
            .map(|r| r.id.as_str())
            .chain(
                self.external_relations
                    .iter()
                    .filter(|r| r.relation_type == RelationType::Delegate)
                    .map(|r| r.id.as_str()),
            )
            .collect()
    }
}

/// A tool granted to an agent, with the grant details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentTool {
    pub relation: AgentToolRelation,
    pub tool: Tool,
}
