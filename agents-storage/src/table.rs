//! Table descriptors, rows and equality filters.
//!
//! A row travels between the access layer and a [`Store`](crate::Store) as a
//! JSON object keyed by column name. Nested settings are JSON values and map
//! to `jsonb` columns in Postgres.

use agents_core::{AgentScope, GraphScope, ProjectScope, TenantScope};
use serde_json::{Map, Value as JsonValue};

/// A stored row.
pub type Record = Map<String, JsonValue>;

/// Static description of a relational table.
#[derive(Debug, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    /// Primary key columns, scope first.
    pub key: &'static [&'static str],
    /// Every column in declaration order, key columns included.
    pub columns: &'static [&'static str],
}

impl Table {
    /// Columns that are not part of the primary key.
    pub fn value_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|column| !self.key.contains(column))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

/// Conjunction of `column = value` clauses. A `null` value matches rows
/// where the column is null or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(&'static str, JsonValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` clause, replacing any previous clause on it.
    pub fn with(mut self, column: &'static str, value: impl Into<JsonValue>) -> Self {
        let value = value.into();
        match self.clauses.iter_mut().find(|(c, _)| *c == column) {
            Some(clause) => clause.1 = value,
            None => self.clauses.push((column, value)),
        }
        self
    }

    /// Add a clause matching rows where `column` is null.
    pub fn is_null(self, column: &'static str) -> Self {
        self.with(column, JsonValue::Null)
    }

    pub fn tenant(scope: &TenantScope) -> Self {
        Self::new().with("tenant_id", scope.tenant_id.as_str())
    }

    pub fn project(scope: &ProjectScope) -> Self {
        Self::new()
            .with("tenant_id", scope.tenant_id.as_str())
            .with("project_id", scope.project_id.as_str())
    }

    pub fn graph(scope: &GraphScope) -> Self {
        Self::project(&scope.project()).with("graph_id", scope.graph_id.as_str())
    }

    /// Rows of an agent-level association table.
    pub fn agent(scope: &AgentScope) -> Self {
        Self::graph(&scope.graph()).with("agent_id", scope.agent_id.as_str())
    }

    pub fn clauses(&self) -> &[(&'static str, JsonValue)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Value of a clause, if present.
    pub fn value(&self, column: &str) -> Option<&JsonValue> {
        self.clauses
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, value)| value)
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|(column, expected)| {
            let actual = record.get(*column).unwrap_or(&JsonValue::Null);
            actual == expected
        })
    }

    /// The clauses as a row, for backends that bind the filter as one value.
    pub fn to_record(&self) -> Record {
        self.clauses
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    /// Slash-joined clause values, used in error messages.
    pub fn describe(&self) -> String {
        self.clauses
            .iter()
            .map(|(_, value)| match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Offset window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl From<agents_core::Pagination> for Page {
    fn from(pagination: agents_core::Pagination) -> Self {
        Self {
            offset: pagination.offset(),
            limit: u64::from(pagination.limit),
        }
    }
}

// ============================================================================
// TABLES
// ============================================================================

macro_rules! table {
    ($static_name:ident, $name:literal, key: [$($key:literal),+], columns: [$($column:literal),+ $(,)?]) => {
        pub static $static_name: Table = Table {
            name: $name,
            key: &[$($key),+],
            columns: &[$($key,)+ $($column),+],
        };
    };
}

table!(PROJECTS, "projects",
    key: ["tenant_id", "id"],
    columns: ["name", "description", "models", "stop_when", "created_at", "updated_at"]);

table!(AGENT_GRAPHS, "agent_graphs",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "name", "description", "default_agent_id", "context_config_id", "models",
        "status_updates", "graph_prompt", "stop_when", "created_at", "updated_at",
    ]);

table!(AGENTS, "agents",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: [
        "name", "description", "prompt", "conversation_history_config", "models",
        "stop_when", "created_at", "updated_at",
    ]);

table!(AGENT_RELATIONS, "agent_relations",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: [
        "source_agent_id", "target_agent_id", "external_agent_id", "relation_type",
        "created_at", "updated_at",
    ]);

table!(EXTERNAL_AGENTS, "external_agents",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: [
        "name", "description", "base_url", "credential_reference_id", "headers",
        "created_at", "updated_at",
    ]);

table!(TOOLS, "tools",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "name", "config", "credential_reference_id", "headers", "image_url", "capabilities",
        "status", "last_health_check", "last_error", "available_tools", "last_tools_sync",
        "created_at", "updated_at",
    ]);

table!(AGENT_TOOL_RELATIONS, "agent_tool_relations",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: ["agent_id", "tool_id", "selected_tools", "headers", "created_at", "updated_at"]);

table!(DATA_COMPONENTS, "data_components",
    key: ["tenant_id", "project_id", "id"],
    columns: ["name", "description", "props", "created_at", "updated_at"]);

table!(AGENT_DATA_COMPONENTS, "agent_data_components",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: ["agent_id", "data_component_id", "created_at"]);

table!(ARTIFACT_COMPONENTS, "artifact_components",
    key: ["tenant_id", "project_id", "id"],
    columns: ["name", "description", "summary_props", "full_props", "created_at", "updated_at"]);

table!(AGENT_ARTIFACT_COMPONENTS, "agent_artifact_components",
    key: ["tenant_id", "project_id", "graph_id", "id"],
    columns: ["agent_id", "artifact_component_id", "created_at"]);

table!(CONTEXT_CONFIGS, "context_configs",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "name", "description", "request_context_schema", "context_variables",
        "created_at", "updated_at",
    ]);

table!(CREDENTIAL_REFERENCES, "credential_references",
    key: ["tenant_id", "project_id", "id"],
    columns: ["type", "credential_store_id", "retrieval_params", "created_at", "updated_at"]);

table!(API_KEYS, "api_keys",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "graph_id", "public_id", "key_hash", "key_prefix", "name", "last_used_at",
        "expires_at", "created_at", "updated_at",
    ]);

table!(CONVERSATIONS, "conversations",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "user_id", "active_agent_id", "title", "last_context_resolution", "metadata",
        "created_at", "updated_at",
    ]);

table!(MESSAGES, "messages",
    key: ["tenant_id", "project_id", "id"],
    columns: [
        "conversation_id", "role", "from_agent_id", "to_agent_id", "from_external_agent_id",
        "to_external_agent_id", "content", "visibility", "message_type", "agent_id", "task_id",
        "parent_message_id", "a2a_task_id", "a2a_session_id", "metadata",
        "created_at", "updated_at",
    ]);

/// Every table, parents before children.
pub static ALL_TABLES: [&Table; 16] = [
    &PROJECTS,
    &AGENT_GRAPHS,
    &CONTEXT_CONFIGS,
    &CREDENTIAL_REFERENCES,
    &TOOLS,
    &DATA_COMPONENTS,
    &ARTIFACT_COMPONENTS,
    &AGENTS,
    &EXTERNAL_AGENTS,
    &AGENT_RELATIONS,
    &AGENT_TOOL_RELATIONS,
    &AGENT_DATA_COMPONENTS,
    &AGENT_ARTIFACT_COMPONENTS,
    &API_KEYS,
    &CONVERSATIONS,
    &MESSAGES,
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_missing_as_null() {
        let mut record = Record::new();
        record.insert("tenant_id".to_string(), json!("acme"));
        assert!(Filter::new().with("tenant_id", "acme").matches(&record));
        assert!(Filter::new().is_null("target_agent_id").matches(&record));
        assert!(!Filter::new().with("tenant_id", "other").matches(&record));
    }

    #[test]
    fn test_filter_with_replaces_clause() {
        let filter = Filter::new().with("id", "a").with("id", "b");
        assert_eq!(filter.clauses().len(), 1);
        assert_eq!(filter.value("id"), Some(&json!("b")));
    }

    #[test]
    fn test_scope_filters() {
        let agent = TenantScope::new("acme").project("support").graph("triage").agent("router");
        let filter = Filter::agent(&agent);
        assert_eq!(filter.describe(), "acme/support/triage/router");
        assert_eq!(
            filter.clauses().iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            vec!["tenant_id", "project_id", "graph_id", "agent_id"]
        );
    }

    #[test]
    fn test_tables_lead_with_key_columns() {
        for table in ALL_TABLES {
            assert_eq!(&table.columns[..table.key.len()], table.key, "{}", table.name);
            assert!(table.has_column("created_at"), "{}", table.name);
            assert_eq!(table.key.last(), Some(&"id"));
        }
    }
}
