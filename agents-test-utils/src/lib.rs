//! Agents Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for ids, settings and graph definitions
//! - Fixtures for scopes, sample graphs and seeded stores
//! - A store wrapper that fails writes to chosen tables
//! - Assertions over `AgentsResult`

pub use agents_core::{
    AgentDefinition, AgentsError, AgentsResult, ArtifactComponentDefinition,
    ContextConfigDefinition, CredentialReferenceDefinition, CredentialStoreType,
    DataComponentDefinition, ExternalAgentDefinition, FullGraphDefinition, FullProjectDefinition,
    GraphScope, InternalAgentDefinition, McpToolConfig, McpTransportType, ProjectScope,
    RelationType, StorageError, TenantScope, ToolDefinition, ToolStatus, ValidationError,
};
pub use agents_storage::{InMemoryStore, SharedStore, Store};

use std::collections::BTreeSet;
use std::sync::Arc;

use agents_storage::{Filter, Page, Record, Table};
use async_trait::async_trait;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for platform types.

    use super::*;
    use agents_core::{ModelSetting, ModelSettings, StopWhen};
    use proptest::prelude::*;

    /// A valid caller-chosen resource id.
    pub fn arb_resource_id() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9][a-zA-Z0-9_.-]{0,31}"
    }

    /// A string that breaks the resource id rules.
    pub fn arb_invalid_resource_id() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-z]{1,8}[ /#?!@][a-z]{1,8}",
            "[a-z]{256,300}",
        ]
    }

    pub fn arb_relation_type() -> impl Strategy<Value = RelationType> {
        prop_oneof![Just(RelationType::Transfer), Just(RelationType::Delegate)]
    }

    pub fn arb_tool_status() -> impl Strategy<Value = ToolStatus> {
        prop_oneof![
            Just(ToolStatus::Healthy),
            Just(ToolStatus::Unhealthy),
            Just(ToolStatus::Unknown),
            Just(ToolStatus::Disabled),
        ]
    }

    pub fn arb_stop_when() -> impl Strategy<Value = StopWhen> {
        (proptest::option::of(1u32..50), proptest::option::of(1u32..200)).prop_map(
            |(transfer_count_is, step_count_is)| StopWhen {
                transfer_count_is,
                step_count_is,
            },
        )
    }

    pub fn arb_model_settings() -> impl Strategy<Value = ModelSettings> {
        let setting = proptest::option::of("[a-z]{3,8}/[a-z0-9-]{3,12}").prop_map(|model| {
            model.map(|model| ModelSetting {
                model: Some(model),
                provider_options: None,
            })
        });
        (setting.clone(), setting.clone(), setting).prop_map(
            |(base, structured_output, summarizer)| ModelSettings {
                base,
                structured_output,
                summarizer,
            },
        )
    }

    /// A structurally valid graph: internal agents chained by transfers,
    /// the first one as default, each delegating to one external agent.
    pub fn arb_full_graph() -> impl Strategy<Value = FullGraphDefinition> {
        (
            arb_resource_id(),
            proptest::collection::btree_set("[a-z]{3,10}", 1..5),
            proptest::option::of(arb_stop_when()),
        )
            .prop_map(|(id, agent_ids, stop_when)| {
                let agent_ids: Vec<String> = agent_ids.into_iter().collect();
                let mut graph = FullGraphDefinition::new(id, "Generated graph");
                graph.stop_when = stop_when;
                graph.default_agent_id = agent_ids.first().cloned();
                graph.agents.insert(
                    "ext-partner".to_string(),
                    AgentDefinition::External(fixtures::external_agent(
                        "ext-partner",
                        "https://partner.example.com/a2a",
                    )),
                );
                for (i, agent_id) in agent_ids.iter().enumerate() {
                    let mut agent = fixtures::internal_agent(agent_id);
                    if let Some(next) = agent_ids.get(i + 1) {
                        agent.can_transfer_to.push(next.clone());
                    }
                    agent.can_delegate_to.push("ext-partner".to_string());
                    graph
                        .agents
                        .insert(agent_id.clone(), AgentDefinition::Internal(agent));
                }
                graph
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made scopes, definitions and seeded stores.

    use super::*;
    use chrono::Utc;
    use serde_json::json;

    pub const TENANT_ID: &str = "acme";
    pub const PROJECT_ID: &str = "support";
    pub const GRAPH_ID: &str = "helpdesk";

    pub fn tenant() -> TenantScope {
        TenantScope::new(TENANT_ID)
    }

    pub fn project() -> ProjectScope {
        ProjectScope::new(TENANT_ID, PROJECT_ID)
    }

    pub fn graph() -> GraphScope {
        GraphScope::new(TENANT_ID, PROJECT_ID, GRAPH_ID)
    }

    /// Internal agent with a prompt and no relations.
    pub fn internal_agent(id: &str) -> InternalAgentDefinition {
        InternalAgentDefinition {
            id: id.to_string(),
            name: format!("Agent {}", id),
            prompt: format!("You are the {} agent.", id),
            ..Default::default()
        }
    }

    pub fn external_agent(id: &str, base_url: &str) -> ExternalAgentDefinition {
        ExternalAgentDefinition {
            id: id.to_string(),
            name: format!("External {}", id),
            description: None,
            base_url: base_url.to_string(),
            credential_reference_id: None,
            headers: None,
        }
    }

    pub fn tool(id: &str) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: format!("Tool {}", id),
            config: McpToolConfig {
                server_url: format!("https://mcp.example.com/{}", id),
                transport: McpTransportType::StreamableHttp,
                active_tools: None,
            },
            credential_reference_id: None,
            headers: None,
            image_url: None,
            capabilities: None,
        }
    }

    pub fn data_component(id: &str) -> DataComponentDefinition {
        DataComponentDefinition {
            id: id.to_string(),
            name: format!("Component {}", id),
            description: "Structured order card".to_string(),
            props: json!({
                "type": "object",
                "properties": {"order_id": {"type": "string"}},
                "required": ["order_id"],
            }),
        }
    }

    pub fn artifact_component(id: &str) -> ArtifactComponentDefinition {
        ArtifactComponentDefinition {
            id: id.to_string(),
            name: format!("Artifact {}", id),
            description: String::new(),
            summary_props: Some(json!({"type": "object"})),
            full_props: None,
        }
    }

    pub fn credential(id: &str) -> CredentialReferenceDefinition {
        CredentialReferenceDefinition {
            id: id.to_string(),
            store_type: CredentialStoreType::Memory,
            credential_store_id: "memory-default".to_string(),
            retrieval_params: Some(json!({"key": id})),
        }
    }

    pub fn context_config(id: &str) -> ContextConfigDefinition {
        ContextConfigDefinition {
            id: id.to_string(),
            name: format!("Context {}", id),
            description: None,
            request_context_schema: Some(json!({
                "type": "object",
                "properties": {"user_id": {"type": "string"}},
            })),
            context_variables: None,
        }
    }

    /// Helpdesk graph used across the test suites.
    ///
    /// `router` (default) transfers to `billing`, delegates to the external
    /// `partner`, uses the `search` tool restricted to `lookup` and the
    /// `order-card` data component. `billing` uses the `receipt` artifact
    /// component. The graph carries its own tool, components, credential and
    /// context config.
    pub fn sample_full_graph() -> FullGraphDefinition {
        let mut graph = FullGraphDefinition::new(GRAPH_ID, "Helpdesk");
        graph.description = Some("Routes support requests".to_string());
        graph.default_agent_id = Some("router".to_string());

        let mut router = internal_agent("router");
        router.can_transfer_to = vec!["billing".to_string()];
        router.can_delegate_to = vec!["partner".to_string()];
        router.tools = vec!["search".to_string()];
        router
            .selected_tools
            .insert("search".to_string(), vec!["lookup".to_string()]);
        router.data_components = vec!["order-card".to_string()];

        let mut billing = internal_agent("billing");
        billing.artifact_components = vec!["receipt".to_string()];

        let mut partner = external_agent("partner", "https://partner.example.com/a2a");
        partner.credential_reference_id = Some("partner-key".to_string());

        graph
            .agents
            .insert("router".to_string(), AgentDefinition::Internal(router));
        graph
            .agents
            .insert("billing".to_string(), AgentDefinition::Internal(billing));
        graph
            .agents
            .insert("partner".to_string(), AgentDefinition::External(partner));

        graph.tools.insert("search".to_string(), tool("search"));
        graph
            .data_components
            .insert("order-card".to_string(), data_component("order-card"));
        graph
            .artifact_components
            .insert("receipt".to_string(), artifact_component("receipt"));
        graph
            .credential_references
            .insert("partner-key".to_string(), credential("partner-key"));
        graph.context_config = Some(context_config("helpdesk-context"));
        graph
    }

    /// Project holding the helpdesk graph with its resources hoisted to the
    /// project level.
    pub fn sample_full_project() -> FullProjectDefinition {
        let mut graph = sample_full_graph();
        let mut project = FullProjectDefinition::new(PROJECT_ID, "Support");
        project.tools = std::mem::take(&mut graph.tools);
        project.data_components = std::mem::take(&mut graph.data_components);
        project.artifact_components = std::mem::take(&mut graph.artifact_components);
        project.credential_references = std::mem::take(&mut graph.credential_references);
        if let Some(config) = graph.context_config.take() {
            graph.context_config_id = Some(config.id.clone());
            project.context_configs.insert(config.id.clone(), config);
        }
        project.graphs.insert(graph.id.clone(), graph);
        project
    }

    /// Empty in-memory store.
    pub fn memory_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    /// In-memory store holding the `acme/support` project row.
    pub async fn seeded_store() -> AgentsResult<Arc<InMemoryStore>> {
        let store = memory_store();
        let row = FullProjectDefinition::new(PROJECT_ID, "Support").to_project_row(&tenant(), Utc::now());
        agents_storage::access::projects::create_project(store.as_ref(), row).await?;
        Ok(store)
    }
}

// ============================================================================
// FAILING STORE
// ============================================================================

/// Store wrapper whose writes to selected tables fail with a backend error.
///
/// Reads always pass through, so an operation can be driven to the point
/// where a particular kind of row is written.
pub struct FailingStore {
    inner: SharedStore,
    failing: BTreeSet<&'static str>,
}

impl FailingStore {
    pub fn new(inner: SharedStore) -> Self {
        Self {
            inner,
            failing: BTreeSet::new(),
        }
    }

    /// Fail every insert, upsert and replace on `table`.
    pub fn fail_writes_to(mut self, table: &'static Table) -> Self {
        self.failing.insert(table.name);
        self
    }

    fn check(&self, table: &'static Table) -> AgentsResult<()> {
        if self.failing.contains(table.name) {
            return Err(AgentsError::backend(format!(
                "injected write failure on {}",
                table.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn insert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        self.check(table)?;
        self.inner.insert(table, record).await
    }

    async fn upsert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        self.check(table)?;
        self.inner.upsert(table, record).await
    }

    async fn replace(&self, table: &'static Table, record: Record) -> AgentsResult<Option<Record>> {
        self.check(table)?;
        self.inner.replace(table, record).await
    }

    async fn select(
        &self,
        table: &'static Table,
        filter: &Filter,
        page: Option<Page>,
    ) -> AgentsResult<Vec<Record>> {
        self.inner.select(table, filter, page).await
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        self.inner.count(table, filter).await
    }

    async fn delete(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        self.inner.delete(table, filter).await
    }

    async fn ping(&self) -> AgentsResult<()> {
        self.inner.ping().await
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over platform results.

    use super::*;

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &AgentsResult<T>) {
        match result {
            Err(e) if e.is_not_found() => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &AgentsResult<T>) {
        match result {
            Err(e) if e.is_conflict() => {}
            other => panic!("Expected AlreadyExists, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_missing_reference<T: std::fmt::Debug>(result: &AgentsResult<T>) {
        match result {
            Err(AgentsError::Storage(StorageError::MissingReference { .. })) => {}
            other => panic!("Expected MissingReference, got: {:?}", other),
        }
    }

    /// Assert a definition failed validation with an issue containing
    /// `needle`.
    #[track_caller]
    pub fn assert_definition_issue(result: &Result<(), ValidationError>, needle: &str) {
        match result {
            Err(ValidationError::Definition { issues }) => assert!(
                issues.iter().any(|issue| issue.contains(needle)),
                "No issue mentions '{}': {:?}",
                needle,
                issues
            ),
            other => panic!("Expected Definition error, got: {:?}", other),
        }
    }

    /// Agent ids of a graph, sorted.
    pub fn agent_ids(graph: &FullGraphDefinition) -> Vec<&str> {
        graph.agents.keys().map(String::as_str).collect()
    }

    /// Transfer and delegate targets of an internal agent, in that order.
    #[track_caller]
    pub fn relation_targets<'a>(
        graph: &'a FullGraphDefinition,
        agent_id: &str,
    ) -> (Vec<&'a str>, Vec<&'a str>) {
        let agent = graph
            .agents
            .get(agent_id)
            .and_then(AgentDefinition::as_internal)
            .unwrap_or_else(|| panic!("No internal agent '{}'", agent_id));
        (
            agent.can_transfer_to.iter().map(String::as_str).collect(),
            agent.can_delegate_to.iter().map(String::as_str).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents_core::{validate_graph_definition, validate_project_definition, ProjectCatalog};
    use agents_storage::table::AGENT_RELATIONS;
    use proptest::prelude::*;

    #[test]
    fn test_sample_graph_is_valid() {
        let graph = fixtures::sample_full_graph();
        assert!(validate_graph_definition(&graph, &ProjectCatalog::default()).is_ok());
    }

    #[test]
    fn test_sample_project_is_valid() {
        let project = fixtures::sample_full_project();
        assert!(validate_project_definition(&project).is_ok());
        let graph = &project.graphs[fixtures::GRAPH_ID];
        assert!(graph.tools.is_empty());
        assert_eq!(graph.context_config_id.as_deref(), Some("helpdesk-context"));
    }

    #[tokio::test]
    async fn test_failing_store_only_fails_chosen_table() {
        let store = FailingStore::new(fixtures::memory_store()).fail_writes_to(&AGENT_RELATIONS);
        let err = store
            .insert(&AGENT_RELATIONS, Record::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("agent_relations"));
        assert!(store.ping().await.is_ok());
    }

    proptest! {
        #[test]
        fn prop_generated_graphs_validate(graph in generators::arb_full_graph()) {
            prop_assert!(validate_graph_definition(&graph, &ProjectCatalog::default()).is_ok());
        }

        #[test]
        fn prop_invalid_ids_are_rejected(id in generators::arb_invalid_resource_id()) {
            prop_assert!(agents_core::validate_resource_id("id", &id).is_err());
        }
    }
}
