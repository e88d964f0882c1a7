//! Structural validation of full graph and full project definitions.
//!
//! Validation never stops at the first problem: every issue found is
//! collected so a caller can fix a definition in one pass.

use std::collections::BTreeSet;

use crate::definitions::{AgentDefinition, FullGraphDefinition, FullProjectDefinition};
use crate::error::ValidationError;
use crate::identity::validate_resource_id;

/// Ids of project-level resources that already exist outside the
/// definition being validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    pub tools: BTreeSet<String>,
    pub data_components: BTreeSet<String>,
    pub artifact_components: BTreeSet<String>,
    pub credential_references: BTreeSet<String>,
    pub context_configs: BTreeSet<String>,
}

impl ProjectCatalog {
    /// Catalog of the resources declared at the top of a project definition.
    pub fn from_project(project: &FullProjectDefinition) -> Self {
        Self {
            tools: project.tools.keys().cloned().collect(),
            data_components: project.data_components.keys().cloned().collect(),
            artifact_components: project.artifact_components.keys().cloned().collect(),
            credential_references: project.credential_references.keys().cloned().collect(),
            context_configs: project.context_configs.keys().cloned().collect(),
        }
    }
}

#[derive(Default)]
struct Issues {
    prefix: String,
    items: Vec<String>,
}

impl Issues {
    fn push(&mut self, issue: impl AsRef<str>) {
        self.items.push(format!("{}{}", self.prefix, issue.as_ref()));
    }

    fn check_id(&mut self, field: &str, value: &str) {
        if let Err(err) = validate_resource_id(field, value) {
            self.push(err.to_string());
        }
    }

    fn check_key(&mut self, map: &str, key: &str, id: &str) {
        self.check_id(&format!("{map}.{key}.id"), id);
        if key != id {
            self.push(format!("{map}: key '{key}' does not match id '{id}'"));
        }
    }

    fn check_name(&mut self, field: &str, name: &str) {
        if name.trim().is_empty() {
            self.push(format!("{field} must not be empty"));
        }
    }

    /// Each id may appear once in an agent's reference list.
    fn check_unique(&mut self, field: &str, ids: &[String]) {
        let mut seen = BTreeSet::new();
        let mut reported = BTreeSet::new();
        for id in ids {
            if !seen.insert(id.as_str()) && reported.insert(id.as_str()) {
                self.push(format!("{field} lists '{id}' more than once"));
            }
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Definition { issues: self.items })
        }
    }
}

/// Validate a full graph definition against the resources already known to
/// exist in its project.
pub fn validate_graph_definition(
    graph: &FullGraphDefinition,
    catalog: &ProjectCatalog,
) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    collect_graph_issues(graph, catalog, &mut issues);
    issues.finish()
}

fn collect_graph_issues(
    graph: &FullGraphDefinition,
    catalog: &ProjectCatalog,
    issues: &mut Issues,
) {
    issues.check_id("id", &graph.id);
    issues.check_name("name", &graph.name);

    for (key, tool) in &graph.tools {
        issues.check_key("tools", key, &tool.id);
        issues.check_name(&format!("tools.{key}.name"), &tool.name);
        if tool.config.server_url.trim().is_empty() {
            issues.push(format!("tools.{key}.config.server_url must not be empty"));
        }
    }
    for (key, component) in &graph.data_components {
        issues.check_key("data_components", key, &component.id);
        issues.check_name(&format!("data_components.{key}.name"), &component.name);
    }
    for (key, component) in &graph.artifact_components {
        issues.check_key("artifact_components", key, &component.id);
        issues.check_name(&format!("artifact_components.{key}.name"), &component.name);
    }
    for (key, credential) in &graph.credential_references {
        issues.check_key("credential_references", key, &credential.id);
    }

    let has_tool = |id: &str| graph.tools.contains_key(id) || catalog.tools.contains(id);
    let has_credential = |id: &str| {
        graph.credential_references.contains_key(id) || catalog.credential_references.contains(id)
    };

    for (key, tool) in &graph.tools {
        if let Some(credential) = tool.credential_reference_id.as_deref() {
            if !has_credential(credential) {
                issues.push(format!(
                    "tools.{key} references unknown credential reference '{credential}'"
                ));
            }
        }
    }

    if let Some(config) = &graph.context_config {
        issues.check_id("context_config.id", &config.id);
        issues.check_name("context_config.name", &config.name);
        if let Some(declared) = graph.context_config_id.as_deref() {
            if declared != config.id {
                issues.push(format!(
                    "context_config_id '{declared}' does not match context_config.id '{}'",
                    config.id
                ));
            }
        }
    } else if let Some(declared) = graph.context_config_id.as_deref() {
        if !catalog.context_configs.contains(declared) {
            issues.push(format!("context_config_id references unknown context config '{declared}'"));
        }
    }

    match graph.default_agent_id.as_deref() {
        Some(default) => match graph.agents.get(default) {
            Some(agent) if agent.is_internal() => {}
            Some(_) => issues.push(format!("default agent '{default}' must be an internal agent")),
            None => issues.push(format!("default agent '{default}' is not defined in agents")),
        },
        None if !graph.agents.is_empty() => {
            issues.push("default_agent_id is required when the graph has agents")
        }
        None => {}
    }

    for (key, agent) in &graph.agents {
        issues.check_key("agents", key, agent.id());
        issues.check_name(&format!("agents.{key}.name"), agent.name());

        match agent {
            AgentDefinition::External(external) => {
                if external.base_url.trim().is_empty() {
                    issues.push(format!("agents.{key}.base_url must not be empty"));
                }
                if let Some(credential) = external.credential_reference_id.as_deref() {
                    if !has_credential(credential) {
                        issues.push(format!(
                            "agents.{key} references unknown credential reference '{credential}'"
                        ));
                    }
                }
            }
            AgentDefinition::Internal(internal) => {
                issues.check_unique(&format!("agents.{key}.can_transfer_to"), &internal.can_transfer_to);
                issues.check_unique(&format!("agents.{key}.can_delegate_to"), &internal.can_delegate_to);
                issues.check_unique(&format!("agents.{key}.tools"), &internal.tools);
                issues.check_unique(&format!("agents.{key}.data_components"), &internal.data_components);
                issues.check_unique(
                    &format!("agents.{key}.artifact_components"),
                    &internal.artifact_components,
                );

                for target in &internal.can_transfer_to {
                    match graph.agents.get(target) {
                        Some(t) if t.is_internal() => {}
                        Some(_) => issues.push(format!(
                            "agents.{key} cannot transfer to external agent '{target}'"
                        )),
                        None => issues.push(format!(
                            "agents.{key} transfers to unknown agent '{target}'"
                        )),
                    }
                }
                for target in &internal.can_delegate_to {
                    if !graph.agents.contains_key(target) {
                        issues.push(format!("agents.{key} delegates to unknown agent '{target}'"));
                    }
                    if target == key {
                        issues.push(format!("agents.{key} cannot delegate to itself"));
                    }
                }
                for tool in &internal.tools {
                    if !has_tool(tool) {
                        issues.push(format!("agents.{key} uses unknown tool '{tool}'"));
                    }
                }
                for tool in internal.selected_tools.keys() {
                    if !internal.tools.contains(tool) {
                        issues.push(format!(
                            "agents.{key}.selected_tools references tool '{tool}' the agent does not use"
                        ));
                    }
                }
                for tool in internal.tool_headers.keys() {
                    if !internal.tools.contains(tool) {
                        issues.push(format!(
                            "agents.{key}.tool_headers references tool '{tool}' the agent does not use"
                        ));
                    }
                }
                for component in &internal.data_components {
                    if !graph.data_components.contains_key(component)
                        && !catalog.data_components.contains(component)
                    {
                        issues.push(format!(
                            "agents.{key} uses unknown data component '{component}'"
                        ));
                    }
                }
                for component in &internal.artifact_components {
                    if !graph.artifact_components.contains_key(component)
                        && !catalog.artifact_components.contains(component)
                    {
                        issues.push(format!(
                            "agents.{key} uses unknown artifact component '{component}'"
                        ));
                    }
                }
            }
        }
    }
}

/// Validate a full project definition, including every graph in it.
pub fn validate_project_definition(project: &FullProjectDefinition) -> Result<(), ValidationError> {
    let mut issues = Issues::default();
    issues.check_id("id", &project.id);
    issues.check_name("name", &project.name);

    for (key, tool) in &project.tools {
        issues.check_key("tools", key, &tool.id);
    }
    for (key, component) in &project.data_components {
        issues.check_key("data_components", key, &component.id);
    }
    for (key, component) in &project.artifact_components {
        issues.check_key("artifact_components", key, &component.id);
    }
    for (key, credential) in &project.credential_references {
        issues.check_key("credential_references", key, &credential.id);
    }
    for (key, config) in &project.context_configs {
        issues.check_key("context_configs", key, &config.id);
    }

    let catalog = ProjectCatalog::from_project(project);
    for (key, graph) in &project.graphs {
        if key != &graph.id {
            issues.push(format!("graphs: key '{key}' does not match id '{}'", graph.id));
        }
        let mut graph_issues = Issues {
            prefix: format!("graphs.{key}: "),
            items: Vec::new(),
        };
        collect_graph_issues(graph, &catalog, &mut graph_issues);
        issues.items.extend(graph_issues.items);
    }

    issues.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{
        ExternalAgentDefinition, InternalAgentDefinition, ToolDefinition,
    };
    use crate::entities::McpToolConfig;

    fn internal(id: &str) -> InternalAgentDefinition {
        InternalAgentDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            prompt: format!("You are {id}"),
            ..Default::default()
        }
    }

    fn graph_with(agents: Vec<AgentDefinition>) -> FullGraphDefinition {
        let mut graph = FullGraphDefinition::new("support", "Support");
        for agent in agents {
            graph.agents.insert(agent.id().to_string(), agent);
        }
        graph.default_agent_id = graph.agents.keys().next().cloned();
        graph
    }

    fn issues(result: Result<(), ValidationError>) -> Vec<String> {
        match result {
            Ok(()) => Vec::new(),
            Err(ValidationError::Definition { issues }) => issues,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_graph() {
        let mut router = internal("router");
        router.can_transfer_to = vec!["billing".to_string()];
        router.can_delegate_to = vec!["partner".to_string()];
        let graph = graph_with(vec![
            AgentDefinition::Internal(router),
            AgentDefinition::Internal(internal("billing")),
            AgentDefinition::External(ExternalAgentDefinition {
                id: "partner".to_string(),
                name: "Partner".to_string(),
                description: None,
                base_url: "https://partner.example.com".to_string(),
                credential_reference_id: None,
                headers: None,
            }),
        ]);
        let mut graph = graph;
        graph.default_agent_id = Some("router".to_string());
        assert!(validate_graph_definition(&graph, &ProjectCatalog::default()).is_ok());
    }

    #[test]
    fn test_unknown_targets_are_reported() {
        let mut router = internal("router");
        router.can_transfer_to = vec!["ghost".to_string()];
        router.tools = vec!["weather".to_string()];
        router.data_components = vec!["card".to_string()];
        let graph = graph_with(vec![AgentDefinition::Internal(router)]);

        let found = issues(validate_graph_definition(&graph, &ProjectCatalog::default()));
        assert_eq!(found.len(), 3, "{found:?}");
        assert!(found.iter().any(|i| i.contains("unknown agent 'ghost'")));
        assert!(found.iter().any(|i| i.contains("unknown tool 'weather'")));
        assert!(found.iter().any(|i| i.contains("unknown data component 'card'")));
    }

    #[test]
    fn test_duplicate_references_are_reported() {
        let mut router = internal("router");
        router.can_transfer_to = vec!["billing".to_string(), "billing".to_string()];
        router.can_delegate_to = vec!["billing".to_string(), "billing".to_string(), "billing".to_string()];
        router.tools = vec!["weather".to_string(), "weather".to_string()];
        let graph = graph_with(vec![
            AgentDefinition::Internal(router),
            AgentDefinition::Internal(internal("billing")),
        ]);
        let mut catalog = ProjectCatalog::default();
        catalog.tools.insert("weather".to_string());

        let mut graph = graph;
        graph.default_agent_id = Some("router".to_string());
        let found = issues(validate_graph_definition(&graph, &catalog));
        assert_eq!(
            found,
            vec![
                "agents.router.can_transfer_to lists 'billing' more than once".to_string(),
                "agents.router.can_delegate_to lists 'billing' more than once".to_string(),
                "agents.router.tools lists 'weather' more than once".to_string(),
            ]
        );
    }

    #[test]
    fn test_catalog_satisfies_references() {
        let mut router = internal("router");
        router.tools = vec!["weather".to_string()];
        router
            .selected_tools
            .insert("weather".to_string(), vec!["forecast".to_string()]);
        let graph = graph_with(vec![AgentDefinition::Internal(router)]);

        let mut catalog = ProjectCatalog::default();
        catalog.tools.insert("weather".to_string());
        assert!(validate_graph_definition(&graph, &catalog).is_ok());
    }

    #[test]
    fn test_selected_tools_must_be_used() {
        let mut router = internal("router");
        router
            .selected_tools
            .insert("weather".to_string(), vec!["forecast".to_string()]);
        let graph = graph_with(vec![AgentDefinition::Internal(router)]);
        let found = issues(validate_graph_definition(&graph, &ProjectCatalog::default()));
        assert!(found[0].contains("selected_tools"));
    }

    #[test]
    fn test_default_agent_rules() {
        let mut graph = graph_with(vec![AgentDefinition::Internal(internal("router"))]);
        graph.default_agent_id = None;
        assert_eq!(
            issues(validate_graph_definition(&graph, &ProjectCatalog::default())).len(),
            1
        );

        graph.default_agent_id = Some("missing".to_string());
        let found = issues(validate_graph_definition(&graph, &ProjectCatalog::default()));
        assert!(found[0].contains("not defined"));

        let empty = FullGraphDefinition::new("empty", "Empty");
        assert!(validate_graph_definition(&empty, &ProjectCatalog::default()).is_ok());
    }

    #[test]
    fn test_map_key_must_match_id() {
        let mut graph = FullGraphDefinition::new("support", "Support");
        graph.tools.insert(
            "weather".to_string(),
            ToolDefinition {
                id: "forecast".to_string(),
                name: "Forecast".to_string(),
                config: McpToolConfig {
                    server_url: "http://localhost:9000/mcp".to_string(),
                    transport: Default::default(),
                    active_tools: None,
                },
                credential_reference_id: None,
                headers: None,
                image_url: None,
                capabilities: None,
            },
        );
        let found = issues(validate_graph_definition(&graph, &ProjectCatalog::default()));
        assert!(found[0].contains("does not match"));
    }

    #[test]
    fn test_project_issues_are_prefixed_by_graph() {
        let mut project = FullProjectDefinition::new("acme-support", "Acme Support");
        let mut router = internal("router");
        router.can_transfer_to = vec!["ghost".to_string()];
        let graph = graph_with(vec![AgentDefinition::Internal(router)]);
        project.graphs.insert(graph.id.clone(), graph);

        let found = issues(validate_project_definition(&project));
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("graphs.support: "));
    }

    #[test]
    fn test_project_tools_visible_to_graphs() {
        let mut project = FullProjectDefinition::new("acme", "Acme");
        project.tools.insert(
            "weather".to_string(),
            ToolDefinition {
                id: "weather".to_string(),
                name: "Weather".to_string(),
                config: McpToolConfig {
                    server_url: "http://localhost:9000/mcp".to_string(),
                    transport: Default::default(),
                    active_tools: None,
                },
                credential_reference_id: None,
                headers: None,
                image_url: None,
                capabilities: None,
            },
        );
        let mut router = internal("router");
        router.tools = vec!["weather".to_string()];
        let graph = graph_with(vec![AgentDefinition::Internal(router)]);
        project.graphs.insert(graph.id.clone(), graph);
        assert!(validate_project_definition(&project).is_ok());
    }
}
