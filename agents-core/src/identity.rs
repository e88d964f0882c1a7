//! Resource identifiers and tenancy scopes.
//!
//! Every resource in the platform lives inside a tenant, and most live inside
//! a project. Graph-level resources (agents, relations, external agents) add a
//! graph id, and agent-level associations add an agent id. The scope structs
//! below carry exactly those coordinates so data-access functions can never be
//! called without them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length of a caller-chosen resource id.
pub const MAX_RESOURCE_ID_LEN: usize = 255;

static RESOURCE_ID_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_.]+$").ok());

/// Check a caller-chosen id against the resource id rules.
///
/// Ids are 1..=255 characters drawn from ASCII letters, digits, `-`, `_`
/// and `.`.
pub fn validate_resource_id(field: &str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidId {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.len() > MAX_RESOURCE_ID_LEN {
        return Err(invalid("must be at most 255 characters"));
    }
    let matches = match RESOURCE_ID_PATTERN.as_ref() {
        Some(pattern) => pattern.is_match(value),
        None => value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')),
    };
    if !matches {
        return Err(invalid(
            "may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    Ok(())
}

/// Generate a server-side id (UUIDv7, time ordered).
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

// ============================================================================
// SCOPES
// ============================================================================

/// Tenant-level scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: String,
}

/// Project-level scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectScope {
    pub tenant_id: String,
    pub project_id: String,
}

/// Graph-level scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphScope {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
}

/// Agent-level scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentScope {
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub agent_id: String,
}

impl TenantScope {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }

    pub fn project(&self, project_id: impl Into<String>) -> ProjectScope {
        ProjectScope {
            tenant_id: self.tenant_id.clone(),
            project_id: project_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_resource_id("tenant_id", &self.tenant_id)
    }
}

impl ProjectScope {
    pub fn new(tenant_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn tenant(&self) -> TenantScope {
        TenantScope::new(self.tenant_id.clone())
    }

    pub fn graph(&self, graph_id: impl Into<String>) -> GraphScope {
        GraphScope {
            tenant_id: self.tenant_id.clone(),
            project_id: self.project_id.clone(),
            graph_id: graph_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_resource_id("tenant_id", &self.tenant_id)?;
        validate_resource_id("project_id", &self.project_id)
    }
}

impl GraphScope {
    pub fn new(
        tenant_id: impl Into<String>,
        project_id: impl Into<String>,
        graph_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            project_id: project_id.into(),
            graph_id: graph_id.into(),
        }
    }

    pub fn project(&self) -> ProjectScope {
        ProjectScope::new(self.tenant_id.clone(), self.project_id.clone())
    }

    pub fn agent(&self, agent_id: impl Into<String>) -> AgentScope {
        AgentScope {
            tenant_id: self.tenant_id.clone(),
            project_id: self.project_id.clone(),
            graph_id: self.graph_id.clone(),
            agent_id: agent_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.project().validate()?;
        validate_resource_id("graph_id", &self.graph_id)
    }
}

impl AgentScope {
    pub fn graph(&self) -> GraphScope {
        GraphScope::new(
            self.tenant_id.clone(),
            self.project_id.clone(),
            self.graph_id.clone(),
        )
    }

    pub fn project(&self) -> ProjectScope {
        ProjectScope::new(self.tenant_id.clone(), self.project_id.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.graph().validate()?;
        validate_resource_id("agent_id", &self.agent_id)
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tenant_id)
    }
}

impl std::fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.project_id)
    }
}

impl std::fmt::Display for GraphScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.project_id, self.graph_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_ids() {
        assert!(validate_resource_id("id", "weather-agent").is_ok());
        assert!(validate_resource_id("id", "v1.2_router").is_ok());
        assert!(validate_resource_id("id", "A").is_ok());
    }

    #[test]
    fn test_invalid_ids() {
        assert!(validate_resource_id("id", "").is_err());
        assert!(validate_resource_id("id", "has space").is_err());
        assert!(validate_resource_id("id", "slash/inside").is_err());
        assert!(validate_resource_id("id", &"a".repeat(256)).is_err());
    }

    #[test]
    fn test_invalid_id_reports_field() {
        let err = validate_resource_id("graph_id", "bad id").unwrap_err();
        match err {
            ValidationError::InvalidId { field, value, .. } => {
                assert_eq!(field, "graph_id");
                assert_eq!(value, "bad id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scope_navigation() {
        let project = TenantScope::new("acme").project("support");
        let graph = project.graph("triage");
        let agent = graph.agent("router");
        assert_eq!(agent.graph(), graph);
        assert_eq!(agent.project(), project);
        assert_eq!(graph.to_string(), "acme/support/triage");
    }

    #[test]
    fn test_scope_display() {
        let tenant = TenantScope::new("acme");
        assert_eq!(tenant.to_string(), "acme");
        assert_eq!(format!("tenant={}", tenant), "tenant=acme");
        assert_eq!(tenant.project("support").to_string(), "acme/support");
    }

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(validate_resource_id("id", &a).is_ok());
    }

    proptest! {
        #[test]
        fn prop_pattern_ids_are_accepted(id in "[a-zA-Z0-9._-]{1,255}") {
            prop_assert!(validate_resource_id("id", &id).is_ok());
        }

        #[test]
        fn prop_ids_with_forbidden_chars_are_rejected(
            prefix in "[a-z]{0,8}",
            bad in "[ /?#%@!]",
            suffix in "[a-z]{0,8}",
        ) {
            let id = format!("{prefix}{bad}{suffix}");
            prop_assert!(validate_resource_id("id", &id).is_err());
        }
    }
}
