//! Validation Traits
//!
//! Common validation patterns extracted from route handlers.

use agents_core::{
    AgentGraphUpdate, AgentRelationUpdate, AgentToolRelationUpdate, AgentUpdate, ApiKeyUpdate,
    ArtifactComponentUpdate, ContextConfigUpdate, ConversationUpdate, CredentialReferenceUpdate,
    DataComponentUpdate, ExternalAgentUpdate, ProjectUpdate, ToolUpdate,
};
use serde_json::Value as JsonValue;

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use agents_api::validation::ValidateNonEmpty;
///
/// fn create_agent(name: &str) -> ApiResult<()> {
///     name.validate_non_empty("name")?;
///     Ok(())
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for checking if an update request has any fields set.
pub trait HasUpdates {
    fn has_any_updates(&self) -> bool;

    /// Validate that at least one update field is set.
    fn validate_has_updates(&self) -> ApiResult<()> {
        if !self.has_any_updates() {
            return Err(ApiError::bad_request(
                "At least one field must be provided for update",
            ));
        }
        Ok(())
    }
}

macro_rules! impl_has_updates {
    ($($t:ty),* $(,)?) => {
        $(
            impl HasUpdates for $t {
                fn has_any_updates(&self) -> bool {
                    self.has_updates()
                }
            }
        )*
    };
}

impl_has_updates!(
    ProjectUpdate,
    AgentGraphUpdate,
    AgentUpdate,
    AgentRelationUpdate,
    ExternalAgentUpdate,
    ToolUpdate,
    AgentToolRelationUpdate,
    DataComponentUpdate,
    ArtifactComponentUpdate,
    ContextConfigUpdate,
    CredentialReferenceUpdate,
    ApiKeyUpdate,
    ConversationUpdate,
);

/// Check that `schema` is a JSON object that compiles as a JSON Schema.
pub fn validate_json_schema(field_name: &str, schema: &JsonValue) -> ApiResult<()> {
    if !schema.is_object() {
        return Err(ApiError::bad_request(format!(
            "Field '{}' must be a JSON Schema object",
            field_name
        )));
    }
    jsonschema::draft202012::new(schema).map_err(|e| {
        ApiError::bad_request(format!("Field '{}' is not a valid JSON Schema: {}", field_name, e))
    })?;
    Ok(())
}

/// Check an optional schema field.
pub fn validate_optional_json_schema(field_name: &str, schema: Option<&JsonValue>) -> ApiResult<()> {
    match schema {
        Some(schema) => validate_json_schema(field_name, schema),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_non_empty_str() {
        assert!("hello".validate_non_empty("test").is_ok());
        assert!("".validate_non_empty("test").is_err());
        assert!("   ".validate_non_empty("test").is_err());
    }

    #[test]
    fn test_validate_non_empty_option() {
        let some_str: Option<String> = Some("hello".to_string());
        let some_empty: Option<String> = Some(String::new());
        let none_str: Option<String> = None;

        assert!(some_str.validate_non_empty("test").is_ok());
        assert!(some_empty.validate_non_empty("test").is_err());
        assert!(none_str.validate_non_empty("test").is_err());
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert!(AgentUpdate::default().validate_has_updates().is_err());
        let update = AgentUpdate {
            name: Some("Router".to_string()),
            ..Default::default()
        };
        assert!(update.validate_has_updates().is_ok());
    }

    #[test]
    fn test_json_schema_checks() {
        let schema = json!({
            "type": "object",
            "properties": { "title": { "type": "string" } },
            "required": ["title"],
        });
        assert!(validate_json_schema("props", &schema).is_ok());
        assert!(validate_json_schema("props", &json!("not a schema")).is_err());
        assert!(validate_json_schema("props", &json!({"type": 12})).is_err());
        assert!(validate_optional_json_schema("full_props", None).is_ok());
    }
}
