//! Nested settings objects stored as JSON columns.

use serde::{Deserialize, Serialize};

use crate::enums::HistoryMode;

/// Model choice for one purpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub provider_options: Option<serde_json::Value>,
}

/// Models used by a project, graph or agent. Unset entries inherit from the
/// enclosing level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<ModelSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<ModelSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarizer: Option<ModelSetting>,
}

/// Execution limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StopWhen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_count_is: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count_is: Option<u32>,
}

/// Settings for progress updates streamed while a graph runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusUpdateSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_events: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Conversation history an agent is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConversationHistoryConfig {
    #[serde(default)]
    pub mode: HistoryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_internal: Option<bool>,
}
