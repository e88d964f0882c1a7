//! Enumerations shared across entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidValue {
                        field: stringify!($name).to_string(),
                        reason: format!("unknown value '{}'", other),
                    }),
                }
            }
        }
    };
}

/// How one agent hands work to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Control moves to the target agent for the rest of the turn.
    Transfer,
    /// The target agent runs as a sub-task and reports back.
    Delegate,
}

string_enum!(RelationType { Transfer => "transfer", Delegate => "delegate" });

/// Health of an MCP tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Healthy,
    Unhealthy,
    #[default]
    Unknown,
    Disabled,
}

string_enum!(ToolStatus {
    Healthy => "healthy",
    Unhealthy => "unhealthy",
    Unknown => "unknown",
    Disabled => "disabled",
});

/// Backing store for a credential reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CredentialStoreType {
    Memory,
    Keychain,
    Nango,
}

string_enum!(CredentialStoreType {
    Memory => "memory",
    Keychain => "keychain",
    Nango => "nango",
});

/// MCP transport used to reach a tool server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum McpTransportType {
    #[default]
    StreamableHttp,
    Sse,
}

string_enum!(McpTransportType {
    StreamableHttp => "streamable_http",
    Sse => "sse",
});

/// Author role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

string_enum!(MessageRole {
    User => "user",
    Agent => "agent",
    System => "system",
});

/// Who may see a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MessageVisibility {
    #[default]
    UserFacing,
    Internal,
    System,
    External,
}

string_enum!(MessageVisibility {
    UserFacing => "user_facing",
    Internal => "internal",
    System => "system",
    External => "external",
});

/// Kind of stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Chat,
    A2aRequest,
    A2aResponse,
    TaskUpdate,
    ToolCall,
}

string_enum!(MessageType {
    Chat => "chat",
    A2aRequest => "a2a_request",
    A2aResponse => "a2a_response",
    TaskUpdate => "task_update",
    ToolCall => "tool_call",
});

/// How much conversation history an agent receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    #[default]
    Full,
    Scoped,
    None,
}

string_enum!(HistoryMode {
    Full => "full",
    Scoped => "scoped",
    None => "none",
});
