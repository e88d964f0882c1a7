//! Error types for agent graph operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Referenced {entity} does not exist: {id}")]
    MissingReference { entity: &'static str, id: String },

    #[error("Row for {table} could not be decoded: {reason}")]
    Decode { table: &'static str, reason: String },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },

    #[error("Storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid identifier for {field}: '{value}' ({reason})")]
    InvalidId {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Definition is invalid: {}", .issues.join("; "))]
    Definition { issues: Vec<String> },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for the platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentsError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AgentsError {
    /// Shorthand for a `StorageError::NotFound`.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StorageError::NotFound {
            entity,
            id: id.into(),
        }
        .into()
    }

    /// Shorthand for a `StorageError::Backend`.
    pub fn backend(reason: impl Into<String>) -> Self {
        StorageError::Backend {
            reason: reason.into(),
        }
        .into()
    }

    /// Shorthand for a `ValidationError::InvalidValue`.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
        .into()
    }

    /// True when the error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentsError::Storage(StorageError::NotFound { .. }))
    }

    /// True when the error reports a duplicate key.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AgentsError::Storage(StorageError::AlreadyExists { .. }))
    }
}

/// Result type alias for platform operations.
pub type AgentsResult<T> = Result<T, AgentsError>;
