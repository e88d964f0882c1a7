//! Configuration loading for the agents CLI.
//!
//! A workspace carries an `agents.config.toml` next to its `projects/`
//! directory. Credentials come from the environment first and the file
//! second, so the file can be committed without secrets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "agents.config.toml";
pub const API_KEY_ENV: &str = "AGENTS_API_KEY";
pub const BYPASS_SECRET_ENV: &str = "AGENTS_BYPASS_SECRET";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub api_url: String,
    pub tenant_id: String,
    pub project_id: String,
    /// Directory holding `<project>.json`, relative to the config file.
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Credentials::is_empty")]
    pub auth: Credentials,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_secret: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.bypass_secret.is_none()
    }

    /// Fill unset credentials from `AGENTS_API_KEY` and `AGENTS_BYPASS_SECRET`.
    /// Environment values win over the file.
    pub fn apply_env(&mut self) {
        let from_env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(key) = from_env(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(secret) = from_env(BYPASS_SECRET_ENV) {
            self.bypass_secret = Some(secret);
        }
    }
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("projects")
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to render config TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CliConfig {
    pub fn new(
        api_url: impl Into<String>,
        tenant_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            tenant_id: tenant_id.into(),
            project_id: project_id.into(),
            projects_dir: default_projects_dir(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            auth: Credentials::default(),
        }
    }

    /// Read, overlay environment credentials, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_path(path)?;
        config.auth.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        agents_core::validate_resource_id("tenant_id", &self.tenant_id).map_err(|e| {
            ConfigError::InvalidValue {
                field: "tenant_id",
                reason: e.to_string(),
            }
        })?;
        agents_core::validate_resource_id("project_id", &self.project_id).map_err(|e| {
            ConfigError::InvalidValue {
                field: "project_id",
                reason: e.to_string(),
            }
        })?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Default project file, resolved against the directory of `config_path`.
    pub fn project_file(&self, config_path: &Path) -> PathBuf {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        base.join(&self.projects_dir)
            .join(format!("{}.json", self.project_id))
    }
}
