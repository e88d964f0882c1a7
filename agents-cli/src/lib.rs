//! Agents CLI
//!
//! Scaffolds project workspaces and moves full project definitions between
//! disk and a running agents API.

pub mod client;
pub mod commands;
pub mod config;
pub mod templates;

pub use client::{ApiClient, ApiClientError, PushOutcome};
pub use config::{CliConfig, ConfigError, Credentials};
