pub mod init;
pub mod list_graphs;
pub mod pull;
pub mod push;

use anyhow::{Context, Result};
use std::path::Path;

use crate::client::ApiClient;
use crate::config::CliConfig;

/// Load the workspace config and build a client for it.
pub fn connect(config_path: &Path) -> Result<(CliConfig, ApiClient)> {
    let config = CliConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if config.auth.is_empty() {
        tracing::warn!("No credentials configured; set AGENTS_API_KEY or AGENTS_BYPASS_SECRET");
    }
    let client = ApiClient::new(&config).context("Failed to build API client")?;
    Ok((config, client))
}
