use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CliConfig, CONFIG_FILE_NAME};
use crate::templates;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub tenant_id: String,
    pub project_id: String,
    pub api_url: String,
    pub force: bool,
}

/// Write a project workspace into `dir`. Returns the files written.
pub fn run(dir: &Path, options: &InitOptions) -> Result<Vec<PathBuf>> {
    let config = CliConfig::new(&options.api_url, &options.tenant_id, &options.project_id);
    config.validate().context("Invalid init options")?;

    if dir.exists() && !options.force {
        let occupied = fs::read_dir(dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .next()
            .is_some();
        if occupied {
            anyhow::bail!(
                "{} is not empty; pass --force to overwrite",
                dir.display()
            );
        }
    }

    let projects_dir = dir.join(&config.projects_dir);
    fs::create_dir_all(&projects_dir)
        .with_context(|| format!("Failed to create {}", projects_dir.display()))?;

    let project = templates::sample_project(&options.project_id);
    let project_json =
        serde_json::to_string_pretty(&project).context("Failed to render sample project")?;

    let files = [
        (dir.join(CONFIG_FILE_NAME), config.to_toml()?),
        (
            projects_dir.join(format!("{}.json", options.project_id)),
            format!("{project_json}\n"),
        ),
        (dir.join(".env.example"), templates::ENV_EXAMPLE.to_string()),
        (
            dir.join("docker-compose.yml"),
            templates::DOCKER_COMPOSE.to_string(),
        ),
        (
            dir.join("README.md"),
            templates::readme(&options.tenant_id, &options.project_id),
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (path, contents) in files {
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Wrote file");
        written.push(path);
    }

    println!(
        "Initialized project '{}' for tenant '{}' in {}",
        options.project_id,
        options.tenant_id,
        dir.display()
    );
    Ok(written)
}
