use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use agents_core::FullProjectDefinition;

use crate::client::{ApiClientError, PushOutcome};

/// Read a project document from disk and validate it.
pub fn read_project(path: &Path) -> Result<FullProjectDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let project: FullProjectDefinition = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a project definition", path.display()))?;
    agents_core::validate_project_definition(&project)
        .with_context(|| format!("{} failed validation", path.display()))?;
    Ok(project)
}

pub async fn run(config_path: &Path, file: Option<PathBuf>) -> Result<PushOutcome> {
    let (config, client) = super::connect(config_path)?;
    let path = file.unwrap_or_else(|| config.project_file(config_path));
    let project = read_project(&path)?;
    if project.id != config.project_id {
        tracing::warn!(
            file_project = %project.id,
            config_project = %config.project_id,
            "Pushing a project other than the configured one"
        );
    }

    let outcome = client.push_project(&project).await.map_err(describe)?;
    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "{verb} project '{}' with {} graph(s)",
        outcome.project.id,
        outcome.project.graphs.len()
    );
    Ok(outcome)
}

/// Attach the server's validation messages to the error.
pub(crate) fn describe(err: ApiClientError) -> anyhow::Error {
    match &err {
        ApiClientError::Problem { errors, .. } if !errors.is_empty() => {
            let details = errors.join("\n  - ");
            anyhow::Error::new(err).context(format!("Server rejected the request:\n  - {details}"))
        }
        _ => anyhow::Error::new(err),
    }
}
