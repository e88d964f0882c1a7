use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use agents_core::FullProjectDefinition;

/// Fetch a project and write it as pretty JSON. Returns the path written.
pub async fn run(
    config_path: &Path,
    project_id: Option<String>,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let (config, client) = super::connect(config_path)?;
    let project_id = project_id.unwrap_or_else(|| config.project_id.clone());

    let project = client
        .pull_project(&project_id)
        .await
        .map_err(super::push::describe)?;

    let path = match output {
        Some(path) => path,
        None => {
            let mut for_project = config.clone();
            for_project.project_id = project_id;
            for_project.project_file(config_path)
        }
    };
    write_project(&path, &project)?;
    println!(
        "Pulled project '{}' ({} graph(s)) into {}",
        project.id,
        project.graphs.len(),
        path.display()
    );
    Ok(path)
}

/// Timestamps are server state and stay out of the file.
pub fn write_project(path: &Path, project: &FullProjectDefinition) -> Result<()> {
    let mut project = project.clone();
    project.created_at = None;
    project.updated_at = None;
    for graph in project.graphs.values_mut() {
        graph.created_at = None;
        graph.updated_at = None;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&project).context("Failed to render project")?;
    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}
