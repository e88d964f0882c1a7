use anyhow::Result;
use std::path::Path;

use agents_core::AgentGraph;

pub async fn run(config_path: &Path) -> Result<Vec<AgentGraph>> {
    let (config, client) = super::connect(config_path)?;
    let graphs = client
        .list_graphs(&config.project_id)
        .await
        .map_err(super::push::describe)?;

    if graphs.is_empty() {
        println!("No graphs in project '{}'", config.project_id);
    }
    for graph in &graphs {
        println!(
            "{:<32} {:<32} default: {}",
            graph.id,
            graph.name,
            graph.default_agent_id.as_deref().unwrap_or("-")
        );
    }
    Ok(graphs)
}
