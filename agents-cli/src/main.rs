//! `agents` entry point.

use std::path::PathBuf;

use agents_cli::commands::{self, init::InitOptions};
use agents_cli::config::CONFIG_FILE_NAME;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agents", version, about = "Manage agent graph projects")]
struct Cli {
    /// Log filter, e.g. `debug` or `agents_cli=trace`
    #[arg(long, global = true, env = "AGENTS_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scaffold a new project workspace
    Init {
        dir: PathBuf,
        #[arg(long, default_value = "default")]
        tenant_id: String,
        #[arg(long, default_value = "my-project")]
        project_id: String,
        #[arg(long, default_value = "http://localhost:3000")]
        api_url: String,
        /// Write into a non-empty directory
        #[arg(long)]
        force: bool,
    },
    /// Validate a project file and upload it
    Push {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Project file (defaults to projects/<project_id>.json)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Download a project and write it to disk
    Pull {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        #[arg(long)]
        project_id: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the graphs of the configured project
    ListGraphs {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Command::Init {
            dir,
            tenant_id,
            project_id,
            api_url,
            force,
        } => {
            let options = InitOptions {
                tenant_id,
                project_id,
                api_url,
                force,
            };
            commands::init::run(&dir, &options)?;
        }
        Command::Push { config, file } => {
            commands::push::run(&config, file).await?;
        }
        Command::Pull {
            config,
            project_id,
            output,
        } => {
            commands::pull::run(&config, project_id, output).await?;
        }
        Command::ListGraphs { config } => {
            commands::list_graphs::run(&config).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_defaults_to_workspace_config() {
        let cli = Cli::try_parse_from(["agents", "push"]).expect("parse");
        match cli.command {
            Command::Push { config, file } => {
                assert_eq!(config, PathBuf::from(CONFIG_FILE_NAME));
                assert!(file.is_none());
            }
            _ => panic!("expected push"),
        }
    }
}
