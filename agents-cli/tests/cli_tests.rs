//! Workspace scaffolding and push/pull against an in-process API server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agents_api::{create_api_router, ApiConfig, AuthConfig};
use agents_cli::commands::{self, init::InitOptions};
use agents_cli::config::{CliConfig, CONFIG_FILE_NAME};
use agents_cli::templates::SAMPLE_GRAPH_ID;
use agents_storage::InMemoryStore;
use secrecy::SecretString;
use tempfile::TempDir;

const BYPASS_SECRET: &str = "cli-test-bypass-secret-0123456789";

fn options(api_url: &str) -> InitOptions {
    InitOptions {
        tenant_id: "acme".to_string(),
        project_id: "support".to_string(),
        api_url: api_url.to_string(),
        force: false,
    }
}

/// Serve the API over an in-memory store on an ephemeral port.
async fn spawn_api() -> String {
    let store = Arc::new(InMemoryStore::new());
    let api_config = ApiConfig {
        rate_limit_enabled: false,
        ..ApiConfig::default()
    };
    let auth_config = AuthConfig {
        bypass_secret: Some(SecretString::new(BYPASS_SECRET.into())),
        ..AuthConfig::default()
    };
    let router = create_api_router(store, &api_config, auth_config).expect("router");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });
    format!("http://{addr}")
}

/// Scaffold a workspace pointed at `api_url` with the bypass secret filled in.
fn workspace(api_url: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    commands::init::run(dir.path(), &options(api_url)).expect("init");

    let config_path = dir.path().join(CONFIG_FILE_NAME);
    let mut config = CliConfig::from_path(&config_path).expect("config");
    config.auth.bypass_secret = Some(BYPASS_SECRET.to_string());
    std::fs::write(&config_path, config.to_toml().expect("toml")).expect("write config");
    (dir, config_path)
}

fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = files
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

#[test]
fn test_init_writes_workspace() {
    let dir = TempDir::new().expect("tempdir");
    let written = commands::init::run(dir.path(), &options("http://localhost:3000")).expect("init");

    assert_eq!(
        relative(dir.path(), &written),
        vec![
            ".env.example",
            "README.md",
            "agents.config.toml",
            "docker-compose.yml",
            "projects/support.json",
        ]
    );

    let config = CliConfig::load(&dir.path().join(CONFIG_FILE_NAME)).expect("config");
    assert_eq!(config.tenant_id, "acme");
    assert_eq!(config.project_id, "support");

    let project = commands::push::read_project(&dir.path().join("projects/support.json"))
        .expect("valid project");
    assert_eq!(project.id, "support");
    assert!(project.graphs.contains_key(SAMPLE_GRAPH_ID));
}

#[test]
fn test_init_refuses_non_empty_dir_without_force() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), "keep me").expect("write");

    let err = commands::init::run(dir.path(), &options("http://localhost:3000")).unwrap_err();
    assert!(err.to_string().contains("--force"), "{err}");

    let forced = InitOptions {
        force: true,
        ..options("http://localhost:3000")
    };
    commands::init::run(dir.path(), &forced).expect("forced init");
    assert!(dir.path().join("notes.txt").exists());
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
}

#[test]
fn test_init_rejects_invalid_ids() {
    let dir = TempDir::new().expect("tempdir");
    let bad = InitOptions {
        project_id: "not valid".to_string(),
        ..options("http://localhost:3000")
    };
    assert!(commands::init::run(&dir.path().join("ws"), &bad).is_err());
    assert!(!dir.path().join("ws").exists());
}

#[test]
fn test_read_project_rejects_invalid_definition() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.json");
    let mut project = agents_cli::templates::sample_project("support");
    if let Some(graph) = project.graphs.get_mut(SAMPLE_GRAPH_ID) {
        graph.default_agent_id = Some("nobody".to_string());
    }
    std::fs::write(&path, serde_json::to_string(&project).expect("json")).expect("write");

    let err = commands::push::read_project(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed validation"), "{err:#}");
}

#[tokio::test]
async fn test_push_list_and_pull() {
    let api_url = spawn_api().await;
    let (dir, config_path) = workspace(&api_url);

    let outcome = commands::push::run(&config_path, None).await.expect("push");
    assert!(outcome.created);
    assert_eq!(outcome.project.graphs.len(), 1);

    let outcome = commands::push::run(&config_path, None).await.expect("second push");
    assert!(!outcome.created);

    let graphs = commands::list_graphs::run(&config_path).await.expect("list");
    assert_eq!(graphs.len(), 1);
    assert_eq!(graphs[0].id, SAMPLE_GRAPH_ID);
    assert_eq!(graphs[0].default_agent_id.as_deref(), Some("triage"));

    let output = dir.path().join("pulled/support.json");
    let written = commands::pull::run(&config_path, None, Some(output.clone()))
        .await
        .expect("pull");
    assert_eq!(written, output);

    let text = std::fs::read_to_string(&output).expect("read pulled");
    assert!(!text.contains("created_at"));
    let pulled = commands::push::read_project(&output).expect("pulled project is valid");
    let local = commands::push::read_project(&dir.path().join("projects/support.json"))
        .expect("local project");
    assert_eq!(
        pulled.graphs[SAMPLE_GRAPH_ID].agents,
        local.graphs[SAMPLE_GRAPH_ID].agents
    );
}

#[tokio::test]
async fn test_pull_missing_project_reports_not_found() {
    let api_url = spawn_api().await;
    let (_dir, config_path) = workspace(&api_url);

    let err = commands::pull::run(&config_path, Some("ghost".to_string()), None)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("not_found"), "{err:#}");
}

#[tokio::test]
async fn test_push_without_credentials_is_unauthorized() {
    let api_url = spawn_api().await;
    let dir = TempDir::new().expect("tempdir");
    commands::init::run(dir.path(), &options(&api_url)).expect("init");
    let config_path = dir.path().join(CONFIG_FILE_NAME);

    if std::env::var("AGENTS_API_KEY").is_ok() || std::env::var("AGENTS_BYPASS_SECRET").is_ok() {
        return;
    }
    let err = commands::push::run(&config_path, None).await.unwrap_err();
    assert!(format!("{err:#}").contains("unauthorized"), "{err:#}");
}
