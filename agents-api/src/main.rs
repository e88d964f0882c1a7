//! Agents API Server Entry Point
//!
//! Bootstraps configuration, opens the configured store and starts the Axum
//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use agents_api::telemetry::{init_tracer, InstrumentedStore, TelemetryConfig};
use agents_api::{
    create_api_router, db, ApiConfig, ApiError, ApiResult, AuthConfig, DbConfig, PgStore,
    StorageBackend,
};
use agents_storage::{InMemoryStore, SharedStore};
use axum::Router;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let auth_config = AuthConfig::from_env();

    let store = open_store(api_config.storage_backend).await?;
    let store: SharedStore = Arc::new(InstrumentedStore::new(store));

    let app: Router = create_api_router(store, &api_config, auth_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, backend = ?api_config.storage_backend, "Starting Agents API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(backend: StorageBackend) -> ApiResult<SharedStore> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PgStore::from_config(&DbConfig::from_env())?;
            db::migrate(store.pool()).await?;
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("AGENTS_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("AGENTS_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::bad_request(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::bad_request(format!("Invalid bind address {}: {}", addr, e)))
}
