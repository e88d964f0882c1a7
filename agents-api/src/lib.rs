//! Agents API - REST layer for the agent graph management platform
//!
//! Multi-tenant CRUD over projects, agent graphs and everything wired into
//! them, plus whole-graph and whole-project documents. Storage goes through
//! the `agents-storage` `Store` trait, backed by Postgres in production and
//! by the in-memory store in tests and local development.

#[macro_use]
mod macros;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    authenticate, authenticate_api_key, authenticate_jwt, ensure_project_access,
    ensure_tenant_access, generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext,
    AuthMethod, Claims,
};
pub use config::{ApiConfig, StorageBackend};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode, ProblemDetails};
pub use middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
#[cfg(any(test, feature = "dev"))]
pub use routes::create_api_router_unauthenticated;
pub use state::AppState;
