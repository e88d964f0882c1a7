//! REST API Routes Module
//!
//! Route handlers organized by entity type. Every tenant route lives under
//! `/tenants/:tenant_id` and runs behind authentication and rate limiting.
//!
//! Includes:
//! - Entity CRUD routes (projects, graphs, agents, relations, tools, ...)
//! - Full graph and full project documents
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics and the OpenAPI document
//! - CORS support for browser-based clients

pub mod agent;
pub mod agent_component;
pub mod agent_graph;
pub mod agent_relation;
pub mod agent_tool_relation;
pub mod api_key;
pub mod artifact_component;
pub mod context_config;
pub mod conversation;
pub mod credential;
pub mod data_component;
pub mod external_agent;
pub mod graph_full;
pub mod health;
pub mod project;
pub mod project_full;
pub mod tool;

use std::time::Duration;

use agents_storage::SharedStore;
use axum::{
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Request},
    http::{header, header::HeaderName, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{AuthConfig, AuthContext, AuthMethod};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{
    auth_middleware, client_rate_limit_middleware, rate_limit_middleware, AuthMiddlewareState,
    RateLimitState,
};
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};
use crate::types::DataResponse;

// ============================================================================
// RESPONSE HELPERS
// ============================================================================

/// 201 with the `{"data": ...}` envelope.
pub(crate) fn created<T: Serialize>(data: T) -> (StatusCode, Json<DataResponse<T>>) {
    (StatusCode::CREATED, Json(DataResponse::new(data)))
}

/// 200 with the `{"data": ...}` envelope.
pub(crate) fn ok<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse::new(data))
}

/// 204 when a row was removed, 404 otherwise.
pub(crate) fn deleted(removed: bool, entity: &str, id: &str) -> ApiResult<StatusCode> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::entity_not_found(entity, id))
    }
}

/// Project-level resources can only be created inside an existing project.
pub(crate) async fn ensure_project_exists(
    store: &dyn agents_storage::Store,
    project: &agents_core::ProjectScope,
) -> ApiResult<()> {
    if !agents_storage::access::projects::project_exists(store, project).await? {
        return Err(ApiError::entity_not_found("Project", &project.project_id));
    }
    Ok(())
}

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}

/// Handler for /openapi.yaml endpoint.
#[cfg(feature = "openapi")]
async fn openapi_yaml() -> impl IntoResponse {
    match crate::openapi::ApiDoc::to_yaml() {
        Ok(yaml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/yaml")], yaml),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::bad_request(
            "CORS origins not configured for production. Set AGENTS_CORS_ORIGINS.",
        ));
    }
    if !config.rate_limit_enabled {
        tracing::warn!(
            "Rate limiting is disabled in production. \
             Set AGENTS_RATE_LIMIT_ENABLED=true to enable rate limiting."
        );
    }
    Ok(())
}

// ============================================================================
// SECURE ROUTER BUILDER
// ============================================================================

/// Builder for the API router with auth and rate limiting on every tenant
/// route.
///
/// Public routes (health, metrics, OpenAPI) are exempt from both.
pub struct SecureRouterBuilder {
    state: AppState,
    api_config: ApiConfig,
    auth_state: Option<AuthMiddlewareState>,
    rate_limit_state: RateLimitState,
}

impl SecureRouterBuilder {
    /// Create a builder. In production this fails when security settings
    /// are missing.
    pub fn new(store: SharedStore, api_config: ApiConfig, auth_config: AuthConfig) -> ApiResult<Self> {
        let production = api_config.is_production();
        auth_config.validate_for_production(production)?;
        if production {
            validate_api_config_for_production(&api_config)?;
        }

        let auth_state = AuthMiddlewareState::new(auth_config, store.clone());
        let rate_limit_state = RateLimitState::new(api_config.clone());

        Ok(Self {
            state: AppState::new(store),
            api_config,
            auth_state: Some(auth_state),
            rate_limit_state,
        })
    }

    /// Builder whose tenant routes skip authentication.
    #[cfg(any(test, feature = "dev"))]
    fn unauthenticated(store: SharedStore, api_config: ApiConfig) -> Self {
        let rate_limit_state = RateLimitState::new(api_config.clone());
        Self {
            state: AppState::new(store),
            api_config,
            auth_state: None,
            rate_limit_state,
        }
    }

    /// Routes under `/tenants/:tenant_id`.
    fn build_tenant_routes() -> Router<AppState> {
        let project = "/projects/:project_id";
        let graph = "/projects/:project_id/graphs/:graph_id";

        Router::new()
            .nest("/projects", project::create_router())
            .nest(&format!("{project}/agent-graphs"), agent_graph::create_router())
            .nest(&format!("{graph}/agents"), agent::create_router())
            .nest(&format!("{graph}/agents/:agent_id"), agent_component::create_router())
            .nest(&format!("{graph}/agent-relations"), agent_relation::create_router())
            .nest(&format!("{graph}/external-agents"), external_agent::create_router())
            .nest(&format!("{graph}/agent-tool-relations"), agent_tool_relation::create_router())
            .nest(&format!("{project}/tools"), tool::create_router())
            .nest(&format!("{project}/data-components"), data_component::create_router())
            .nest(&format!("{project}/artifact-components"), artifact_component::create_router())
            .nest(&format!("{project}/context-configs"), context_config::create_router())
            .nest(&format!("{project}/credentials"), credential::create_router())
            .nest(&format!("{project}/api-keys"), api_key::create_router())
            .nest(&format!("{project}/conversations"), conversation::create_router())
            .nest(&format!("{project}/graph"), graph_full::create_router())
            .nest("/project-full", project_full::create_router())
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS (outermost) - handles preflight requests
    /// 2. Observability - tracing and metrics
    /// 3. Timeout and body limit
    /// 4. Client rate limiting (tenant routes only) - failed auth, keyed by IP
    /// 5. Auth (tenant routes only) - validates credentials
    /// 6. Rate limiting (tenant routes only) - keyed by the authenticated tenant
    pub fn build(self) -> Router {
        let mut tenant_routes = Self::build_tenant_routes().layer(from_fn_with_state(
            self.rate_limit_state.clone(),
            rate_limit_middleware,
        ));
        tenant_routes = match self.auth_state {
            Some(auth_state) => tenant_routes.layer(from_fn_with_state(auth_state, auth_middleware)),
            None => tenant_routes.layer(from_fn(insert_disabled_auth)),
        };
        tenant_routes = tenant_routes.layer(from_fn_with_state(
            self.rate_limit_state,
            client_rate_limit_middleware,
        ));

        let mut router = Router::new()
            .nest("/tenants/:tenant_id", tenant_routes)
            .nest("/health", health::create_router())
            .route("/metrics", get(metrics_handler));

        #[cfg(feature = "openapi")]
        {
            router = router
                .route("/openapi.json", get(openapi_json))
                .route("/openapi.yaml", get(openapi_yaml));
        }

        let router = router.with_state(self.state);

        #[cfg(feature = "swagger-ui")]
        let router = {
            use utoipa::OpenApi;
            use utoipa_swagger_ui::SwaggerUi;
            router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", crate::openapi::ApiDoc::openapi()))
        };

        let cors = build_cors_layer(&self.api_config);
        let timeout = self.api_config.request_timeout;

        router
            .layer(DefaultBodyLimit::max(self.api_config.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_timeout_error))
                    .timeout(timeout),
            )
            .layer(from_fn(observability_middleware))
            .layer(cors)
    }
}

/// Stand-in for `auth_middleware` on the unauthenticated router.
async fn insert_disabled_auth(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(AuthContext::admin("anonymous", AuthMethod::Disabled));
    next.run(request).await
}

async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::service_unavailable("Request timed out")
    } else {
        ApiError::internal_error(format!("Unhandled middleware error: {}", err))
    }
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("retry-after"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any).expose_headers(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: allowing configured origins");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

/// Create the complete API router.
///
/// - Tenant routes under `/tenants/:tenant_id/*` (authenticated, rate limited)
/// - Health checks at `/health/*`
/// - Metrics at `/metrics`
/// - OpenAPI document at `/openapi.json` and `/openapi.yaml`
/// - Swagger UI at `/swagger-ui` (when the swagger-ui feature is enabled)
pub fn create_api_router(
    store: SharedStore,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    SecureRouterBuilder::new(store, api_config.clone(), auth_config).map(SecureRouterBuilder::build)
}

/// Create an API router without authentication middleware.
///
/// **WARNING**: This should only be used for testing or development.
#[cfg(any(test, feature = "dev"))]
pub fn create_api_router_unauthenticated(store: SharedStore, api_config: &ApiConfig) -> Router {
    SecureRouterBuilder::unauthenticated(store, api_config.clone()).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_cors_origins() {
        let config = ApiConfig::default();
        assert!(validate_api_config_for_production(&config).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://console.example.com".to_string()],
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }

    #[test]
    fn test_deleted_maps_missing_to_not_found() {
        assert_eq!(deleted(true, "Agent", "router").ok(), Some(StatusCode::NO_CONTENT));
        let err = deleted(false, "Agent", "router").expect_err("missing row");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
