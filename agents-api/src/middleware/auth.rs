//! Axum Middleware for Authentication and Tenant Scoping
//!
//! This module provides Axum middleware that:
//! - Authenticates requests using API keys, the bypass secret or JWTs
//! - Checks the tenant and project in the request path against the caller
//! - Injects AuthContext into request extensions
//! - Returns 401 for unauthenticated requests
//! - Returns 403 for requests outside the caller's tenant or project

use crate::auth::{authenticate, ensure_project_access, ensure_tenant_access, AuthConfig, AuthContext};
use crate::error::ApiError;
use agents_storage::SharedStore;
use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,

    /// Store the `api_keys` table is read from.
    pub store: SharedStore,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: AuthConfig, store: SharedStore) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
            store,
        }
    }
}

impl std::fmt::Debug for AuthMiddlewareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddlewareState")
            .field("auth_config", &self.auth_config)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

// ============================================================================
// PATH SCOPE
// ============================================================================

/// Tenant and project named by a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathScope {
    pub tenant_id: Option<String>,
    pub project_id: Option<String>,
}

/// Read the tenant and project out of `/tenants/:tenant_id/projects/:project_id/...`
/// or `/tenants/:tenant_id/project-full/:project_id`.
pub fn path_scope(path: &str) -> PathScope {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["tenants", tenant, rest @ ..] => PathScope {
            tenant_id: Some((*tenant).to_string()),
            project_id: match rest {
                ["projects" | "project-full", project, ..] => Some((*project).to_string()),
                _ => None,
            },
        },
        _ => PathScope::default(),
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware for authentication and authorization.
///
/// 1. Reads `X-API-Key` and `Authorization` headers
/// 2. Authenticates through [`authenticate`]
/// 3. Rejects callers bound to another tenant or project with 403
/// 4. Injects the [`AuthContext`] into request extensions
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_context = authenticate(
        &state.auth_config,
        state.store.as_ref(),
        api_key_header,
        auth_header,
    )
    .await
    .map_err(|e| e.with_instance(path.clone()))?;

    let scope = path_scope(&path);
    let access = match (&scope.tenant_id, &scope.project_id) {
        (Some(tenant), Some(project)) => ensure_project_access(&auth_context, tenant, project),
        (Some(tenant), None) => ensure_tenant_access(&auth_context, tenant),
        _ => Ok(()),
    };
    if let Err(e) = access {
        tracing::warn!(
            user_id = %auth_context.user_id,
            path = %path,
            "Request outside the caller's scope"
        );
        return Err(e.with_instance(path));
    }

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for the authentication context.
///
/// `auth_middleware` must run on the route. Without it the extractor fails
/// with 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                )
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, test_clocks, JwtSecret};
    use agents_core::GraphScope;
    use agents_storage::access::api_keys::create_api_key;
    use agents_storage::InMemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use secrecy::SecretString;
    use tower::ServiceExt;

    const BYPASS: &str = "bypass-secret-for-middleware-tests";

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("middleware_test_secret".to_string())
                .expect("test secret should be valid"),
            bypass_secret: Some(SecretString::new(BYPASS.to_string().into())),
            clock: Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        }
    }

    fn test_app(store: SharedStore) -> Router {
        let state = AuthMiddlewareState::new(test_auth_config(), store);
        Router::new()
            .route(
                "/tenants/:tenant_id/projects/:project_id/ping",
                get(|AuthExtractor(auth): AuthExtractor| async move { auth.user_id }),
            )
            .route("/tenants/:tenant_id/projects", get(|| async { "projects" }))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    fn get_with(path: &str, header: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).expect("request should build")
    }

    #[test]
    fn test_path_scope() {
        assert_eq!(
            path_scope("/tenants/acme/projects/support/graphs/triage"),
            PathScope {
                tenant_id: Some("acme".to_string()),
                project_id: Some("support".to_string()),
            }
        );
        assert_eq!(
            path_scope("/tenants/acme/project-full/support"),
            PathScope {
                tenant_id: Some("acme".to_string()),
                project_id: Some("support".to_string()),
            }
        );
        assert_eq!(
            path_scope("/tenants/acme/projects"),
            PathScope {
                tenant_id: Some("acme".to_string()),
                project_id: None,
            }
        );
        assert_eq!(path_scope("/health/live"), PathScope::default());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_unauthorized() {
        let app = test_app(Arc::new(InMemoryStore::new()));
        let response = app
            .oneshot(get_with("/tenants/acme/projects", None))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bypass_secret_reaches_any_tenant() {
        let app = test_app(Arc::new(InMemoryStore::new()));
        let response = app
            .oneshot(get_with(
                "/tenants/anyone/projects/anything/ping",
                Some(("authorization", format!("Bearer {BYPASS}"))),
            ))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_jwt_for_other_tenant_is_forbidden() {
        let config = test_auth_config();
        let token = generate_jwt_token(&config, "user-1".to_string(), Some("acme".to_string()), vec![])
            .expect("token should sign");
        let app = test_app(Arc::new(InMemoryStore::new()));

        let own = app
            .clone()
            .oneshot(get_with(
                "/tenants/acme/projects",
                Some(("authorization", format!("Bearer {token}"))),
            ))
            .await
            .expect("request should complete");
        assert_eq!(own.status(), StatusCode::OK);

        let other = app
            .oneshot(get_with(
                "/tenants/globex/projects",
                Some(("authorization", format!("Bearer {token}"))),
            ))
            .await
            .expect("request should complete");
        assert_eq!(other.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_api_key_is_bound_to_its_project() {
        let store = Arc::new(InMemoryStore::new());
        let created = create_api_key(store.as_ref(), &GraphScope::new("acme", "support", "triage"), None, None)
            .await
            .expect("key should be created");
        let app = test_app(store);

        let own = app
            .clone()
            .oneshot(get_with(
                "/tenants/acme/projects/support/ping",
                Some(("x-api-key", created.key.clone())),
            ))
            .await
            .expect("request should complete");
        assert_eq!(own.status(), StatusCode::OK);

        let other = app
            .oneshot(get_with(
                "/tenants/acme/projects/billing/ping",
                Some(("x-api-key", created.key)),
            ))
            .await
            .expect("request should complete");
        assert_eq!(other.status(), StatusCode::FORBIDDEN);
    }
}
