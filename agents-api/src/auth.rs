//! Authentication Module
//!
//! Three ways to authenticate a request:
//! 1. API key (`X-API-Key: sk_<public_id>.<secret>` or `Authorization: Bearer sk_...`),
//!    resolved against the `api_keys` table and scoped to one project
//! 2. Bypass secret (`Authorization: Bearer <AGENTS_BYPASS_SECRET>`), admin
//!    access to every tenant
//! 3. JWT (`Authorization: Bearer <token>`), scoped by its `tenant_id` claim
//!
//! The resulting [`AuthContext`] is checked against the tenant and project in
//! the request path by [`ensure_tenant_access`] and [`ensure_project_access`].

use crate::error::{ApiError, ApiResult};
use agents_core::{AgentsError, ConfigError};
use agents_storage::{
    access::api_keys::{update_api_key_last_used, validate_and_get_api_key},
    hash_api_key,
    keys::API_KEY_PREFIX,
    verify_api_key, Store,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Time checks are done here rather than inside `jsonwebtoken` so tests can
/// pin the current time.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// JWT secret that never shows up in logs or debug output.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> Result<Self, AgentsError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            }
            .into());
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value for signing and verification only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// Tolerated clock drift when checking `exp`, in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Shared secret granting admin access to every tenant.
    pub bypass_secret: Option<SecretString>,

    /// Skip authentication entirely. Refused in production.
    pub auth_disabled: bool,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field(
                "bypass_secret",
                &self.bypass_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_disabled", &self.auth_disabled)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: build_jwt_secret(INSECURE_DEFAULT_SECRET.to_string()),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            bypass_secret: None,
            auth_disabled: false,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `AGENTS_JWT_SECRET`: JWT signing secret
    /// - `AGENTS_JWT_EXPIRATION_SECS`: JWT token expiration (default: 3600)
    /// - `AGENTS_JWT_CLOCK_SKEW_SECS`: JWT clock skew tolerance (default: 60)
    /// - `AGENTS_BYPASS_SECRET`: admin bearer secret (unset disables it)
    /// - `AGENTS_AUTH_DISABLED`: "true" to skip authentication (default: false)
    pub fn from_env() -> Self {
        let secret_str = std::env::var("AGENTS_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("AGENTS_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            jwt_clock_skew_secs: std::env::var("AGENTS_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            bypass_secret: std::env::var("AGENTS_BYPASS_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| SecretString::new(s.into())),
            auth_disabled: std::env::var("AGENTS_AUTH_DISABLED")
                .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
                .unwrap_or(false),
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure settings when running in production.
    ///
    /// Outside production the same findings are logged as warnings.
    pub fn validate_for_production(&self, is_production: bool) -> ApiResult<()> {
        if self.auth_disabled {
            if is_production {
                return Err(ApiError::internal_error(
                    "Cannot start server in production with AGENTS_AUTH_DISABLED=true",
                ));
            }
            tracing::warn!("Authentication is disabled. Every request is treated as admin.");
        }

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::internal_error(
                    "Cannot start server in production with insecure JWT secret. \
                     Set AGENTS_JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set AGENTS_JWT_SECRET \
                 to a random value of at least 32 characters before deploying."
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::internal_error(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                length = self.jwt_secret.len(),
                "JWT secret is shorter than 32 characters"
            );
        }

        if let Some(bypass) = &self.bypass_secret {
            if is_production && bypass.expose_secret().len() < 32 {
                return Err(ApiError::internal_error(
                    "AGENTS_BYPASS_SECRET must be at least 32 characters in production",
                ));
            }
        }

        Ok(())
    }

    fn is_bypass_secret(&self, token: &str) -> bool {
        self.bypass_secret
            .as_ref()
            .is_some_and(|secret| verify_api_key(token, &hash_api_key(secret.expose_secret())))
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Tenant the user may access. Absent means no tenant access.
    pub tenant_id: Option<String>,

    /// Restricts the token to one project of the tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Create new claims for a user using a clock.
    pub fn new(
        user_id: String,
        tenant_id: Option<String>,
        expiration_secs: i64,
        clock: &dyn JwtClock,
    ) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: user_id,
            iat: now,
            exp: now + expiration_secs,
            tenant_id,
            project_id: None,
            roles: Vec::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authentication method used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Jwt,
    Bypass,
    /// Authentication is switched off by configuration.
    Disabled,
}

/// Authentication context extracted from request.
///
/// Injected into request extensions after successful authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// User ID (JWT `sub`, or `api_key:<public id>`)
    pub user_id: String,

    /// Tenant the caller is bound to. `None` grants every tenant.
    pub tenant_id: Option<String>,

    /// Project the caller is bound to, if any.
    pub project_id: Option<String>,

    /// Graph an API key was issued for.
    pub graph_id: Option<String>,

    pub roles: Vec<String>,

    pub auth_method: AuthMethod,
}

impl AuthContext {
    /// Context with access to every tenant.
    pub fn admin(user_id: impl Into<String>, auth_method: AuthMethod) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: None,
            project_id: None,
            graph_id: None,
            roles: vec!["admin".to_string()],
            auth_method,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

// ============================================================================
// AUTHENTICATION FUNCTIONS
// ============================================================================

/// Validate JWT claim times using our own clock logic.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if exp < now - leeway_secs {
        return Err(ApiError::unauthorized("Token has expired"));
    }
    Ok(())
}

/// Validate a JWT token and extract claims.
///
/// `jsonwebtoken` checks the signature only. Expiry is checked against the
/// configured clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::unauthorized("Token signature is invalid")
            }
            _ => ApiError::unauthorized("Token is invalid"),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Generate a JWT token for a user.
pub fn generate_jwt_token(
    config: &AuthConfig,
    user_id: String,
    tenant_id: Option<String>,
    roles: Vec<String>,
) -> ApiResult<String> {
    let claims = Claims::new(user_id, tenant_id, config.jwt_expiration_secs, &*config.clock)
        .with_roles(roles);
    encode_claims(config, &claims)
}

/// Sign prepared claims.
pub fn encode_claims(config: &AuthConfig, claims: &Claims) -> ApiResult<String> {
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Authenticate a request using a JWT.
pub fn authenticate_jwt(config: &AuthConfig, token: &str) -> ApiResult<AuthContext> {
    let claims = validate_jwt_token(config, token)?;

    let tenant_id = claims
        .tenant_id
        .filter(|tenant| !tenant.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Token carries no tenant_id claim"))?;

    Ok(AuthContext {
        user_id: claims.sub,
        tenant_id: Some(tenant_id),
        project_id: claims.project_id,
        graph_id: None,
        roles: claims.roles,
        auth_method: AuthMethod::Jwt,
    })
}

/// Authenticate a request using a stored API key.
///
/// A successful lookup stamps the key's `last_used_at`. Failing to stamp is
/// logged and does not reject the request.
pub async fn authenticate_api_key(store: &dyn Store, presented: &str) -> ApiResult<AuthContext> {
    let api_key = validate_and_get_api_key(store, presented)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid API key"))?;

    if let Err(e) = update_api_key_last_used(store, &api_key).await {
        tracing::warn!(api_key_id = %api_key.id, error = %e, "Failed to record API key use");
    }

    Ok(AuthContext {
        user_id: format!("api_key:{}", api_key.public_id),
        tenant_id: Some(api_key.tenant_id),
        project_id: Some(api_key.project_id),
        graph_id: Some(api_key.graph_id),
        roles: vec!["api_user".to_string()],
        auth_method: AuthMethod::ApiKey,
    })
}

/// Authenticate a request from its `X-API-Key` and `Authorization` headers.
pub async fn authenticate(
    config: &AuthConfig,
    store: &dyn Store,
    api_key_header: Option<&str>,
    auth_header: Option<&str>,
) -> ApiResult<AuthContext> {
    if config.auth_disabled {
        return Ok(AuthContext::admin("anonymous", AuthMethod::Disabled));
    }

    if let Some(api_key) = api_key_header {
        return authenticate_api_key(store, api_key.trim()).await;
    }

    let Some(auth_value) = auth_header else {
        return Err(ApiError::unauthorized(
            "Authentication required: provide X-API-Key or Authorization header",
        ));
    };

    let token = auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer scheme"))?;

    if config.is_bypass_secret(token) {
        return Ok(AuthContext::admin("bypass", AuthMethod::Bypass));
    }

    if token.starts_with(API_KEY_PREFIX) {
        return authenticate_api_key(store, token).await;
    }

    authenticate_jwt(config, token)
}

/// Check the caller may act on `tenant_id`.
pub fn ensure_tenant_access(auth: &AuthContext, tenant_id: &str) -> ApiResult<()> {
    match auth.tenant_id.as_deref() {
        None => Ok(()),
        Some(allowed) if allowed == tenant_id => Ok(()),
        Some(_) => Err(ApiError::forbidden(format!(
            "Access denied to tenant {}",
            tenant_id
        ))),
    }
}

/// Check the caller may act on `project_id` of `tenant_id`.
pub fn ensure_project_access(auth: &AuthContext, tenant_id: &str, project_id: &str) -> ApiResult<()> {
    ensure_tenant_access(auth, tenant_id)?;
    match auth.project_id.as_deref() {
        None => Ok(()),
        Some(allowed) if allowed == project_id => Ok(()),
        Some(_) => Err(ApiError::forbidden(format!(
            "Access denied to project {}",
            project_id
        ))),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use agents_core::GraphScope;
    use agents_storage::access::api_keys::create_api_key;
    use agents_storage::InMemoryStore;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test_secret".to_string())
                .expect("Test secret should be valid"),
            bypass_secret: Some(SecretString::new("bypass-secret-for-tests".to_string().into())),
            clock: Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() -> ApiResult<()> {
        let config = test_config();
        let roles = vec!["admin".to_string()];

        let token = generate_jwt_token(&config, "user123".to_string(), Some("acme".to_string()), roles.clone())?;
        let claims = validate_jwt_token(&config, &token)?;

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.tenant_id.as_deref(), Some("acme"));
        assert_eq!(claims.roles, roles);
        assert!(!claims.is_expired(&test_clocks::valid()));
        Ok(())
    }

    #[test]
    fn test_expired_token() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = -1;
        let token = generate_jwt_token(&config, "user123".to_string(), Some("acme".to_string()), vec![])?;

        config.clock = Arc::new(test_clocks::future());
        let err = validate_jwt_token(&config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(err.message.contains("expired"));
        Ok(())
    }

    #[test]
    fn test_clock_skew_tolerated() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = 0;
        let token = generate_jwt_token(&config, "user123".to_string(), Some("acme".to_string()), vec![])?;

        config.clock = Arc::new(FixedClock(test_clocks::valid().0 + 30));
        assert!(validate_jwt_token(&config, &token).is_ok());
        Ok(())
    }

    #[test]
    fn test_wrong_signature_rejected() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, "user123".to_string(), Some("acme".to_string()), vec![])?;

        let mut other = test_config();
        other.jwt_secret = JwtSecret::new("another_secret".to_string()).expect("valid secret");
        let err = validate_jwt_token(&other, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        Ok(())
    }

    #[test]
    fn test_jwt_without_tenant_rejected() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, "user123".to_string(), None, vec![])?;
        assert!(authenticate_jwt(&config, &token).is_err());
        Ok(())
    }

    #[test]
    fn test_jwt_project_claim_carried() -> ApiResult<()> {
        let config = test_config();
        let claims = Claims::new("user123".to_string(), Some("acme".to_string()), 3600, &test_clocks::valid())
            .with_project("support");
        let token = encode_claims(&config, &claims)?;
        let auth = authenticate_jwt(&config, &token)?;
        assert_eq!(auth.project_id.as_deref(), Some("support"));
        assert_eq!(auth.auth_method, AuthMethod::Jwt);
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_bypass_secret() -> ApiResult<()> {
        let config = test_config();
        let store = InMemoryStore::new();
        let auth = authenticate(&config, &store, None, Some("Bearer bypass-secret-for-tests")).await?;
        assert!(auth.is_admin());
        assert_eq!(auth.auth_method, AuthMethod::Bypass);
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_requires_credentials() {
        let config = test_config();
        let store = InMemoryStore::new();
        let err = authenticate(&config, &store, None, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = authenticate(&config, &store, None, Some("Basic abc")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_authenticate_disabled() -> ApiResult<()> {
        let config = AuthConfig {
            auth_disabled: true,
            ..test_config()
        };
        let store = InMemoryStore::new();
        let auth = authenticate(&config, &store, None, None).await?;
        assert_eq!(auth.auth_method, AuthMethod::Disabled);
        assert!(auth.is_admin());
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_stored_api_key() -> ApiResult<()> {
        let config = test_config();
        let store = InMemoryStore::new();
        let scope = GraphScope::new("acme", "support", "triage");
        let created = create_api_key(&store, &scope, Some("ci".to_string()), None).await?;

        let auth = authenticate(&config, &store, Some(&created.key), None).await?;
        assert_eq!(auth.tenant_id.as_deref(), Some("acme"));
        assert_eq!(auth.project_id.as_deref(), Some("support"));
        assert_eq!(auth.graph_id.as_deref(), Some("triage"));
        assert_eq!(auth.auth_method, AuthMethod::ApiKey);

        let bearer = format!("Bearer {}", created.key);
        let auth = authenticate(&config, &store, None, Some(&bearer)).await?;
        assert_eq!(auth.auth_method, AuthMethod::ApiKey);

        let tampered = format!("{}x", created.key);
        assert!(authenticate(&config, &store, Some(&tampered), None).await.is_err());
        Ok(())
    }

    #[test]
    fn test_tenant_and_project_access() {
        let scoped = AuthContext {
            user_id: "api_key:abc".to_string(),
            tenant_id: Some("acme".to_string()),
            project_id: Some("support".to_string()),
            graph_id: None,
            roles: vec![],
            auth_method: AuthMethod::ApiKey,
        };
        assert!(ensure_tenant_access(&scoped, "acme").is_ok());
        assert_eq!(
            ensure_tenant_access(&scoped, "globex").unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert!(ensure_project_access(&scoped, "acme", "support").is_ok());
        assert_eq!(
            ensure_project_access(&scoped, "acme", "billing").unwrap_err().code,
            ErrorCode::Forbidden
        );

        let admin = AuthContext::admin("bypass", AuthMethod::Bypass);
        assert!(ensure_project_access(&admin, "globex", "anything").is_ok());
    }

    #[test]
    fn test_production_validation() {
        let config = AuthConfig::default();
        assert!(config.validate_for_production(false).is_ok());
        assert!(config.validate_for_production(true).is_err());

        let config = AuthConfig {
            jwt_secret: JwtSecret::new("x".repeat(48)).expect("valid secret"),
            ..AuthConfig::default()
        };
        assert!(config.validate_for_production(true).is_ok());

        let config = AuthConfig {
            jwt_secret: JwtSecret::new("x".repeat(48)).expect("valid secret"),
            auth_disabled: true,
            ..AuthConfig::default()
        };
        assert!(config.validate_for_production(true).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test_secret"));
        assert!(!debug.contains("bypass-secret-for-tests"));
    }
}
