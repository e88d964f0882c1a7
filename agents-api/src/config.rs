//! API Configuration Module
//!
//! Configuration for CORS, rate limiting, request timeouts and storage
//! backend selection. Values are loaded from environment variables with
//! defaults suited to local development.

use std::time::Duration;

use agents_core::ConfigError;

// ============================================================================
// STORAGE BACKEND
// ============================================================================

/// Which `Store` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Rows kept in process memory. Lost on restart.
    Memory,
    /// Postgres through a deadpool connection pool.
    #[default]
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "AGENTS_STORAGE".to_string(),
                value: other.to_string(),
                reason: "expected 'memory' or 'postgres'".to_string(),
            }),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, rate limiting, and production hardening.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Rate Limiting Configuration
    // ========================================================================
    pub rate_limit_enabled: bool,

    /// Failed-authentication budget per client IP, per window.
    pub rate_limit_unauthenticated: u32,

    /// Rate limit for authenticated requests (per tenant, per window).
    pub rate_limit_authenticated: u32,

    /// Burst capacity (allow this many requests beyond the limit temporarily).
    pub rate_limit_burst: u32,

    /// Period over which the per-IP and per-tenant limits refill.
    pub rate_limit_window: Duration,

    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`. Only safe
    /// behind a proxy that overwrites those headers.
    pub trust_proxy: bool,

    // ========================================================================
    // Server
    // ========================================================================
    /// Requests running longer than this are aborted with 503.
    pub request_timeout: Duration,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,

    pub storage_backend: StorageBackend,

    /// Deployment environment name (`development`, `production`, ...).
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,

            rate_limit_enabled: true,
            rate_limit_unauthenticated: 100,
            rate_limit_authenticated: 1000,
            rate_limit_burst: 10,
            rate_limit_window: Duration::from_secs(60),
            trust_proxy: false,

            request_timeout: Duration::from_secs(30),
            max_body_bytes: 2 * 1024 * 1024,
            storage_backend: StorageBackend::default(),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AGENTS_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `AGENTS_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `AGENTS_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `AGENTS_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `AGENTS_RATE_LIMIT_UNAUTHENTICATED`: Failed-auth requests per window per IP (default: 100)
    /// - `AGENTS_RATE_LIMIT_AUTHENTICATED`: Requests per window per tenant (default: 1000)
    /// - `AGENTS_RATE_LIMIT_BURST`: Burst capacity (default: 10)
    /// - `AGENTS_RATE_LIMIT_WINDOW_SECS`: Refill window (default: 60)
    /// - `AGENTS_TRUST_PROXY`: Honour forwarding headers (default: false)
    /// - `AGENTS_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `AGENTS_MAX_BODY_BYTES`: Request body limit (default: 2 MiB)
    /// - `AGENTS_STORAGE`: `memory` or `postgres` (default: postgres)
    /// - `AGENTS_ENVIRONMENT`: Deployment environment (default: development)
    ///
    /// An unknown `AGENTS_STORAGE` value is an error rather than a silent
    /// fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_origins = std::env::var("AGENTS_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("AGENTS_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("AGENTS_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let rate_limit_enabled = std::env::var("AGENTS_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let rate_limit_unauthenticated = std::env::var("AGENTS_RATE_LIMIT_UNAUTHENTICATED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_unauthenticated);

        let rate_limit_authenticated = std::env::var("AGENTS_RATE_LIMIT_AUTHENTICATED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_authenticated);

        let rate_limit_burst = std::env::var("AGENTS_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        let rate_limit_window = std::env::var("AGENTS_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);

        let trust_proxy = std::env::var("AGENTS_TRUST_PROXY")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let request_timeout = std::env::var("AGENTS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_body_bytes = std::env::var("AGENTS_MAX_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_body_bytes);

        let storage_backend = match std::env::var("AGENTS_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        let environment = std::env::var("AGENTS_ENVIRONMENT")
            .unwrap_or_else(|_| defaults.environment.clone());

        Ok(Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            rate_limit_enabled,
            rate_limit_unauthenticated,
            rate_limit_authenticated,
            rate_limit_burst,
            rate_limit_window,
            trust_proxy,
            request_timeout,
            max_body_bytes,
            storage_backend,
            environment,
        })
    }

    /// True when `environment` names a production deployment.
    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.example.com
            if let Some(domain) = allowed.strip_prefix("*.") {
                if let Some(host) = origin.strip_prefix("https://") {
                    return host
                        .strip_suffix(domain)
                        .is_some_and(|sub| sub.ends_with('.') && sub.len() > 1);
                }
            }
            false
        })
    }
}
