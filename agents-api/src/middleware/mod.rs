//! Middleware modules for the Agents API
//!
//! - `auth`: authentication and tenant/project scoping
//! - `rate_limit`: per-tenant and per-IP rate limiting
//!
//! # Middleware Order
//!
//! The per-IP limiter wraps authentication so failed attempts are counted
//! before credentials are checked. The per-tenant limiter runs after
//! authentication so requests are keyed by tenant:
//!
//! ```ignore
//! tenant_routes
//!     // Innermost
//!     .layer(middleware::from_fn_with_state(rate_limit_state.clone(), rate_limit_middleware))
//!     .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
//!     // Outermost
//!     .layer(middleware::from_fn_with_state(rate_limit_state, client_rate_limit_middleware))
//! ```

mod auth;
mod rate_limit;

pub use auth::{
    auth_middleware, path_scope, AuthExtractor, AuthMiddlewareState, PathScope,
};
pub use rate_limit::{
    client_rate_limit_middleware, rate_limit_middleware, RateLimitError, RateLimitKey,
    RateLimitState,
};
