//! Error Types for the Agents API
//!
//! This module defines error handling for the API layer, including:
//! - `ErrorCode`, the nine problem categories exposed to clients
//! - `ApiError`, carried through handlers and middleware
//! - `ProblemDetails`, the RFC 7807 body written to the wire
//!
//! Every error leaves the server as `application/problem+json`.

use agents_core::{AgentsError, ConfigError, StorageError, ValidationError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type of every error body.
pub const PROBLEM_JSON: &str = "application/problem+json";

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request, bad path id or failed validation
    BadRequest,

    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Authenticated caller may not touch this tenant or project
    Forbidden,

    /// Requested resource does not exist
    NotFound,

    /// Resource with the same key already exists
    Conflict,

    /// Request is well formed but references resources that do not exist
    UnprocessableEntity,

    /// Request rate limit exceeded
    TooManyRequests,

    /// Unexpected server failure
    InternalServerError,

    /// Storage backend or a dependency is unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "The request is invalid",
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::Conflict => "Resource already exists",
            ErrorCode::UnprocessableEntity => "The request references missing resources",
            ErrorCode::TooManyRequests => "Rate limit exceeded",
            ErrorCode::InternalServerError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }

    /// Wire name, e.g. `not_found`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::UnprocessableEntity => "unprocessable_entity",
            ErrorCode::TooManyRequests => "too_many_requests",
            ErrorCode::InternalServerError => "internal_server_error",
            ErrorCode::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Error returned by handlers and middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable explanation, written to `detail`
    pub message: String,

    /// Individual problems, written to `errors`
    pub errors: Option<Vec<String>>,

    /// Request path the problem occurred on
    pub instance: Option<String>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: None,
            instance: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Attach the individual problems found.
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Attach the request path.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a BadRequest error for an absent field.
    pub fn missing_field(field: &str) -> Self {
        Self::bad_request(format!("Required field '{}' is missing", field))
    }

    /// Create a BadRequest error for a value outside its range.
    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::bad_request(format!("Field '{}' must be between {} and {}", field, min, max))
    }

    /// Create a BadRequest error for a body id that disagrees with the path.
    pub fn id_mismatch(field: &str, path_value: &str, body_value: &str) -> Self {
        Self::bad_request(format!(
            "{} in body ('{}') does not match path ('{}')",
            field, body_value, path_value
        ))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a NotFound error naming the entity and id.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{} '{}' not found", entity_type, id),
        )
    }

    /// Create a generic not found error with custom message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a Conflict error naming the entity and id.
    pub fn entity_already_exists(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!("{} '{}' already exists", entity_type, id),
        )
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnprocessableEntity, message)
    }

    /// Create a TooManyRequests error.
    pub fn too_many_requests(retry_after_secs: Option<u64>) -> Self {
        let message = match retry_after_secs {
            Some(secs) => format!("Rate limit exceeded. Retry after {} seconds", secs),
            None => "Rate limit exceeded".to_string(),
        };
        Self::new(ErrorCode::TooManyRequests, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Build the wire body.
    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.status_code();
        ProblemDetails {
            problem_type: format!("/problems/{}", self.code),
            title: status
                .canonical_reason()
                .unwrap_or_else(|| self.code.default_message())
                .to_string(),
            status: status.as_u16(),
            detail: self.message.clone(),
            code: self.code,
            instance: self.instance.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// PROBLEM DETAILS
// ============================================================================

/// RFC 7807 problem details body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.to_problem())).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Definition { issues } => {
                ApiError::bad_request("Definition is invalid").with_errors(issues)
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => ApiError::entity_not_found(entity, id),
            StorageError::AlreadyExists { entity, id } => {
                ApiError::entity_already_exists(entity, id)
            }
            StorageError::MissingReference { entity, id } => {
                ApiError::unprocessable(format!("Referenced {} '{}' does not exist", entity, id))
            }
            StorageError::Unavailable { reason } => {
                tracing::error!(%reason, "Storage unavailable");
                ApiError::service_unavailable("Storage backend unavailable")
            }
            StorageError::Decode { table, reason } => {
                tracing::error!(table, %reason, "Stored row could not be decoded");
                ApiError::internal_error("Stored data could not be read")
            }
            StorageError::Backend { reason } => {
                // Log the full error, return a generic message
                tracing::error!(%reason, "Storage backend error");
                ApiError::internal_error("Storage operation failed")
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(err.to_string())
    }
}

impl From<AgentsError> for ApiError {
    fn from(err: AgentsError) -> Self {
        match err {
            AgentsError::Storage(e) => e.into(),
            AgentsError::Validation(e) => e.into(),
            AgentsError::Config(e) => e.into(),
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::internal_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                ApiError::service_unavailable("Database connection pool exhausted")
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::internal_error("Failed to acquire database connection"),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
