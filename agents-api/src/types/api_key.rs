//! API Key Request and Response Types
//!
//! The stored hash never leaves the server. The plaintext key is returned
//! once, in the create response.

use agents_core::{ApiKey, Timestamp};
use serde::{Deserialize, Serialize};

use super::paginated_query;

/// API key as listed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiKeyResponse {
    pub id: String,
    pub tenant_id: String,
    pub project_id: String,
    pub graph_id: String,
    pub public_id: String,
    /// `sk_<public_id>`, enough to recognise a key.
    pub key_prefix: String,
    pub name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_used_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub expires_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            tenant_id: key.tenant_id,
            project_id: key.project_id,
            graph_id: key.graph_id,
            public_id: key.public_id,
            key_prefix: key.key_prefix,
            name: key.name,
            last_used_at: key.last_used_at,
            expires_at: key.expires_at,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateApiKeyRequest {
    /// Graph the key grants access to.
    pub graph_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateApiKeyResponse {
    pub api_key: ApiKeyResponse,
    /// Full key, only returned once
    pub key: String,
}

paginated_query! {
    ApiKeyQuery { graph_id: String }
}
