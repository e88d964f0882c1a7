//! Path extractors for scoped resource ids.
//!
//! Every path parameter is checked against the resource id rule before a
//! handler runs, so handlers receive ready-made scopes.

use agents_core::{
    validate_resource_id, AgentScope, GraphScope, ProjectScope, TenantScope, ValidationError,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;

use crate::error::ApiError;

/// Raw path parameters, validated one by one on access.
struct PathParams {
    params: HashMap<String, String>,
    path: String,
}

impl PathParams {
    async fn extract<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let path = parts.uri.path().to_string();
        let Path(params): Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::bad_request(format!("Invalid path parameters: {}", e)).with_instance(path.clone())
            })?;
        Ok(Self { params, path })
    }

    fn get(&self, name: &str) -> Result<String, ApiError> {
        let value = self.params.get(name).ok_or_else(|| {
            ApiError::internal_error(format!("Route has no '{}' parameter", name))
        })?;
        validate_resource_id(name, value).map_err(|e| self.reject(e))?;
        Ok(value.clone())
    }

    fn reject(&self, err: ValidationError) -> ApiError {
        ApiError::from(err).with_instance(self.path.clone())
    }
}

/// `:tenant_id`
#[derive(Debug, Clone)]
pub struct TenantPath(pub TenantScope);

/// `:tenant_id` and `:project_id`
#[derive(Debug, Clone)]
pub struct ProjectPath(pub ProjectScope);

/// `:tenant_id`, `:project_id` and `:graph_id`
#[derive(Debug, Clone)]
pub struct GraphPath(pub GraphScope);

/// `:tenant_id`, `:project_id`, `:graph_id` and `:agent_id`
#[derive(Debug, Clone)]
pub struct AgentPath(pub AgentScope);

/// The trailing `:id` of an item route.
#[derive(Debug, Clone)]
pub struct PathId(pub String);

/// `:component_id` of an agent's component association.
#[derive(Debug, Clone)]
pub struct ComponentId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        Ok(TenantPath(TenantScope::new(params.get("tenant_id")?)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ProjectPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        Ok(ProjectPath(ProjectScope::new(
            params.get("tenant_id")?,
            params.get("project_id")?,
        )))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for GraphPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        Ok(GraphPath(GraphScope::new(
            params.get("tenant_id")?,
            params.get("project_id")?,
            params.get("graph_id")?,
        )))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AgentPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        let graph = GraphScope::new(
            params.get("tenant_id")?,
            params.get("project_id")?,
            params.get("graph_id")?,
        );
        Ok(AgentPath(graph.agent(params.get("agent_id")?)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PathId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        Ok(PathId(params.get("id")?))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ComponentId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = PathParams::extract(parts, state).await?;
        Ok(ComponentId(params.get("component_id")?))
    }
}
