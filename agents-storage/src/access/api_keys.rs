//! API keys.
//!
//! Keys are scoped to a graph. Lookup by public id is global so a presented
//! key can be resolved before the caller's tenant is known.

use agents_core::{
    generate_id, AgentsResult, ApiKey, ApiKeyUpdate, GraphScope, Paginated, Pagination,
    ProjectScope, Timestamp,
};
use chrono::Utc;
use tracing::debug;

use crate::keys::{self, GeneratedApiKey};
use crate::repository;
use crate::store::Store;
use crate::table::Filter;

fn key(scope: &ProjectScope, api_key_id: &str) -> Filter {
    Filter::project(scope).with("id", api_key_id)
}

/// A stored key together with the plaintext key, which is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedApiKey {
    pub api_key: ApiKey,
    pub key: String,
}

pub async fn create_api_key(
    store: &dyn Store,
    scope: &GraphScope,
    name: Option<String>,
    expires_at: Option<Timestamp>,
) -> AgentsResult<CreatedApiKey> {
    let GeneratedApiKey {
        key,
        public_id,
        key_hash,
        key_prefix,
    } = keys::generate_api_key();
    let now = Utc::now();
    let api_key = repository::create(
        store,
        ApiKey {
            tenant_id: scope.tenant_id.clone(),
            project_id: scope.project_id.clone(),
            graph_id: scope.graph_id.clone(),
            id: generate_id(),
            public_id,
            key_hash,
            key_prefix,
            name,
            last_used_at: None,
            expires_at,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;
    Ok(CreatedApiKey { api_key, key })
}

pub async fn get_api_key(
    store: &dyn Store,
    scope: &ProjectScope,
    api_key_id: &str,
) -> AgentsResult<Option<ApiKey>> {
    repository::get(store, &key(scope, api_key_id)).await
}

pub async fn get_api_key_by_public_id(
    store: &dyn Store,
    public_id: &str,
) -> AgentsResult<Option<ApiKey>> {
    repository::get(store, &Filter::new().with("public_id", public_id)).await
}

/// Resolve a presented key. Returns `None` for malformed, unknown,
/// mismatched or expired keys.
pub async fn validate_and_get_api_key(store: &dyn Store, presented: &str) -> AgentsResult<Option<ApiKey>> {
    let Some((public_id, _)) = keys::parse_api_key(presented) else {
        return Ok(None);
    };
    let Some(api_key) = get_api_key_by_public_id(store, public_id).await? else {
        debug!(public_id, "Unknown API key");
        return Ok(None);
    };
    if !keys::verify_api_key(presented, &api_key.key_hash) {
        debug!(public_id, "API key hash mismatch");
        return Ok(None);
    }
    if api_key.is_expired(Utc::now()) {
        debug!(public_id, "API key expired");
        return Ok(None);
    }
    Ok(Some(api_key))
}

pub async fn update_api_key_last_used(store: &dyn Store, api_key: &ApiKey) -> AgentsResult<ApiKey> {
    let now = Utc::now();
    repository::update(
        store,
        &Filter::project(&ProjectScope::new(
            api_key.tenant_id.clone(),
            api_key.project_id.clone(),
        ))
        .with("id", api_key.id.as_str()),
        move |stored: &mut ApiKey| stored.last_used_at = Some(now),
    )
    .await
}

/// Keys of a project, optionally only those of one graph.
pub async fn list_api_keys(
    store: &dyn Store,
    scope: &ProjectScope,
    graph_id: Option<&str>,
) -> AgentsResult<Vec<ApiKey>> {
    let mut filter = Filter::project(scope);
    if let Some(graph_id) = graph_id {
        filter = filter.with("graph_id", graph_id);
    }
    repository::list(store, &filter).await
}

pub async fn list_api_keys_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
    graph_id: Option<&str>,
) -> AgentsResult<Paginated<ApiKey>> {
    let mut filter = Filter::project(scope);
    if let Some(graph_id) = graph_id {
        filter = filter.with("graph_id", graph_id);
    }
    repository::list_paginated(store, &filter, pagination).await
}

pub async fn update_api_key(
    store: &dyn Store,
    scope: &ProjectScope,
    api_key_id: &str,
    update: ApiKeyUpdate,
) -> AgentsResult<ApiKey> {
    repository::update(store, &key(scope, api_key_id), |api_key: &mut ApiKey| {
        update.apply(api_key)
    })
    .await
}

pub async fn delete_api_key(
    store: &dyn Store,
    scope: &ProjectScope,
    api_key_id: &str,
) -> AgentsResult<bool> {
    Ok(repository::delete::<ApiKey>(store, &key(scope, api_key_id)).await? > 0)
}
