//! Credential references.

use agents_core::{
    AgentsResult, CredentialReference, CredentialReferenceUpdate, ExternalAgent, Paginated,
    Pagination, ProjectScope, Tool,
};

use crate::component::Component;
use crate::repository;
use crate::store::Store;
use crate::table::Filter;

fn key(scope: &ProjectScope, credential_id: &str) -> Filter {
    Filter::project(scope).with("id", credential_id)
}

pub async fn get_credential_reference(
    store: &dyn Store,
    scope: &ProjectScope,
    credential_id: &str,
) -> AgentsResult<Option<CredentialReference>> {
    repository::get(store, &key(scope, credential_id)).await
}

pub async fn list_credential_references(
    store: &dyn Store,
    scope: &ProjectScope,
) -> AgentsResult<Vec<CredentialReference>> {
    repository::list(store, &Filter::project(scope)).await
}

pub async fn list_credential_references_paginated(
    store: &dyn Store,
    scope: &ProjectScope,
    pagination: Pagination,
) -> AgentsResult<Paginated<CredentialReference>> {
    repository::list_paginated(store, &Filter::project(scope), pagination).await
}

pub async fn create_credential_reference(
    store: &dyn Store,
    credential: CredentialReference,
) -> AgentsResult<CredentialReference> {
    repository::create(store, credential).await
}

pub async fn upsert_credential_reference(
    store: &dyn Store,
    credential: CredentialReference,
) -> AgentsResult<CredentialReference> {
    repository::upsert(store, credential).await
}

pub async fn update_credential_reference(
    store: &dyn Store,
    scope: &ProjectScope,
    credential_id: &str,
    update: CredentialReferenceUpdate,
) -> AgentsResult<CredentialReference> {
    repository::update(
        store,
        &key(scope, credential_id),
        |credential: &mut CredentialReference| update.apply(credential),
    )
    .await
}

/// Delete a credential reference and detach it from tools and external
/// agents that used it.
pub async fn delete_credential_reference(
    store: &dyn Store,
    scope: &ProjectScope,
    credential_id: &str,
) -> AgentsResult<bool> {
    let users = Filter::project(scope).with("credential_reference_id", credential_id);

    let tools: Vec<Tool> = repository::list(store, &users).await?;
    for tool in tools {
        repository::update(store, &tool.key_filter(), |t: &mut Tool| {
            t.credential_reference_id = None
        })
        .await?;
    }
    let external: Vec<ExternalAgent> = repository::list(store, &users).await?;
    for agent in external {
        repository::update(store, &agent.key_filter(), |a: &mut ExternalAgent| {
            a.credential_reference_id = None
        })
        .await?;
    }

    Ok(repository::delete::<CredentialReference>(store, &key(scope, credential_id)).await? > 0)
}
