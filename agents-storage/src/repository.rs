//! Generic CRUD over any [`Component`].
//!
//! The per-entity access modules are thin wrappers around these functions
//! that build the right scope filter.

use agents_core::{AgentsError, AgentsResult, Paginated, Pagination, StorageError};
use chrono::Utc;

use crate::component::Component;
use crate::store::Store;
use crate::table::{Filter, Page};

/// Fetch the single row matching `filter`.
pub async fn get<C: Component>(store: &dyn Store, filter: &Filter) -> AgentsResult<Option<C>> {
    let rows = store
        .select(C::table(), filter, Some(Page { offset: 0, limit: 1 }))
        .await?;
    rows.into_iter().next().map(C::from_record).transpose()
}

/// Every row matching `filter`, oldest first.
pub async fn list<C: Component>(store: &dyn Store, filter: &Filter) -> AgentsResult<Vec<C>> {
    store
        .select(C::table(), filter, None)
        .await?
        .into_iter()
        .map(C::from_record)
        .collect()
}

/// One page of rows matching `filter` plus the total count.
pub async fn list_paginated<C: Component>(
    store: &dyn Store,
    filter: &Filter,
    pagination: Pagination,
) -> AgentsResult<Paginated<C>> {
    let total = store.count(C::table(), filter).await?;
    let rows = store
        .select(C::table(), filter, Some(pagination.into()))
        .await?
        .into_iter()
        .map(C::from_record)
        .collect::<AgentsResult<Vec<C>>>()?;
    Ok(Paginated::new(rows, pagination, total))
}

pub async fn count<C: Component>(store: &dyn Store, filter: &Filter) -> AgentsResult<u64> {
    store.count(C::table(), filter).await
}

/// Insert a new row stamped with the current time.
pub async fn create<C: Component>(store: &dyn Store, mut entity: C) -> AgentsResult<C> {
    let now = Utc::now();
    entity.stamp(now, now);
    let stored = store.insert(C::table(), entity.to_record()?).await?;
    C::from_record(stored)
}

/// Insert or replace a row. An existing row keeps its `created_at`.
pub async fn upsert<C: Component>(store: &dyn Store, mut entity: C) -> AgentsResult<C> {
    let now = Utc::now();
    let created_at = get::<C>(store, &entity.key_filter())
        .await?
        .map(|existing| existing.created_at())
        .unwrap_or(now);
    entity.stamp(created_at, now);
    let stored = store.upsert(C::table(), entity.to_record()?).await?;
    C::from_record(stored)
}

/// Read-modify-write of the row matching `filter`.
///
/// Fails with `NotFound` when there is no such row.
pub async fn update<C, F>(store: &dyn Store, filter: &Filter, apply: F) -> AgentsResult<C>
where
    C: Component,
    F: FnOnce(&mut C) + Send,
{
    let mut entity = get::<C>(store, filter)
        .await?
        .ok_or_else(|| AgentsError::not_found(C::ENTITY_NAME, filter.describe()))?;
    apply(&mut entity);
    entity.stamp(entity.created_at(), Utc::now());
    let stored = store
        .replace(C::table(), entity.to_record()?)
        .await?
        .ok_or_else(|| {
            AgentsError::from(StorageError::NotFound {
                entity: C::ENTITY_NAME,
                id: filter.describe(),
            })
        })?;
    C::from_record(stored)
}

/// Delete every row matching `filter`.
pub async fn delete<C: Component>(store: &dyn Store, filter: &Filter) -> AgentsResult<u64> {
    store.delete(C::table(), filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use agents_core::{Project, TenantScope};

    fn project(id: &str) -> Project {
        let now = Utc::now();
        Project {
            tenant_id: "acme".to_string(),
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            models: None,
            stop_when: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let filter = project("ghost").key_filter();
        let err = update::<Project, _>(&store, &filter, |p| p.name = "x".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_only() {
        let store = InMemoryStore::new();
        let created = create(&store, project("support")).await.unwrap();
        let updated = update::<Project, _>(&store, &created.key_filter(), |p| {
            p.description = Some("Tier one".to_string())
        })
        .await
        .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.description.as_deref(), Some("Tier one"));
    }

    #[tokio::test]
    async fn test_list_paginated_reports_totals() {
        let store = InMemoryStore::new();
        for i in 0..12 {
            create(&store, project(&format!("p{i:02}"))).await.unwrap();
        }
        let filter = Filter::tenant(&TenantScope::new("acme"));
        let page = list_paginated::<Project>(&store, &filter, Pagination::new(Some(2), Some(5)).unwrap())
            .await
            .unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].id, "p05");
        assert_eq!(page.pagination.total, 12);
        assert_eq!(page.pagination.pages, 3);
    }
}
