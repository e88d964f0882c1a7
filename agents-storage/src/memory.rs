//! In-memory store.
//!
//! Rows live in per-table vectors in insertion order, which stands in for
//! `created_at` ordering. Used by tests and by the API server when
//! `AGENTS_STORAGE=memory`.

use ::async_trait::async_trait;
use agents_core::{AgentsResult, StorageError};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::store::Store;
use crate::table::{Filter, Page, Record, Table};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<&'static str, Vec<Record>>>,
}

fn key_filter(table: &Table, record: &Record) -> Filter {
    table.key.iter().fold(Filter::new(), |filter, column| {
        filter.with(*column, record.get(*column).cloned().unwrap_or(JsonValue::Null))
    })
}

/// Keep only known columns so both backends return the same shape.
fn normalize(table: &Table, mut record: Record) -> Record {
    record.retain(|column, _| table.has_column(column));
    for column in table.columns {
        record
            .entry(column.to_string())
            .or_insert(JsonValue::Null);
    }
    record
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table.
    pub async fn row_count(&self, table: &Table) -> usize {
        self.tables
            .read()
            .await
            .get(table.name)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Remove every row from every table.
    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        let record = normalize(table, record);
        let key = key_filter(table, &record);
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.name).or_default();
        if rows.iter().any(|row| key.matches(row)) {
            return Err(StorageError::AlreadyExists {
                entity: table.name,
                id: key.describe(),
            }
            .into());
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn upsert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        let mut record = normalize(table, record);
        let key = key_filter(table, &record);
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.name).or_default();
        match rows.iter_mut().find(|row| key.matches(row)) {
            Some(row) => {
                if let Some(created_at) = row.get("created_at").cloned() {
                    record.insert("created_at".to_string(), created_at);
                }
                *row = record.clone();
            }
            None => rows.push(record.clone()),
        }
        Ok(record)
    }

    async fn replace(&self, table: &'static Table, record: Record) -> AgentsResult<Option<Record>> {
        let record = normalize(table, record);
        let key = key_filter(table, &record);
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table.name) else {
            return Ok(None);
        };
        Ok(rows.iter_mut().find(|row| key.matches(row)).map(|row| {
            *row = record.clone();
            record
        }))
    }

    async fn select(
        &self,
        table: &'static Table,
        filter: &Filter,
        page: Option<Page>,
    ) -> AgentsResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table.name) else {
            return Ok(Vec::new());
        };
        let matching = rows.iter().filter(|row| filter.matches(row)).cloned();
        Ok(match page {
            Some(page) => matching
                .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
                .collect(),
            None => matching.collect(),
        })
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .get(table.name)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn delete(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table.name) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> AgentsResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AGENTS, PROJECTS};
    use serde_json::json;

    fn project(id: &str, name: &str) -> Record {
        let value = json!({
            "tenant_id": "acme",
            "id": id,
            "name": name,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
        });
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let store = InMemoryStore::new();
        store.insert(&PROJECTS, project("support", "Support")).await.unwrap();
        let err = store
            .insert(&PROJECTS, project("support", "Again"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.row_count(&PROJECTS).await, 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let store = InMemoryStore::new();
        store.insert(&PROJECTS, project("support", "Support")).await.unwrap();
        let mut newer = project("support", "Renamed");
        newer.insert("created_at".to_string(), json!("2030-01-01T00:00:00Z"));
        let stored = store.upsert(&PROJECTS, newer).await.unwrap();
        assert_eq!(stored["name"], "Renamed");
        assert_eq!(stored["created_at"], "2025-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_normalize_fills_and_drops_columns() {
        let store = InMemoryStore::new();
        let mut record = project("support", "Support");
        record.insert("bogus".to_string(), json!(1));
        let stored = store.insert(&PROJECTS, record).await.unwrap();
        assert!(stored.get("bogus").is_none());
        assert_eq!(stored["description"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_select_pages_in_insertion_order() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .insert(&PROJECTS, project(&format!("p{i}"), "P"))
                .await
                .unwrap();
        }
        let filter = Filter::new().with("tenant_id", "acme");
        let page = store
            .select(&PROJECTS, &filter, Some(Page { offset: 2, limit: 2 }))
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["p2", "p3"]);
        assert_eq!(store.count(&PROJECTS, &filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_replace_and_delete_missing_rows() {
        let store = InMemoryStore::new();
        assert!(store
            .replace(&PROJECTS, project("ghost", "Ghost"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.delete(&AGENTS, &Filter::new()).await.unwrap(), 0);
    }
}
