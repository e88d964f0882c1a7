//! Storage instrumentation.

use agents_core::AgentsResult;
use agents_storage::{Filter, Page, Record, SharedStore, Store, Table};
use async_trait::async_trait;
use std::time::Instant;

use super::metrics::with_metrics;

/// `Store` wrapper that records a metric sample per call.
#[derive(Clone)]
pub struct InstrumentedStore {
    inner: SharedStore,
}

impl InstrumentedStore {
    pub fn new(inner: SharedStore) -> Self {
        Self { inner }
    }
}

fn observe<T>(operation: &str, table: &Table, started: Instant, result: &AgentsResult<T>) {
    let elapsed = started.elapsed().as_secs_f64();
    with_metrics(|metrics| {
        metrics.record_storage_operation(operation, table.name, result.is_ok(), elapsed)
    });
    if let Err(err) = result {
        tracing::debug!(operation, table = table.name, error = %err, "Storage operation failed");
    }
}

#[async_trait]
impl Store for InstrumentedStore {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn insert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        let started = Instant::now();
        let result = self.inner.insert(table, record).await;
        observe("insert", table, started, &result);
        result
    }

    async fn upsert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        let started = Instant::now();
        let result = self.inner.upsert(table, record).await;
        observe("upsert", table, started, &result);
        result
    }

    async fn replace(&self, table: &'static Table, record: Record) -> AgentsResult<Option<Record>> {
        let started = Instant::now();
        let result = self.inner.replace(table, record).await;
        observe("replace", table, started, &result);
        result
    }

    async fn select(
        &self,
        table: &'static Table,
        filter: &Filter,
        page: Option<Page>,
    ) -> AgentsResult<Vec<Record>> {
        let started = Instant::now();
        let result = self.inner.select(table, filter, page).await;
        observe("select", table, started, &result);
        result
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let started = Instant::now();
        let result = self.inner.count(table, filter).await;
        observe("count", table, started, &result);
        result
    }

    async fn delete(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let started = Instant::now();
        let result = self.inner.delete(table, filter).await;
        observe("delete", table, started, &result);
        result
    }

    async fn ping(&self) -> AgentsResult<()> {
        self.inner.ping().await
    }
}
