//! The storage backend trait.

use ::async_trait::async_trait;
use agents_core::AgentsResult;
use std::sync::Arc;

use crate::table::{Filter, Page, Record, Table};

/// Row-level operations over the relational tables.
///
/// Implementations must order `select` results by `created_at`, then `id`,
/// and must report a duplicate primary key on `insert` as
/// `StorageError::AlreadyExists`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Insert a new row and return it as stored.
    async fn insert(&self, table: &'static Table, record: Record) -> AgentsResult<Record>;

    /// Insert a row, or overwrite every non-key column except `created_at`
    /// when the key already exists.
    async fn upsert(&self, table: &'static Table, record: Record) -> AgentsResult<Record>;

    /// Overwrite an existing row matched by the key columns of `record`.
    /// Returns `None` when no row has that key.
    async fn replace(&self, table: &'static Table, record: Record) -> AgentsResult<Option<Record>>;

    /// Rows matching `filter`, optionally windowed.
    async fn select(
        &self,
        table: &'static Table,
        filter: &Filter,
        page: Option<Page>,
    ) -> AgentsResult<Vec<Record>>;

    /// Number of rows matching `filter`.
    async fn count(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64>;

    /// Delete rows matching `filter` and return how many were removed.
    async fn delete(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64>;

    /// Check the backend is reachable.
    async fn ping(&self) -> AgentsResult<()>;
}

/// Store shared across request handlers.
pub type SharedStore = Arc<dyn Store>;
