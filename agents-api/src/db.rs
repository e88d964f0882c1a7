//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres and `PgStore`, the
//! Postgres implementation of the storage `Store` trait.
//!
//! Rows cross the wire as `jsonb`: a record is bound as one parameter and
//! expanded with `jsonb_populate_record`, and result rows come back through
//! `to_jsonb`. Every identifier comes from a static `Table` descriptor.

use crate::error::{ApiError, ApiResult};
use agents_core::{AgentsError, AgentsResult, StorageError};
use agents_storage::{Filter, Page, Record, Store, Table};
use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime, Timeouts,
};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::{error::SqlState, NoTls};

/// Schema applied by [`migrate`].
const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full connection URL. Takes precedence over the discrete fields.
    pub url: Option<String>,
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: "agents".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// `AGENTS_DATABASE_URL` wins over `AGENTS_DB_HOST`, `AGENTS_DB_PORT`,
    /// `AGENTS_DB_NAME`, `AGENTS_DB_USER` and `AGENTS_DB_PASSWORD`.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("AGENTS_DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            host: std::env::var("AGENTS_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("AGENTS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("AGENTS_DB_NAME").unwrap_or_else(|_| "agents".to_string()),
            user: std::env::var("AGENTS_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("AGENTS_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("AGENTS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("AGENTS_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        match &self.url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::service_unavailable(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

/// Create the schema when it does not exist yet.
pub async fn migrate(pool: &Pool) -> ApiResult<()> {
    let conn = pool.get().await?;
    conn.batch_execute(INIT_SCHEMA).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

// ============================================================================
// SQL BUILDING
// ============================================================================

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn column_list(columns: &[&str], prefix: Option<&str>) -> String {
    columns
        .iter()
        .map(|column| match prefix {
            Some(prefix) => format!("{}.{}", prefix, quote(column)),
            None => quote(column),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT` of one jsonb-encoded row, optionally merging on key conflicts.
fn insert_sql(table: &Table, upsert: bool) -> String {
    let name = quote(table.name);
    let columns = column_list(table.columns, None);
    let mut sql = format!(
        "INSERT INTO {name} ({columns}) SELECT {columns} \
         FROM jsonb_populate_record(NULL::{name}, $1::jsonb)"
    );
    if upsert {
        let mut assignments: Vec<String> = table
            .value_columns()
            .filter(|column| *column != "created_at")
            .map(|column| format!("{c} = EXCLUDED.{c}", c = quote(column)))
            .collect();
        if assignments.is_empty() {
            let first = quote(table.key[0]);
            assignments.push(format!("{first} = EXCLUDED.{first}"));
        }
        sql.push_str(&format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            column_list(table.key, None),
            assignments.join(", ")
        ));
    }
    sql.push_str(&format!(" RETURNING to_jsonb({name}.*)"));
    sql
}

fn replace_sql(table: &Table) -> String {
    let name = quote(table.name);
    let assignments = table
        .value_columns()
        .filter(|column| *column != "created_at")
        .map(|column| format!("{c} = r.{c}", c = quote(column)))
        .collect::<Vec<_>>()
        .join(", ");
    let key_match = table
        .key
        .iter()
        .map(|column| format!("t.{c} = r.{c}", c = quote(column)))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!(
        "UPDATE {name} AS t SET {assignments} \
         FROM jsonb_populate_record(NULL::{name}, $1::jsonb) AS r \
         WHERE {key_match} RETURNING to_jsonb(t.*)"
    )
}

/// `WHERE` clause comparing `t` with the filter row `f`.
fn filter_sql(filter: &Filter) -> String {
    if filter.is_empty() {
        return "TRUE".to_string();
    }
    filter
        .clauses()
        .iter()
        .map(|(column, _)| format!("t.{c} IS NOT DISTINCT FROM f.{c}", c = quote(column)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn select_sql(table: &Table, filter: &Filter, paged: bool) -> String {
    let name = quote(table.name);
    let mut sql = format!(
        "SELECT to_jsonb(t.*) FROM {name} AS t, \
         jsonb_populate_record(NULL::{name}, $1::jsonb) AS f \
         WHERE {} ORDER BY t.\"created_at\", t.\"id\"",
        filter_sql(filter)
    );
    if paged {
        sql.push_str(" LIMIT $2 OFFSET $3");
    }
    sql
}

fn count_sql(table: &Table, filter: &Filter) -> String {
    let name = quote(table.name);
    format!(
        "SELECT count(*) FROM {name} AS t, \
         jsonb_populate_record(NULL::{name}, $1::jsonb) AS f WHERE {}",
        filter_sql(filter)
    )
}

fn delete_sql(table: &Table, filter: &Filter) -> String {
    let name = quote(table.name);
    format!(
        "DELETE FROM {name} AS t \
         USING jsonb_populate_record(NULL::{name}, $1::jsonb) AS f WHERE {}",
        filter_sql(filter)
    )
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pool_error(err: PoolError) -> AgentsError {
    match err {
        PoolError::Timeout(_) | PoolError::Closed => StorageError::Unavailable {
            reason: err.to_string(),
        }
        .into(),
        other => AgentsError::backend(other.to_string()),
    }
}

fn key_description(table: &Table, record: &Record) -> String {
    table
        .key
        .iter()
        .map(|column| match record.get(*column) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn query_error(table: &'static Table, record: Option<&Record>, err: tokio_postgres::Error) -> AgentsError {
    if err.is_closed() {
        return StorageError::Unavailable {
            reason: err.to_string(),
        }
        .into();
    }
    match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => StorageError::AlreadyExists {
            entity: table.name,
            id: record
                .map(|record| key_description(table, record))
                .unwrap_or_default(),
        }
        .into(),
        Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
            let detail = err
                .as_db_error()
                .and_then(|db| db.detail().map(str::to_string))
                .unwrap_or_else(|| err.to_string());
            StorageError::MissingReference {
                entity: table.name,
                id: detail,
            }
            .into()
        }
        _ => AgentsError::backend(err.to_string()),
    }
}

fn decode_row(table: &'static Table, value: JsonValue) -> AgentsResult<Record> {
    match value {
        JsonValue::Object(record) => Ok(record),
        other => Err(StorageError::Decode {
            table: table.name,
            reason: format!("expected a JSON object, got {}", other),
        }
        .into()),
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// `Store` backed by a deadpool-postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> AgentsResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    async fn write_row(
        &self,
        table: &'static Table,
        record: Record,
        upsert: bool,
    ) -> AgentsResult<Record> {
        let conn = self.get_conn().await?;
        let param = JsonValue::Object(record);
        let row = conn
            .query_one(insert_sql(table, upsert).as_str(), &[&param])
            .await
            .map_err(|e| query_error(table, param.as_object(), e))?;
        decode_row(table, row.get(0))
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        self.write_row(table, record, false).await
    }

    async fn upsert(&self, table: &'static Table, record: Record) -> AgentsResult<Record> {
        self.write_row(table, record, true).await
    }

    async fn replace(&self, table: &'static Table, record: Record) -> AgentsResult<Option<Record>> {
        let conn = self.get_conn().await?;
        let param = JsonValue::Object(record);
        let row = conn
            .query_opt(replace_sql(table).as_str(), &[&param])
            .await
            .map_err(|e| query_error(table, param.as_object(), e))?;
        row.map(|row| decode_row(table, row.get(0))).transpose()
    }

    async fn select(
        &self,
        table: &'static Table,
        filter: &Filter,
        page: Option<Page>,
    ) -> AgentsResult<Vec<Record>> {
        let conn = self.get_conn().await?;
        let param = JsonValue::Object(filter.to_record());
        let sql = select_sql(table, filter, page.is_some());
        let rows = match page {
            Some(page) => {
                let limit = to_i64(page.limit);
                let offset = to_i64(page.offset);
                conn.query(sql.as_str(), &[&param, &limit, &offset]).await
            }
            None => conn.query(sql.as_str(), &[&param]).await,
        }
        .map_err(|e| query_error(table, None, e))?;
        rows.into_iter()
            .map(|row| decode_row(table, row.get(0)))
            .collect()
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let conn = self.get_conn().await?;
        let param = JsonValue::Object(filter.to_record());
        let row = conn
            .query_one(count_sql(table, filter).as_str(), &[&param])
            .await
            .map_err(|e| query_error(table, None, e))?;
        let count: i64 = row.get(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn delete(&self, table: &'static Table, filter: &Filter) -> AgentsResult<u64> {
        let conn = self.get_conn().await?;
        let param = JsonValue::Object(filter.to_record());
        conn.execute(delete_sql(table, filter).as_str(), &[&param])
            .await
            .map_err(|e| query_error(table, None, e))
    }

    async fn ping(&self) -> AgentsResult<()> {
        let conn = self.get_conn().await?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| StorageError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents_storage::table::{AGENTS, AGENT_DATA_COMPONENTS, TOOLS};

    #[test]
    fn test_db_config_default() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "agents");
        assert_eq!(config.max_size, 16);
        assert!(config.url.is_none());
    }

    #[test]
    fn test_insert_sql_lists_every_column() {
        let sql = insert_sql(&TOOLS, false);
        assert!(sql.starts_with("INSERT INTO \"tools\" (\"tenant_id\", \"project_id\", \"id\", \"name\""));
        assert!(sql.contains("jsonb_populate_record(NULL::\"tools\", $1::jsonb)"));
        assert!(!sql.contains("ON CONFLICT"));
        assert!(sql.ends_with("RETURNING to_jsonb(\"tools\".*)"));
    }

    #[test]
    fn test_upsert_sql_keeps_created_at() {
        let sql = insert_sql(&AGENTS, true);
        assert!(sql.contains("ON CONFLICT (\"tenant_id\", \"project_id\", \"graph_id\", \"id\")"));
        assert!(sql.contains("\"prompt\" = EXCLUDED.\"prompt\""));
        assert!(!sql.contains("\"created_at\" = EXCLUDED"));
        assert!(!sql.contains("\"id\" = EXCLUDED"));
    }

    #[test]
    fn test_upsert_sql_for_association_table() {
        let sql = insert_sql(&AGENT_DATA_COMPONENTS, true);
        assert!(sql.contains("\"agent_id\" = EXCLUDED.\"agent_id\""));
        assert!(sql.contains("\"data_component_id\" = EXCLUDED.\"data_component_id\""));
    }

    #[test]
    fn test_replace_sql_matches_on_key() {
        let sql = replace_sql(&TOOLS);
        assert!(sql.contains("t.\"tenant_id\" = r.\"tenant_id\" AND t.\"project_id\" = r.\"project_id\" AND t.\"id\" = r.\"id\""));
        assert!(sql.contains("\"status\" = r.\"status\""));
    }

    #[test]
    fn test_filter_sql() {
        assert_eq!(filter_sql(&Filter::new()), "TRUE");
        let filter = Filter::new().with("tenant_id", "acme").is_null("target_agent_id");
        assert_eq!(
            filter_sql(&filter),
            "t.\"tenant_id\" IS NOT DISTINCT FROM f.\"tenant_id\" AND \
             t.\"target_agent_id\" IS NOT DISTINCT FROM f.\"target_agent_id\""
        );
    }

    #[test]
    fn test_select_sql_paging() {
        let filter = Filter::new().with("tenant_id", "acme");
        assert!(select_sql(&TOOLS, &filter, true).ends_with("ORDER BY t.\"created_at\", t.\"id\" LIMIT $2 OFFSET $3"));
        assert!(select_sql(&TOOLS, &filter, false).ends_with("ORDER BY t.\"created_at\", t.\"id\""));
    }

    #[test]
    fn test_decode_row_rejects_non_objects() {
        let err = decode_row(&TOOLS, JsonValue::Null).unwrap_err();
        assert!(matches!(err, AgentsError::Storage(StorageError::Decode { table: "tools", .. })));
    }
}
