use std::fs;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::error::{InsightError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{CallInsight, CallRecord, Sentiment};
use crate::schema::call_records;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Persistence for analyzed calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the records table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Persist one analysis and return the identifier the store assigned.
    async fn insert(&self, transcript: &str, insight: &CallInsight) -> Result<i64>;

    /// Release pooled connections; later calls fail.
    async fn close(&self);
}

/// SQLite record store backed by an r2d2 pool
pub struct SqliteRecordStore {
    pool: RwLock<Option<DbPool>>,
    metrics: MetricsCollector,
}

impl SqliteRecordStore {
    /// Create the connection pool for `config.url`.
    ///
    /// Accepts `sqlite://path`, `sqlite:path` or a bare path.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = database_path(&config.url)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA journal_mode=WAL;")
        });
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        info!(path, max_connections = config.max_connections, "database pool created");

        Ok(Self {
            pool: RwLock::new(Some(pool)),
            metrics: MetricsCollector::default(),
        })
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool()?.get()?)
    }

    /// Load one stored record.
    pub async fn fetch(&self, id: i64) -> Result<Option<CallRecord>> {
        self.with_connection("fetch", move |conn| {
            let sql = format!(
                "SELECT {}, {}, {} FROM {} WHERE {} = ?1",
                call_records::ID,
                call_records::TRANSCRIPT,
                call_records::INSIGHT_COLUMNS.join(", "),
                call_records::TABLE,
                call_records::ID
            );
            Ok(conn.query_row(&sql, params![id], map_call_record).optional()?)
        })
        .await
    }

    fn pool(&self) -> Result<DbPool> {
        self.pool
            .read()
            .map_err(|_| InsightError::Task("pool lock poisoned".to_string()))?
            .clone()
            .ok_or(InsightError::StoreNotInitialized)
    }

    /// Run `f` with a pooled connection on the blocking thread pool.
    async fn with_connection<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool()?;
        let timer = OperationTimer::new(operation);
        let result = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(InsightError::from)
        .and_then(|inner| inner);

        self.metrics.record_db_operation(operation, timer.elapsed(), result.is_ok());
        result
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn ensure_schema(&self) -> Result<()> {
        info!("startup: ensuring {} table exists", call_records::TABLE);
        self.with_connection("ensure_schema", |conn| {
            conn.execute_batch(call_records::CREATE_SQL)?;
            Ok(())
        })
        .await?;
        info!("startup: schema ready");
        Ok(())
    }

    async fn insert(&self, transcript: &str, insight: &CallInsight) -> Result<i64> {
        let transcript = transcript.to_owned();
        let insight = insight.clone();

        info!("db: inserting call record");
        let id = self
            .with_connection("insert", move |conn| {
                let placeholders: Vec<String> = (1..=call_records::INSIGHT_COLUMNS.len() + 1)
                    .map(|i| format!("?{i}"))
                    .collect();
                let sql = format!(
                    "INSERT INTO {} ({}, {}) VALUES ({}) RETURNING {}",
                    call_records::TABLE,
                    call_records::TRANSCRIPT,
                    call_records::INSIGHT_COLUMNS.join(", "),
                    placeholders.join(", "),
                    call_records::ID
                );

                let id: i64 = conn.query_row(
                    &sql,
                    params![
                        transcript,
                        insight.primary_purpose,
                        insight.objective_met,
                        insight.key_outcome,
                        insight.customer_intent,
                        insight.non_payment_reason,
                        insight.sentiment_start.as_str(),
                        insight.sentiment_end.as_str(),
                        insight.hardship_flag,
                        insight.agent_performance_rating,
                        insight.action_required,
                        insight.summary,
                    ],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;

        info!(record_id = id, "db: record inserted");
        Ok(id)
    }

    async fn close(&self) {
        let pool = match self.pool.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match pool {
            Some(pool) => {
                info!(
                    connections = pool.state().connections,
                    "shutdown: closing database pool"
                );
                drop(pool);
            },
            None => warn!("shutdown: database pool already closed"),
        }
    }
}

/// Strip the scheme from a database URL.
///
/// Any `scheme://` other than `sqlite://` is rejected rather than read as a path.
pub fn database_path(url: &str) -> Result<&str> {
    let url = url.trim();
    if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
        return Ok(path);
    }
    match url.split_once("://") {
        Some((scheme, _)) => Err(InsightError::UnsupportedDatabaseUrl(scheme.to_string())),
        None => Ok(url),
    }
}

fn map_call_record(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    Ok(CallRecord {
        id: row.get(0)?,
        transcript: row.get(1)?,
        insight: CallInsight {
            primary_purpose: row.get(2)?,
            objective_met: row.get(3)?,
            key_outcome: row.get(4)?,
            customer_intent: row.get(5)?,
            non_payment_reason: row.get(6)?,
            sentiment_start: sentiment_column(row, 7)?,
            sentiment_end: sentiment_column(row, 8)?,
            hardship_flag: row.get(9)?,
            agent_performance_rating: row.get(10)?,
            action_required: row.get(11)?,
            summary: row.get(12)?,
        },
    })
}

fn sentiment_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Sentiment> {
    let value: String = row.get(idx)?;
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_strips_scheme() {
        assert_eq!(database_path("sqlite://data/calls.db").unwrap(), "data/calls.db");
        assert_eq!(database_path("sqlite:data/calls.db").unwrap(), "data/calls.db");
        assert_eq!(database_path(" /var/lib/calls.db ").unwrap(), "/var/lib/calls.db");
    }

    #[test]
    fn test_database_path_rejects_other_schemes() {
        let err = database_path("postgresql://user:pw@localhost:5432/calls").unwrap_err();
        assert!(matches!(err, InsightError::UnsupportedDatabaseUrl(ref scheme) if scheme == "postgresql"));
        assert!(database_path("mysql://localhost/calls").is_err());
    }

    #[test]
    fn test_open_with_postgres_url_creates_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("postgresql://user:pw@{}/calls", dir.path().display()),
            max_connections: 1,
            connection_timeout_secs: 1,
            busy_timeout_ms: 100,
        };
        assert!(matches!(
            SqliteRecordStore::open(&config),
            Err(InsightError::UnsupportedDatabaseUrl(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_insight_columns_match_prompt_fields() {
        assert_eq!(call_records::INSIGHT_COLUMNS, crate::prompt::FIELD_NAMES);
    }
}
