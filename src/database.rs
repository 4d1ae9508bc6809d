//! Live database access for dynamic checks.
//!
//! Advisors only ever issue read-only diagnostic queries (`EXPLAIN ...`)
//! through [`LiveDatabase`]. Results come back as loosely typed
//! [`QueryRows`] because diagnostic output layouts differ between engines
//! and versions; decoding them is the job of [`crate::explain`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Column, Decode, Row, Type,
    mysql::{MySqlPool, MySqlPoolOptions, MySqlRow},
    postgres::{PgPool, PgPoolOptions, PgRow}
};
use thiserror::Error;

use crate::context::CancellationToken;

/// Maximum pool size; reviews issue at most one diagnostic per rule at a time.
const MAX_CONNECTIONS: u32 = 4;

/// Failure of a diagnostic query.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("{0}")]
    Query(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("query timed out after {}ms", .0.as_millis())]
    Timeout(Duration)
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// One cell of a diagnostic result.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String)
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{}", v),
            Self::BigInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{:?}", v)
        }
    }
}

/// Result of a diagnostic query.
///
/// Row 0 holds the column names, data rows follow from row 1, matching the
/// layout diagnostic decoders index into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub rows: Vec<Vec<Scalar>>
}

impl QueryRows {
    pub fn new(columns: Vec<String>, data: Vec<Vec<Scalar>>) -> Self {
        let mut rows = Vec::with_capacity(data.len() + 1);
        rows.push(columns.into_iter().map(Scalar::Text).collect());
        rows.extend(data);
        Self {
            rows
        }
    }
}

/// Read-only query access to a live database.
#[async_trait]
pub trait LiveDatabase: Send + Sync {
    /// Run a diagnostic query and return its full result.
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError>;
}

/// Run a diagnostic query, honoring cancellation and an optional timeout.
pub async fn run_diagnostic(
    database: &dyn LiveDatabase,
    sql: &str,
    cancel: &CancellationToken,
    timeout: Option<Duration>
) -> Result<QueryRows, DatabaseError> {
    if cancel.is_cancelled() {
        return Err(DatabaseError::Cancelled);
    }
    let query = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, database.query(sql))
                .await
                .map_err(|_| DatabaseError::Timeout(limit))?,
            None => database.query(sql).await
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DatabaseError::Cancelled),
        result = query => result
    }
}

/// MySQL or TiDB connection pool.
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool
}

impl MySqlDatabase {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool
        }
    }

    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Connect(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LiveDatabase for MySqlDatabase {
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        tracing::debug!(sql, "running diagnostic query on MySQL");
        let rows: Vec<MySqlRow> = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        Ok(collect_rows(&rows, |row, idx| {
            // EXPLAIN row estimates are BIGINT UNSIGNED
            row.try_get::<Option<u64>, _>(idx).ok().map(|v| match v {
                None => Scalar::Null,
                Some(v) => i64::try_from(v)
                    .map(Scalar::BigInt)
                    .unwrap_or_else(|_| Scalar::Text(v.to_string()))
            })
        }))
    }
}

/// PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool
        }
    }

    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Connect(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LiveDatabase for PgDatabase {
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        tracing::debug!(sql, "running diagnostic query on PostgreSQL");
        let rows: Vec<PgRow> = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        Ok(collect_rows(&rows, |_, _| None))
    }
}

fn collect_rows<R>(rows: &[R], engine_cell: fn(&R, usize) -> Option<Scalar>) -> QueryRows
where
    R: Row,
    usize: sqlx::ColumnIndex<R>,
    i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    i32: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    f64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    String: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Vec<u8>: Type<R::Database> + for<'r> Decode<'r, R::Database>
{
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let data = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|idx| engine_cell(row, idx).unwrap_or_else(|| decode_cell(row, idx)))
                .collect()
        })
        .collect();
    QueryRows::new(columns, data)
}

/// Decode a cell by trying progressively looser types.
fn decode_cell<R>(row: &R, idx: usize) -> Scalar
where
    R: Row,
    usize: sqlx::ColumnIndex<R>,
    i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    i32: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    f64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    String: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    Vec<u8>: Type<R::Database> + for<'r> Decode<'r, R::Database>
{
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        v.map_or(Scalar::Null, Scalar::BigInt)
    } else if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        v.map_or(Scalar::Null, Scalar::Int)
    } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        v.map_or(Scalar::Null, Scalar::Float)
    } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        v.map_or(Scalar::Null, Scalar::Text)
    } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        v.map_or(Scalar::Null, |bytes| {
            Scalar::Text(String::from_utf8_lossy(&bytes).into_owned())
        })
    } else {
        Scalar::Null
    }
}
