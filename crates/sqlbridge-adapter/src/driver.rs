//! The driver boundary.
//!
//! A [`Driver`] executes one statement with bound parameters in one of three
//! shapes: `run` (no rows, reports the insert id and change count), `all`
//! (every row) and `get` (at most one row). Rows come back as
//! [`StoredRow`]s; turning them into model values is the adapter's job.

use std::str::FromStr;

use sqlbridge_core::value::{SqlValue, StoredRow};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::error::Result;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Row id of the last inserted row.
    pub last_insert_id: i64,
    /// Number of rows the statement changed.
    pub rows_affected: u64,
}

/// Executes SQL statements.
#[allow(async_fn_in_trait)]
pub trait Driver {
    /// Executes a statement that returns no rows.
    async fn run(&self, sql: &str, params: Vec<SqlValue>) -> Result<RunResult>;

    /// Executes a query and returns every row.
    async fn all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<StoredRow>>;

    /// Executes a query and returns the first row, if any.
    async fn get(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<StoredRow>>;

    /// Executes parameterless statements as one transaction. Either every
    /// statement takes effect or none does, including when the returned
    /// future is dropped before it completes.
    async fn run_all(&self, statements: &[String]) -> Result<()>;

    /// Closes the underlying connection.
    async fn close(&self);
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A [`Driver`] over a single-connection SQLite pool.
///
/// The pool never recycles its connection, so an in-memory database lives
/// as long as the driver.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Opens `database` (a path, a `sqlite:` URL or `:memory:`), creating
    /// the file if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be parsed or opened.
    pub async fn connect(database: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database)?
            .create_if_missing(true)
            .with_regexp();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn prepare(sql: &str, params: Vec<SqlValue>) -> SqliteQuery<'_> {
        params.into_iter().fold(sqlx::query(sql), bind_param)
    }
}

impl Driver for SqliteDriver {
    async fn run(&self, sql: &str, params: Vec<SqlValue>) -> Result<RunResult> {
        let done = Self::prepare(sql, params).execute(&self.pool).await?;
        Ok(RunResult {
            last_insert_id: done.last_insert_rowid(),
            rows_affected: done.rows_affected(),
        })
    }

    async fn all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<StoredRow>> {
        let rows = Self::prepare(sql, params).fetch_all(&self.pool).await?;
        let rows = rows.iter().map(stored_row).collect::<sqlx::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn get(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<StoredRow>> {
        let row = Self::prepare(sql, params).fetch_optional(&self.pool).await?;
        let row = row.as_ref().map(stored_row).transpose()?;
        Ok(row)
    }

    async fn run_all(&self, statements: &[String]) -> Result<()> {
        // Dropping an uncommitted transaction rolls it back.
        let mut tx = self.pool.begin().await?;
        for sql in statements {
            sqlx::query(sql.as_str()).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_param(query: SqliteQuery<'_>, param: SqlValue) -> SqliteQuery<'_> {
    match param {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Reads every column of `row` by its runtime storage class.
fn stored_row(row: &SqliteRow) -> sqlx::Result<StoredRow> {
    row.columns()
        .iter()
        .map(|column| {
            let index = column.ordinal();
            let raw = row.try_get_raw(index)?;
            let value = if raw.is_null() {
                SqlValue::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" | "INT8" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
                    "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
                    "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
                    _ => SqlValue::Text(row.try_get_unchecked(index)?),
                }
            };
            Ok((column.name().to_string(), value))
        })
        .collect()
}
