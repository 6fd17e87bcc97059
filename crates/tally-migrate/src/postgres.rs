//! PostgreSQL connection backed by a `sqlx` pool.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as _, Row as _, TypeInfo as _};
use tally_core::SqlValue;
use tracing::{debug, info};

use crate::connection::{Connection, Dsn, Row};
use crate::error::{MigrateError, Result};

/// A [`Connection`] to a PostgreSQL server.
///
/// Statements run on a single pooled connection, one at a time.
#[derive(Debug)]
pub struct PgConnection {
    url: String,
    pool: Option<PgPool>,
}

impl PgConnection {
    /// Creates an unopened connection for a `postgres://` URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: None,
        }
    }

    /// Creates an unopened connection from DSN parts.
    ///
    /// The driver suffix names a client library, not a server, so it is
    /// dropped from the URL handed to `sqlx`.
    #[must_use]
    pub fn from_dsn(dsn: &Dsn) -> Self {
        let url = Dsn {
            driver: None,
            ..dsn.clone()
        };
        Self::new(url.to_string())
    }

    /// Returns true once `connect` has succeeded.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| MigrateError::Connection("not connected".to_string()))
    }
}

fn execution_error(err: sqlx::Error) -> MigrateError {
    MigrateError::Execution(err.to_string())
}

fn decode_value(row: &PgRow, index: usize, type_name: &str) -> Result<SqlValue> {
    let value = match type_name {
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .map(|v| v.map(|n| SqlValue::Integer(i64::from(n)))),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .map(|v| v.map(|n| SqlValue::Integer(i64::from(n)))),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .map(|v| v.map(SqlValue::Integer)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| v.map(|f| SqlValue::Float(f64::from(f)))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .map(|v| v.map(SqlValue::Float)),
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .map(|v| v.map(SqlValue::Bool)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::Text)),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(SqlValue::Timestamp)),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map(|ts| SqlValue::Timestamp(ts.naive_utc()))),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map(|v| v.map(SqlValue::Bytes)),
        other => {
            return Err(MigrateError::Execution(format!(
                "unsupported column type '{other}'"
            )))
        }
    };
    Ok(value.map_err(execution_error)?.unwrap_or(SqlValue::Null))
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_value(row, column.ordinal(), column.type_info().name())?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

#[async_trait]
impl Connection for PgConnection {
    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.url)
            .await
            .map_err(|e| MigrateError::Connection(e.to_string()))?;
        info!("Connected to PostgreSQL");
        self.pool = Some(pool);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Disconnected from PostgreSQL");
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing SQL");
        sqlx::raw_sql(sql)
            .execute(self.pool()?)
            .await
            .map_err(execution_error)?;
        Ok(())
    }

    async fn fetch_one(&mut self, sql: &str) -> Result<Option<Row>> {
        debug!(sql = %sql, "Fetching one row");
        let row = sqlx::query(sql)
            .fetch_optional(self.pool()?)
            .await
            .map_err(execution_error)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!(sql = %sql, "Fetching rows");
        let rows = sqlx::query(sql)
            .fetch_all(self.pool()?)
            .await
            .map_err(execution_error)?;
        rows.iter().map(decode_row).collect()
    }
}
