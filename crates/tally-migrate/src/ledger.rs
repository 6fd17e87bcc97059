//! The migration ledger.
//!
//! The ledger is an ordinary declared table that records which
//! `(table name, DDL hash)` pairs have been applied. It is read and written
//! with the same builders as any other table.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tally_core::builder::{insert, select, Insert, Projection, Select};
use tally_core::expr::eq;
use tally_core::{
    integer, text, timestamp, Column, Literal, SqlFunction, SqlValue, TableDef, TableRegistry,
    TableSchema,
};

use crate::connection::{Connection, Row};
use crate::error::{MigrateError, Result};

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "migrations";

/// Declares the ledger table in `registry`.
///
/// Declare it before any other table so the runner creates it first.
///
/// # Errors
///
/// Returns a schema error if a table of the same name is already declared.
pub fn declare_ledger(registry: &mut TableRegistry) -> Result<Arc<TableSchema>> {
    let def = TableDef::new(LEDGER_TABLE)
        .primary_key("migration_id")
        .column(integer("migration_id").primary_key())
        .column(text("migration_name"))
        .column(text("migration_hash"))
        .column(timestamp("created_at").default_function(SqlFunction::Now))
        .unique(["migration_name", "migration_hash"]);
    Ok(registry.declare(def)?)
}

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Row id.
    pub migration_id: i64,
    /// Name of the migrated table.
    pub migration_name: String,
    /// Hex digest of the applied DDL.
    pub migration_hash: String,
    /// When the migration was recorded.
    pub created_at: NaiveDateTime,
}

impl LedgerEntry {
    fn from_row(row: &Row) -> Result<Self> {
        let field = |name: &str| {
            row.get(name)
                .ok_or_else(|| MigrateError::InvalidLedgerRow(format!("missing column '{name}'")))
        };
        let mistyped =
            |name: &str| MigrateError::InvalidLedgerRow(format!("column '{name}' has wrong type"));

        Ok(Self {
            migration_id: field("migration_id")?
                .as_i64()
                .ok_or_else(|| mistyped("migration_id"))?,
            migration_name: field("migration_name")?
                .as_str()
                .ok_or_else(|| mistyped("migration_name"))?
                .to_string(),
            migration_hash: field("migration_hash")?
                .as_str()
                .ok_or_else(|| mistyped("migration_hash"))?
                .to_string(),
            created_at: field("created_at")?
                .as_timestamp()
                .ok_or_else(|| mistyped("created_at"))?,
        })
    }
}

/// Queries and records against the declared ledger table.
#[derive(Debug, Clone)]
pub struct Ledger {
    table: Arc<TableSchema>,
    id: Column,
    name: Column,
    hash: Column,
    created_at: Column,
}

impl Ledger {
    /// Binds to the ledger table declared in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::LedgerNotDeclared`] if the table is missing,
    /// or a schema error if it lacks one of the ledger columns.
    pub fn from_registry(registry: &TableRegistry, name: &str) -> Result<Self> {
        let table = registry
            .get(name)
            .cloned()
            .ok_or_else(|| MigrateError::LedgerNotDeclared(name.to_string()))?;
        Ok(Self {
            id: table.column("migration_id")?,
            name: table.column("migration_name")?,
            hash: table.column("migration_hash")?,
            created_at: table.column("created_at")?,
            table,
        })
    }

    /// The ledger table schema.
    #[must_use]
    pub fn table(&self) -> &Arc<TableSchema> {
        &self.table
    }

    /// SQL checking whether the ledger table exists in the current schema.
    ///
    /// Unqualified ledger queries resolve through `search_path`, so a ledger
    /// in another schema does not count.
    ///
    /// # Errors
    ///
    /// Propagates literal rendering errors.
    pub fn exists_sql(&self) -> Result<String> {
        Ok(format!(
            "SELECT 1 AS present FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = {}",
            Literal::from(self.table.name()).to_sql()?
        ))
    }

    /// The lookup for a `(name, hash)` pair.
    #[must_use]
    pub fn lookup_query(&self, name: &str, hash: &str) -> Select {
        select([&self.id])
            .from_table(&self.table)
            .where_clause([eq(&self.name, name), eq(&self.hash, hash)])
            .limit(1)
    }

    /// The insert recording a `(name, hash)` pair.
    #[must_use]
    pub fn record_query(&self, name: &str, hash: &str) -> Insert {
        insert()
            .into_table(&self.table)
            .values([
                (&self.name, Literal::from(name)),
                (&self.hash, Literal::from(hash)),
            ])
    }

    /// The query listing every entry.
    #[must_use]
    pub fn entries_query(&self) -> Select {
        select([
            Projection::from(&self.id),
            Projection::from(&self.name),
            Projection::from(&self.hash),
            Projection::from(&self.created_at),
        ])
        .from_table(&self.table)
    }

    /// Returns true if the ledger table exists.
    ///
    /// # Errors
    ///
    /// Propagates connection errors.
    pub async fn exists<C>(&self, conn: &mut C) -> Result<bool>
    where
        C: Connection + ?Sized,
    {
        let sql = self.exists_sql()?;
        Ok(conn.fetch_one(&sql).await?.is_some())
    }

    /// Returns true if `(name, hash)` has been recorded.
    ///
    /// # Errors
    ///
    /// Propagates connection errors.
    pub async fn is_applied<C>(&self, conn: &mut C, name: &str, hash: &str) -> Result<bool>
    where
        C: Connection + ?Sized,
    {
        let row = conn.fetch_one_query(&self.lookup_query(name, hash)).await?;
        Ok(row.is_some())
    }

    /// Records `(name, hash)` as applied.
    ///
    /// # Errors
    ///
    /// Propagates connection errors, including a uniqueness violation when
    /// another runner recorded the same pair first.
    pub async fn record<C>(&self, conn: &mut C, name: &str, hash: &str) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        conn.execute_query(&self.record_query(name, hash)).await
    }

    /// Returns every entry, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates connection errors and rejects malformed rows.
    pub async fn entries<C>(&self, conn: &mut C) -> Result<Vec<LedgerEntry>>
    where
        C: Connection + ?Sized,
    {
        let rows = conn.fetch_all_query(&self.entries_query()).await?;
        let mut entries = rows
            .iter()
            .map(LedgerEntry::from_row)
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.migration_id);
        Ok(entries)
    }
}

/// Renders ledger entries as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`MigrateError::Serialization`] if encoding fails.
pub fn entries_to_json(entries: &[LedgerEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

impl From<&LedgerEntry> for Row {
    fn from(entry: &LedgerEntry) -> Self {
        let mut row = Self::new();
        row.insert("migration_id".into(), SqlValue::Integer(entry.migration_id));
        row.insert(
            "migration_name".into(),
            SqlValue::Text(entry.migration_name.clone()),
        );
        row.insert(
            "migration_hash".into(),
            SqlValue::Text(entry.migration_hash.clone()),
        );
        row.insert("created_at".into(), SqlValue::Timestamp(entry.created_at));
        row
    }
}
