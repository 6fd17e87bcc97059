#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_core::{float, integer, text, timestamp, ColumnDef, SqlFunction, SqlValue, TableRegistry};
use tally_migrate::{declare_ledger, Connection, LedgerEntry, MigrateError, Result, Row};

/// An in-memory stand-in for a database.
///
/// It understands just the statements the runner and ledger issue: table
/// creation, the ledger existence check, ledger lookups and ledger inserts.
#[derive(Debug, Default)]
pub struct MemoryConnection {
    pub connected: bool,
    pub tables: Vec<String>,
    /// Tables that exist in a schema other than the current one.
    pub other_schema_tables: Vec<String>,
    pub ledger: Vec<LedgerEntry>,
    /// Every statement passed to `execute`, including failed ones.
    pub executed: Vec<String>,
    /// `execute` fails for statements containing this text.
    pub fail_on: Option<String>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every `execute` whose SQL contains `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn execute_count(&self) -> usize {
        self.executed.len()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    pub fn ledger_names(&self) -> Vec<&str> {
        self.ledger.iter().map(|e| e.migration_name.as_str()).collect()
    }

    fn require_ledger(&self) -> Result<()> {
        if self.has_table("migrations") {
            Ok(())
        } else {
            Err(MigrateError::Execution(
                "relation \"migrations\" does not exist".to_string(),
            ))
        }
    }
}

/// Returns the single-quoted literals of `sql`, in order.
fn quoted(sql: &str) -> Vec<&str> {
    sql.split('\'').skip(1).step_by(2).collect()
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        if let Some(needle) = &self.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(MigrateError::Execution(format!("injected failure: {needle}")));
            }
        }

        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let name = rest.split_whitespace().next().unwrap_or_default().to_string();
            if self.has_table(&name) {
                return Err(MigrateError::Execution(format!(
                    "relation \"{name}\" already exists"
                )));
            }
            self.tables.push(name);
            return Ok(());
        }

        if sql.starts_with("INSERT INTO migrations ") {
            self.require_ledger()?;
            let values = quoted(sql);
            let (name, hash) = (values[0].to_string(), values[1].to_string());
            if self
                .ledger
                .iter()
                .any(|e| e.migration_name == name && e.migration_hash == hash)
            {
                return Err(MigrateError::Execution(
                    "duplicate key value violates unique constraint".to_string(),
                ));
            }
            let id = i64::try_from(self.ledger.len()).unwrap() + 1;
            self.ledger.push(LedgerEntry {
                migration_id: id,
                migration_name: name,
                migration_hash: hash,
                created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            });
            return Ok(());
        }

        Err(MigrateError::Execution(format!("unsupported statement: {sql}")))
    }

    async fn fetch_one(&mut self, sql: &str) -> Result<Option<Row>> {
        if sql.contains("information_schema.tables") {
            let name = quoted(sql)[0];
            let current_schema_only = sql.contains("table_schema = current_schema()");
            let elsewhere =
                !current_schema_only && self.other_schema_tables.iter().any(|t| t == name);
            if !self.has_table(name) && !elsewhere {
                return Ok(None);
            }
            let mut row = Row::new();
            row.insert("present".to_string(), SqlValue::Integer(1));
            return Ok(Some(row));
        }

        if sql.contains(" FROM migrations ") {
            self.require_ledger()?;
            let values = quoted(sql);
            let found = self
                .ledger
                .iter()
                .find(|e| e.migration_name == values[0] && e.migration_hash == values[1]);
            return Ok(found.map(|e| {
                let mut row = Row::new();
                row.insert("migration_id".to_string(), SqlValue::Integer(e.migration_id));
                row
            }));
        }

        Err(MigrateError::Execution(format!("unsupported query: {sql}")))
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        if sql.ends_with(" FROM migrations") {
            self.require_ledger()?;
            // Newest first, so callers must sort.
            return Ok(self.ledger.iter().rev().map(Row::from).collect());
        }
        Err(MigrateError::Execution(format!("unsupported query: {sql}")))
    }
}

fn accounts_columns() -> Vec<ColumnDef> {
    vec![
        integer("account_id").primary_key(),
        text("account_type"),
        timestamp("created_at").default_function(SqlFunction::Now),
        timestamp("updated_at").nullable().default_null(),
    ]
}

fn payments_columns() -> Vec<ColumnDef> {
    vec![
        integer("payment_id").primary_key(),
        integer("account_id"),
        float("amount"),
        timestamp("created_at").default_function(SqlFunction::Now),
        timestamp("updated_at").nullable().default_null(),
    ]
}

/// The ledger followed by `accounts` and `payments`.
pub fn bank_registry() -> TableRegistry {
    let mut registry = TableRegistry::new();
    declare_ledger(&mut registry).unwrap();
    registry
        .declare_table("accounts", Some("account_id"), accounts_columns())
        .unwrap();
    registry
        .declare_table("payments", Some("payment_id"), payments_columns())
        .unwrap();
    registry
}

/// Same as [`bank_registry`], with an extra `accounts.nickname` column.
pub fn bank_registry_v2() -> TableRegistry {
    let mut registry = TableRegistry::new();
    declare_ledger(&mut registry).unwrap();
    let mut accounts = accounts_columns();
    accounts.push(text("nickname").nullable().default_null());
    registry
        .declare_table("accounts", Some("account_id"), accounts)
        .unwrap();
    registry
        .declare_table("payments", Some("payment_id"), payments_columns())
        .unwrap();
    registry
}

/// `accounts` declared before the ledger.
pub fn ledger_last_registry() -> TableRegistry {
    let mut registry = TableRegistry::new();
    registry
        .declare_table("accounts", Some("account_id"), accounts_columns())
        .unwrap();
    declare_ledger(&mut registry).unwrap();
    registry
}
