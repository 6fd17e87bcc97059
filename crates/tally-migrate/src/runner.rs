//! Migration runner.
//!
//! Every declared table is migrated in registry order. A table's identity is
//! the SHA-256 digest of its generated `CREATE TABLE` text, so editing a
//! declaration (or the generator) yields a new hash and a new migration.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tally_core::{generate_up_migration, TableRegistry};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{MigrateError, Result};
use crate::ledger::{Ledger, LEDGER_TABLE};

/// Returns the lowercase hex SHA-256 digest of `ddl`.
#[must_use]
pub fn migration_hash(ddl: &str) -> String {
    hex::encode(Sha256::digest(ddl.as_bytes()))
}

/// The DDL and hash of one table, computed without touching the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMigration {
    /// Table name.
    pub table: String,
    /// Generated `CREATE TABLE` statement.
    pub ddl: String,
    /// Digest of `ddl`.
    pub hash: String,
}

/// What happened to a table during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The DDL was executed and recorded.
    Applied,
    /// The ledger already held this `(table, hash)` pair.
    Skipped,
    /// Dry run: the DDL would have been executed.
    Planned,
}

/// The outcome for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Table name.
    pub table: String,
    /// Digest of the table's DDL.
    pub hash: String,
    /// What the run did with it.
    pub outcome: MigrationOutcome,
}

impl MigrationRecord {
    fn new(planned: &PlannedMigration, outcome: MigrationOutcome) -> Self {
        Self {
            table: planned.table.clone(),
            hash: planned.hash.clone(),
            outcome,
        }
    }
}

/// Ledger state as seen by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerState {
    Absent,
    /// Dry run only: the ledger's DDL has been planned but not executed.
    Planned,
    Present,
}

/// Applies the tables of a registry through a [`Connection`].
#[derive(Debug, Clone)]
pub struct MigrationRunner<'a> {
    registry: &'a TableRegistry,
    ledger_table: String,
    dry_run: bool,
}

impl<'a> MigrationRunner<'a> {
    /// Creates a runner over `registry`, using the [`LEDGER_TABLE`] ledger.
    #[must_use]
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self {
            registry,
            ledger_table: LEDGER_TABLE.to_string(),
            dry_run: false,
        }
    }

    /// Uses a differently named ledger table.
    #[must_use]
    pub fn ledger_table(mut self, name: impl Into<String>) -> Self {
        self.ledger_table = name.into();
        self
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Returns true in dry-run mode.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Generates the DDL and hash of every declared table.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a default cannot be rendered.
    pub fn plan(&self) -> Result<Vec<PlannedMigration>> {
        self.registry
            .iter()
            .map(|table| -> Result<PlannedMigration> {
                let ddl = generate_up_migration(table)?;
                Ok(PlannedMigration {
                    table: table.name().to_string(),
                    hash: migration_hash(&ddl),
                    ddl,
                })
            })
            .collect()
    }

    /// Migrates every declared table, in declaration order.
    ///
    /// The first failure aborts the remaining tables; tables already applied
    /// stay applied.
    ///
    /// # Errors
    ///
    /// - [`MigrateError::LedgerNotDeclared`] if the ledger is not in the registry
    /// - [`MigrateError::LedgerMissing`] if the ledger table does not exist
    ///   when a different table is reached
    /// - connection and execution errors from `conn`
    pub async fn run<C>(&self, conn: &mut C) -> Result<Vec<MigrationRecord>>
    where
        C: Connection + ?Sized,
    {
        let ledger = Ledger::from_registry(self.registry, &self.ledger_table)?;
        let plan = self.plan()?;

        let mut state = if ledger.exists(conn).await? {
            LedgerState::Present
        } else {
            LedgerState::Absent
        };
        debug!(ledger = %self.ledger_table, state = ?state, "Ledger checked");

        let mut records = Vec::with_capacity(plan.len());
        for planned in &plan {
            let is_ledger = planned.table == self.ledger_table;
            info!(table = %planned.table, hash = %planned.hash, "Checking migration");

            match state {
                LedgerState::Present => {
                    if ledger
                        .is_applied(conn, &planned.table, &planned.hash)
                        .await?
                    {
                        info!(table = %planned.table, "Migration already applied, skipping");
                        records.push(MigrationRecord::new(planned, MigrationOutcome::Skipped));
                        continue;
                    }
                }
                LedgerState::Planned => {}
                LedgerState::Absent if is_ledger => {}
                LedgerState::Absent => {
                    warn!(
                        ledger = %self.ledger_table,
                        table = %planned.table,
                        "Ledger table missing"
                    );
                    return Err(MigrateError::LedgerMissing {
                        ledger: self.ledger_table.clone(),
                        table: planned.table.clone(),
                    });
                }
            }

            if self.dry_run {
                println!("{}", planned.ddl);
                if is_ledger && state == LedgerState::Absent {
                    state = LedgerState::Planned;
                }
                records.push(MigrationRecord::new(planned, MigrationOutcome::Planned));
                continue;
            }

            info!(table = %planned.table, hash = %planned.hash, "Applying migration");
            debug!(sql = %planned.ddl, "Executing SQL");
            conn.execute(&planned.ddl).await?;
            if is_ledger {
                state = LedgerState::Present;
            }
            ledger.record(conn, &planned.table, &planned.hash).await?;
            info!(table = %planned.table, "Migration applied");
            records.push(MigrationRecord::new(planned, MigrationOutcome::Applied));
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use tally_core::{integer, text};

    use super::*;
    use crate::ledger::declare_ledger;

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = migration_hash("CREATE TABLE t (\n    id SERIAL NOT NULL PRIMARY KEY\n);");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(
            migration_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_tracks_content() {
        assert_eq!(migration_hash("a"), migration_hash("a"));
        assert_ne!(migration_hash("a"), migration_hash("a "));
    }

    #[test]
    fn test_plan_follows_declaration_order() {
        let mut registry = TableRegistry::new();
        declare_ledger(&mut registry).unwrap();
        registry
            .declare_table(
                "accounts",
                None,
                vec![integer("account_id").primary_key(), text("account_type")],
            )
            .unwrap();

        let plan = MigrationRunner::new(&registry).plan().unwrap();
        let tables: Vec<_> = plan.iter().map(|p| p.table.as_str()).collect();
        assert_eq!(tables, ["migrations", "accounts"]);
        for planned in &plan {
            assert_eq!(planned.hash, migration_hash(&planned.ddl));
            assert!(planned.ddl.starts_with("CREATE TABLE "));
        }
    }

    #[test]
    fn test_builder_flags() {
        let registry = TableRegistry::new();
        let runner = MigrationRunner::new(&registry)
            .dry_run(true)
            .ledger_table("schema_ledger");
        assert!(runner.is_dry_run());
        assert_eq!(runner.ledger_table, "schema_ledger");
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MigrationOutcome::Skipped).unwrap(),
            "\"skipped\""
        );
    }
}
