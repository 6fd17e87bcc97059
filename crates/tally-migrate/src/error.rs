//! Error types for connections and the migration system.

use tally_core::SqlError;

/// Errors that can occur while talking to the database or migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Schema, query-building or literal rendering error.
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// The connection could not be established or is not open.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected a statement.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The ledger table does not exist while migrating another table.
    #[error("Ledger table '{ledger}' does not exist; refusing to migrate '{table}'")]
    LedgerMissing {
        /// The ledger table name.
        ledger: String,
        /// The table being migrated.
        table: String,
    },

    /// The ledger table is not declared in the registry.
    #[error("Ledger table '{0}' is not declared in the registry")]
    LedgerNotDeclared(String),

    /// A ledger row is missing a column or has the wrong type.
    #[error("Invalid ledger row: {0}")]
    InvalidLedgerRow(String),

    /// Serialization error (JSON output).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for connection and migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
