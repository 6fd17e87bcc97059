//! SQL statement builders.
//!
//! Builders accumulate clauses by value (`mut self -> Self`) and render only
//! when [`Query::to_sql`] is called, so a missing clause is reported at
//! render time rather than at the call that forgot it.
//!
//! # Example
//!
//! ```rust
//! use tally_core::builder::{select, Query};
//! use tally_core::expr::eq;
//! use tally_core::{integer, text, TableRegistry};
//!
//! let mut registry = TableRegistry::new();
//! let accounts = registry
//!     .declare_table(
//!         "accounts",
//!         None,
//!         vec![integer("account_id").primary_key(), text("account_type")],
//!     )
//!     .unwrap();
//! let account_id = accounts.column("account_id").unwrap();
//!
//! let sql = select([&account_id])
//!     .from_table(&accounts)
//!     .where_clause([eq(&account_id, 1)])
//!     .limit(10)
//!     .to_sql()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT accounts.account_id FROM accounts WHERE accounts.account_id = 1 LIMIT 10"
//! );
//! ```

mod insert;
mod select;

pub use insert::{insert, Insert};
pub use select::{select, Join, JoinKind, OrderDirection, Projection, Select};

use crate::error::Result;

/// A statement that renders to SQL text.
pub trait Query {
    /// Renders the statement.
    ///
    /// Rendering does not consume the builder; calling it twice yields the
    /// same text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SqlError::QueryBuild`] when a required clause is
    /// missing and [`crate::SqlError::Serialization`] when a literal cannot
    /// be rendered.
    fn to_sql(&self) -> Result<String>;
}
