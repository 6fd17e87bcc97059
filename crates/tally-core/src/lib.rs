//! # tally-core
//!
//! Typed table schemas, SQL expression trees and statement builders.
//!
//! This crate provides:
//! - Column declarations and an explicit [`TableRegistry`]
//! - An expression tree built with plain functions (`eq`, `add`, ...)
//! - SELECT and INSERT builders rendering deterministic SQL text
//! - `CREATE TABLE` generation from a declared schema
//!
//! It performs no I/O; executing the SQL is the job of a connection.
//!
//! ## Example
//!
//! ```rust
//! use tally_core::builder::{select, Projection, Query};
//! use tally_core::expr::eq;
//! use tally_core::{float, integer, TableRegistry};
//!
//! let mut registry = TableRegistry::new();
//! let accounts = registry
//!     .declare_table("accounts", None, vec![integer("account_id").primary_key()])
//!     .unwrap();
//! let payments = registry
//!     .declare_table(
//!         "payments",
//!         None,
//!         vec![integer("payment_id").primary_key(), integer("account_id"), float("amount")],
//!     )
//!     .unwrap();
//!
//! let account_id = accounts.column("account_id").unwrap();
//! let payment_account = payments.column("account_id").unwrap();
//!
//! let sql = select([Projection::from(&account_id), Projection::from(&payments)])
//!     .from_table(&accounts)
//!     .left_join(&payments, [eq(&account_id, &payment_account)])
//!     .to_sql()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT accounts.account_id, payments.* FROM accounts \
//!      LEFT JOIN payments ON accounts.account_id = payments.account_id"
//! );
//! ```

pub mod builder;
pub mod column;
pub mod ddl;
mod error;
pub mod expr;
pub mod function;
pub mod schema;
pub mod value;

pub use builder::{insert, select, Insert, OrderDirection, Query, Select};
pub use column::{float, integer, text, timestamp, Column, ColumnDef, ColumnDefault, ColumnType};
pub use ddl::{generate_up_migration, CreateTable};
pub use error::{Result, SqlError};
pub use expr::Expr;
pub use function::SqlFunction;
pub use schema::{Constraint, TableDef, TableRegistry, TableSchema};
pub use value::{Literal, SqlValue};
