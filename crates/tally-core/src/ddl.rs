//! `CREATE TABLE` generation.
//!
//! The output is a pure function of the schema. The migration runner hashes
//! it to decide whether a table has changed, so any change to the layout
//! below is a change of every table's identity.

use crate::builder::Query;
use crate::column::{Column, ColumnDefault};
use crate::error::Result;
use crate::schema::TableSchema;

const INDENT: &str = "    ";

fn column_definition(column: &Column) -> Result<String> {
    let sql_type = if column.is_primary_key() {
        column.column_type().primary_key_sql_type()
    } else {
        column.column_type().sql_type()
    };
    let nullability = if column.is_nullable() { "NULL" } else { "NOT NULL" };

    let mut sql = format!("{} {sql_type} {nullability}", column.name());
    if column.is_primary_key() {
        sql.push_str(" PRIMARY KEY");
    }
    match column.default() {
        ColumnDefault::Unset => {}
        ColumnDefault::Null => sql.push_str(" DEFAULT NULL"),
        ColumnDefault::Value(literal) => {
            sql.push_str(" DEFAULT ");
            sql.push_str(&literal.to_sql()?);
        }
        ColumnDefault::Function(function) => {
            sql.push_str(" DEFAULT ");
            sql.push_str(function.as_sql());
        }
    }
    Ok(sql)
}

/// Generates the `CREATE TABLE` statement for `table`.
///
/// ```text
/// CREATE TABLE accounts (
///     account_id SERIAL NOT NULL PRIMARY KEY,
///     account_type TEXT NOT NULL
/// );
/// ```
///
/// # Errors
///
/// Returns [`crate::SqlError::Serialization`] if a literal default cannot be
/// rendered.
pub fn generate_up_migration(table: &TableSchema) -> Result<String> {
    let mut lines = table
        .columns()
        .iter()
        .map(column_definition)
        .collect::<Result<Vec<_>>>()?;
    lines.extend(table.constraints().iter().map(|c| c.to_sql()));

    let body = lines
        .iter()
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join(",\n");

    Ok(format!("CREATE TABLE {} (\n{body}\n);", table.name()))
}

/// The `CREATE TABLE` statement of a declared table, as a [`Query`].
#[derive(Debug, Clone, Copy)]
pub struct CreateTable<'a> {
    table: &'a TableSchema,
}

impl<'a> CreateTable<'a> {
    /// Wraps `table`.
    #[must_use]
    pub const fn new(table: &'a TableSchema) -> Self {
        Self { table }
    }
}

impl Query for CreateTable<'_> {
    fn to_sql(&self) -> Result<String> {
        generate_up_migration(self.table)
    }
}
