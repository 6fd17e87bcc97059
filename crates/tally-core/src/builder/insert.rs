//! INSERT statement builder.

use super::Query;
use crate::column::Column;
use crate::error::{Result, SqlError};
use crate::schema::TableSchema;
use crate::value::Literal;

/// An INSERT statement builder for a single row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Insert {
    table: Option<String>,
    values: Vec<(Column, Literal)>,
}

/// Starts an INSERT.
#[must_use]
pub fn insert() -> Insert {
    Insert::new()
}

impl Insert {
    /// Creates an empty INSERT builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target table.
    #[must_use]
    pub fn into_table(mut self, table: &TableSchema) -> Self {
        self.table = Some(table.name().to_string());
        self
    }

    /// Sets the row to insert, replacing any previous values.
    ///
    /// Columns and values render in the order given.
    #[must_use]
    pub fn values<'a, I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (&'a Column, Literal)>,
    {
        self.values = values
            .into_iter()
            .map(|(column, value)| (column.clone(), value))
            .collect();
        self
    }

    /// The target table name, if set.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The column/value pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(Column, Literal)] {
        &self.values
    }
}

impl Query for Insert {
    fn to_sql(&self) -> Result<String> {
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| SqlError::query_build("into_table() must be set for insert()"))?;
        if self.values.is_empty() {
            return Err(SqlError::query_build(format!(
                "insert into '{table}' has no values"
            )));
        }
        if let Some((column, _)) = self.values.iter().find(|(c, _)| c.table_name() != table) {
            return Err(SqlError::query_build(format!(
                "column '{column}' does not belong to table '{table}'"
            )));
        }

        let columns: Vec<&str> = self.values.iter().map(|(c, _)| c.name()).collect();
        let literals = self
            .values
            .iter()
            .map(|(_, v)| v.to_sql())
            .collect::<Result<Vec<_>>>()?;

        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            literals.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::column::{float, integer, text};
    use crate::schema::TableRegistry;

    fn tables() -> (Arc<TableSchema>, Arc<TableSchema>) {
        let mut registry = TableRegistry::new();
        let accounts = registry
            .declare_table(
                "accounts",
                None,
                vec![integer("account_id").primary_key(), text("account_type")],
            )
            .unwrap();
        let payments = registry
            .declare_table(
                "payments",
                None,
                vec![integer("payment_id").primary_key(), float("amount")],
            )
            .unwrap();
        (accounts, payments)
    }

    #[test]
    fn test_simple_insert() {
        let (accounts, _) = tables();
        let id = accounts.column("account_id").unwrap();
        let kind = accounts.column("account_type").unwrap();
        let sql = insert()
            .into_table(&accounts)
            .values([(&kind, "savings".into()), (&id, 7.into())])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO accounts (account_type, account_id) VALUES ('savings', 7)"
        );
    }

    #[test]
    fn test_values_replace() {
        let (accounts, _) = tables();
        let kind = accounts.column("account_type").unwrap();
        let sql = insert()
            .into_table(&accounts)
            .values([(&kind, "first".into())])
            .values([(&kind, "second".into())])
            .to_sql()
            .unwrap();
        assert_eq!(sql, "INSERT INTO accounts (account_type) VALUES ('second')");
    }

    #[test]
    fn test_text_is_escaped() {
        let (accounts, _) = tables();
        let kind = accounts.column("account_type").unwrap();
        let sql = insert()
            .into_table(&accounts)
            .values([(&kind, "it's".into())])
            .to_sql()
            .unwrap();
        assert_eq!(sql, "INSERT INTO accounts (account_type) VALUES ('it''s')");
    }

    #[test]
    fn test_missing_table_fails() {
        let (accounts, _) = tables();
        let kind = accounts.column("account_type").unwrap();
        let query = insert().values([(&kind, "x".into())]);
        assert!(matches!(query.to_sql(), Err(SqlError::QueryBuild(_))));
    }

    #[test]
    fn test_empty_values_fail() {
        let (accounts, _) = tables();
        let query = insert().into_table(&accounts);
        assert!(matches!(query.to_sql(), Err(SqlError::QueryBuild(_))));
    }

    #[test]
    fn test_foreign_column_fails() {
        let (accounts, payments) = tables();
        let amount = payments.column("amount").unwrap();
        let query = insert()
            .into_table(&accounts)
            .values([(&amount, 1.5.into())]);
        assert!(matches!(query.to_sql(), Err(SqlError::QueryBuild(_))));
    }
}
