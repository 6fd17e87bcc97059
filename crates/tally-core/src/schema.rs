//! Table schemas and the table registry.
//!
//! Tables are declared explicitly against a [`TableRegistry`]. Declaration
//! validates the column set, binds every column to its table and freezes the
//! result into an immutable [`TableSchema`] shared through an `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::column::{Column, ColumnDef};
use crate::error::{Result, SqlError};

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `UNIQUE (<columns>)`
    Unique(Vec<String>),
}

impl Constraint {
    /// Returns the SQL representation used inside `CREATE TABLE`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Unique(columns) => format!("UNIQUE ({})", columns.join(", ")),
        }
    }

    fn columns(&self) -> &[String] {
        match self {
            Self::Unique(columns) => columns,
        }
    }
}

/// A table declaration, consumed by [`TableRegistry::declare`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    name: String,
    primary_key: Option<String>,
    columns: Vec<ColumnDef>,
    constraints: Vec<Constraint>,
}

impl TableDef {
    /// Starts a declaration for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Names the primary-key column.
    ///
    /// The name is checked against the column flagged with
    /// [`ColumnDef::primary_key`]; if no column carries the flag, the named
    /// column becomes the primary key.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds several columns, in order.
    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Adds a `UNIQUE` constraint over `columns`.
    #[must_use]
    pub fn unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.push(Constraint::Unique(
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// The immutable schema of a declared table.
#[derive(Debug, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<String>,
    constraints: Vec<Constraint>,
}

impl TableSchema {
    fn from_def(def: TableDef) -> Result<Self> {
        let TableDef {
            name,
            primary_key: declared_pk,
            mut columns,
            constraints,
        } = def;

        if name.is_empty() {
            return Err(SqlError::schema("table name must not be empty"));
        }
        if columns.is_empty() {
            return Err(SqlError::schema(format!(
                "table '{name}' declares no columns"
            )));
        }

        let mut seen: HashSet<String> = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.clone()) {
                return Err(SqlError::schema(format!(
                    "column '{}' is declared twice on table '{name}'",
                    column.name
                )));
            }
        }

        let mut flagged: Option<String> = None;
        for column in columns.iter().filter(|c| c.primary_key) {
            if let Some(first) = &flagged {
                return Err(SqlError::schema(format!(
                    "table '{name}' has more than one primary key: '{first}' and '{}'",
                    column.name
                )));
            }
            flagged = Some(column.name.clone());
        }

        let primary_key = match (declared_pk, flagged) {
            (Some(declared), Some(flagged)) if declared != flagged => {
                return Err(SqlError::schema(format!(
                    "table '{name}' names '{declared}' as primary key but '{flagged}' is flagged"
                )));
            }
            (Some(declared), None) => {
                let column = columns
                    .iter_mut()
                    .find(|c| c.name == declared)
                    .ok_or_else(|| {
                        SqlError::schema(format!(
                            "primary key '{declared}' is not a column of table '{name}'"
                        ))
                    })?;
                column.primary_key = true;
                Some(declared)
            }
            (_, flagged) => flagged,
        };

        if let Some(pk) = &primary_key {
            if columns.iter().any(|c| &c.name == pk && c.nullable) {
                return Err(SqlError::schema(format!(
                    "primary key '{name}.{pk}' cannot be nullable"
                )));
            }
        }

        for constraint in &constraints {
            if constraint.columns().is_empty() {
                return Err(SqlError::schema(format!(
                    "constraint on table '{name}' names no columns"
                )));
            }
            if let Some(missing) = constraint.columns().iter().find(|c| !seen.contains(*c)) {
                return Err(SqlError::schema(format!(
                    "constraint names unknown column '{missing}' on table '{name}'"
                )));
            }
        }

        let columns = columns
            .into_iter()
            .map(|def| Column::bind(&name, def))
            .collect();

        Ok(Self {
            name,
            columns,
            primary_key,
            constraints,
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Name of the primary-key column, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Table-level constraints.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns a handle to the named column.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Schema`] if the table has no such column.
    pub fn column(&self, name: &str) -> Result<Column> {
        self.get_column(name).cloned().ok_or_else(|| {
            SqlError::schema(format!("table '{}' has no column '{name}'", self.name))
        })
    }
}

/// Every table declared by the application, in declaration order.
///
/// Populate it during startup, before any concurrent work begins; after that
/// it is only read.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: IndexMap<String, Arc<TableSchema>>,
}

impl TableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a table declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Schema`] if the name is already registered or the
    /// declaration is invalid.
    pub fn declare(&mut self, def: TableDef) -> Result<Arc<TableSchema>> {
        if self.tables.contains_key(&def.name) {
            return Err(SqlError::schema(format!(
                "table '{}' is already declared",
                def.name
            )));
        }
        let schema = Arc::new(TableSchema::from_def(def)?);
        self.tables
            .insert(schema.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Declares a table from its name, optional primary-key name and columns.
    ///
    /// # Errors
    ///
    /// See [`TableRegistry::declare`].
    pub fn declare_table(
        &mut self,
        name: &str,
        primary_key: Option<&str>,
        columns: Vec<ColumnDef>,
    ) -> Result<Arc<TableSchema>> {
        let mut def = TableDef::new(name).columns(columns);
        if let Some(pk) = primary_key {
            def = def.primary_key(pk);
        }
        self.declare(def)
    }

    /// Returns the schema registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<TableSchema>> {
        self.tables.get(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Iterates over schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.tables.values()
    }

    /// Number of declared tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, text, timestamp};

    #[test]
    fn test_declare_derives_primary_key() {
        let mut registry = TableRegistry::new();
        let accounts = registry
            .declare_table(
                "accounts",
                None,
                vec![integer("account_id").primary_key(), text("account_type")],
            )
            .unwrap();
        assert_eq!(accounts.primary_key(), Some("account_id"));
        assert_eq!(accounts.columns().len(), 2);
        assert_eq!(accounts.columns()[1].table_name(), "accounts");
    }

    #[test]
    fn test_declared_primary_key_corroborates_flag() {
        let mut registry = TableRegistry::new();
        let schema = registry
            .declare_table(
                "accounts",
                Some("account_id"),
                vec![integer("account_id").primary_key()],
            )
            .unwrap();
        assert_eq!(schema.primary_key(), Some("account_id"));
    }

    #[test]
    fn test_declared_primary_key_marks_column() {
        let mut registry = TableRegistry::new();
        let schema = registry
            .declare_table("accounts", Some("account_id"), vec![integer("account_id")])
            .unwrap();
        assert!(schema.column("account_id").unwrap().is_primary_key());
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        let mut registry = TableRegistry::new();
        let result = registry.declare_table(
            "accounts",
            None,
            vec![integer("a").primary_key(), integer("b").primary_key()],
        );
        assert!(matches!(result, Err(SqlError::Schema(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_conflicting_primary_key_name_rejected() {
        let mut registry = TableRegistry::new();
        let result = registry.declare_table(
            "accounts",
            Some("b"),
            vec![integer("a").primary_key(), integer("b")],
        );
        assert!(matches!(result, Err(SqlError::Schema(_))));

        let result =
            registry.declare_table("accounts", Some("missing"), vec![integer("a")]);
        assert!(matches!(result, Err(SqlError::Schema(_))));
    }

    #[test]
    fn test_redeclaration_rejected() {
        let mut registry = TableRegistry::new();
        registry
            .declare_table("accounts", None, vec![integer("account_id")])
            .unwrap();
        let again = registry.declare_table("accounts", None, vec![integer("account_id")]);
        assert!(matches!(again, Err(SqlError::Schema(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_declarations() {
        let mut registry = TableRegistry::new();
        assert!(registry.declare_table("empty", None, vec![]).is_err());
        assert!(registry
            .declare_table("dup", None, vec![text("a"), text("a")])
            .is_err());
        assert!(registry
            .declare_table("nullable_pk", None, vec![integer("id").primary_key().nullable()])
            .is_err());
        assert!(registry
            .declare(TableDef::new("bad_unique").column(text("a")).unique(["b"]))
            .is_err());
    }

    #[test]
    fn test_registry_preserves_declaration_order() {
        let mut registry = TableRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .declare_table(name, None, vec![timestamp("at")])
                .unwrap();
        }
        let names: Vec<&str> = registry.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert!(registry.contains("alpha"));
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_unknown_column_lookup() {
        let mut registry = TableRegistry::new();
        let schema = registry
            .declare_table("accounts", None, vec![integer("account_id")])
            .unwrap();
        assert!(schema.get_column("nope").is_none());
        assert!(matches!(schema.column("nope"), Err(SqlError::Schema(_))));
    }

    #[test]
    fn test_unique_constraint_sql() {
        let constraint = Constraint::Unique(vec!["a".into(), "b".into()]);
        assert_eq!(constraint.to_sql(), "UNIQUE (a, b)");
    }
}
