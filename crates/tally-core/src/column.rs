//! Column declarations and column handles.
//!
//! A [`ColumnDef`] is the declaration a caller hands to the registry. Once
//! the table is declared, each definition becomes a [`Column`]: an immutable
//! handle that knows its table and can be shared by any number of
//! expression trees.

use std::fmt;
use std::sync::Arc;

use crate::function::SqlFunction;
use crate::value::Literal;

/// The declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Integer column.
    Integer,
    /// Text column.
    Text,
    /// Floating-point column.
    Float,
    /// Timestamp column.
    Timestamp,
}

impl ColumnType {
    /// Returns the SQL type token.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Float => "FLOAT",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Returns the type token used when the column is the primary key.
    ///
    /// Integer keys become auto-incrementing; other kinds keep their type.
    #[must_use]
    pub const fn primary_key_sql_type(self) -> &'static str {
        match self {
            Self::Integer => "SERIAL",
            other => other.sql_type(),
        }
    }
}

/// The default of a column, as declared.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnDefault {
    /// No default was declared.
    #[default]
    Unset,
    /// `DEFAULT NULL`.
    Null,
    /// A literal default.
    Value(Literal),
    /// A server-side function default.
    Function(SqlFunction),
}

impl ColumnDefault {
    /// Returns true if a default was explicitly declared.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

/// A column declaration, consumed when its table is declared.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared kind.
    pub column_type: ColumnType,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Declared default.
    pub default: ColumnDefault,
}

impl ColumnDef {
    /// Creates a non-null column without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            nullable: false,
            default: ColumnDefault::Unset,
        }
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declares `DEFAULT NULL`.
    #[must_use]
    pub fn default_null(mut self) -> Self {
        self.default = ColumnDefault::Null;
        self
    }

    /// Declares a literal default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Literal>) -> Self {
        self.default = ColumnDefault::Value(value.into());
        self
    }

    /// Declares a server-side function default.
    #[must_use]
    pub fn default_function(mut self, function: SqlFunction) -> Self {
        self.default = ColumnDefault::Function(function);
        self
    }
}

/// Declares an integer column.
#[must_use]
pub fn integer(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Integer)
}

/// Declares a text column.
#[must_use]
pub fn text(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Text)
}

/// Declares a floating-point column.
#[must_use]
pub fn float(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Float)
}

/// Declares a timestamp column.
#[must_use]
pub fn timestamp(name: impl Into<String>) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Timestamp)
}

#[derive(Debug, PartialEq)]
struct ColumnInner {
    table: String,
    def: ColumnDef,
}

/// A declared column, bound to its table.
///
/// Cloning is cheap and every clone refers to the same declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

impl Column {
    pub(crate) fn bind(table: &str, def: ColumnDef) -> Self {
        Self {
            inner: Arc::new(ColumnInner {
                table: String::from(table),
                def,
            }),
        }
    }

    /// Name of the owning table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.inner.table
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.def.name
    }

    /// Declared kind.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.inner.def.column_type
    }

    /// Whether this column is the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.inner.def.primary_key
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.inner.def.nullable
    }

    /// Declared default.
    #[must_use]
    pub fn default(&self) -> &ColumnDefault {
        &self.inner.def.default
    }

    /// Returns the qualified reference, `<table>.<column>`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("{}.{}", self.table_name(), self.name())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table_name(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder_defaults() {
        let def = text("account_type");
        assert!(!def.nullable);
        assert!(!def.primary_key);
        assert_eq!(def.default, ColumnDefault::Unset);
    }

    #[test]
    fn test_column_builder_chain() {
        let def = timestamp("updated_at").nullable().default_null();
        assert!(def.nullable);
        assert_eq!(def.default, ColumnDefault::Null);

        let def = timestamp("created_at").default_function(SqlFunction::Now);
        assert_eq!(def.default, ColumnDefault::Function(SqlFunction::Now));

        let def = integer("retries").default_value(3);
        assert_eq!(def.default, ColumnDefault::Value(Literal::Integer(3)));
    }

    #[test]
    fn test_column_reference() {
        let column = Column::bind("accounts", integer("account_id").primary_key());
        assert_eq!(column.to_sql(), "accounts.account_id");
        assert_eq!(column.to_string(), "accounts.account_id");
        assert!(column.is_primary_key());
    }

    #[test]
    fn test_primary_key_type_substitution() {
        assert_eq!(ColumnType::Integer.primary_key_sql_type(), "SERIAL");
        assert_eq!(ColumnType::Text.primary_key_sql_type(), "TEXT");
    }
}
