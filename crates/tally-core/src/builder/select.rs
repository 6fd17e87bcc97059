//! SELECT statement builder.

use std::sync::Arc;

use super::Query;
use crate::column::Column;
use crate::error::{Result, SqlError};
use crate::expr::Expr;
use crate::schema::TableSchema;

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A column or any other expression.
    Expr(Expr),
    /// Every column of a table, `<table>.*`.
    AllColumns(String),
}

impl Projection {
    /// Selects every column of `table`.
    #[must_use]
    pub fn all_columns(table: &TableSchema) -> Self {
        Self::AllColumns(table.name().to_string())
    }

    fn to_sql(&self) -> Result<String> {
        match self {
            Self::Expr(expr) => expr.to_sql(),
            Self::AllColumns(table) => Ok(format!("{table}.*")),
        }
    }
}

impl From<Expr> for Projection {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Column> for Projection {
    fn from(column: Column) -> Self {
        Self::Expr(Expr::Column(column))
    }
}

impl From<&Column> for Projection {
    fn from(column: &Column) -> Self {
        Self::Expr(Expr::from(column))
    }
}

impl From<&TableSchema> for Projection {
    fn from(table: &TableSchema) -> Self {
        Self::all_columns(table)
    }
}

impl From<&Arc<TableSchema>> for Projection {
    fn from(table: &Arc<TableSchema>) -> Self {
        Self::all_columns(table)
    }
}

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `OUTER JOIN`
    Outer,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
}

impl JoinKind {
    /// Returns the SQL keyword preceding `JOIN`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Outer => "OUTER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

/// A join against another table, with AND-ed conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Joined table name.
    pub table: String,
    /// Conditions, AND-ed together.
    pub conditions: Vec<Expr>,
}

impl Join {
    fn to_sql(&self) -> Result<String> {
        if self.conditions.is_empty() {
            return Err(SqlError::query_build(format!(
                "{} JOIN {} has no conditions",
                self.kind.as_sql(),
                self.table
            )));
        }
        Ok(format!(
            "{} JOIN {} ON {}",
            self.kind.as_sql(),
            self.table,
            and_all(&self.conditions)?
        ))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

fn and_all(conditions: &[Expr]) -> Result<String> {
    let rendered = conditions
        .iter()
        .map(Expr::to_sql)
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join(" AND "))
}

/// A SELECT statement builder.
///
/// `where_clause` accumulates conditions across calls; `order_by`, `limit`
/// and `offset` keep only the last value given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    projection: Vec<Projection>,
    from: Option<String>,
    joins: Vec<Join>,
    conditions: Vec<Expr>,
    ordering: Option<(Column, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Starts a SELECT over the given projection list.
#[must_use]
pub fn select<I, P>(projection: I) -> Select
where
    I: IntoIterator<Item = P>,
    P: Into<Projection>,
{
    Select::new(projection)
}

impl Select {
    /// Creates a SELECT over the given projection list.
    #[must_use]
    pub fn new<I, P>(projection: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        Self {
            projection: projection.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the FROM table.
    #[must_use]
    pub fn from_table(mut self, table: &TableSchema) -> Self {
        self.from = Some(table.name().to_string());
        self
    }

    fn join<I>(mut self, kind: JoinKind, table: &TableSchema, on: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.joins.push(Join {
            kind,
            table: table.name().to_string(),
            conditions: on.into_iter().collect(),
        });
        self
    }

    /// Appends an INNER JOIN.
    #[must_use]
    pub fn inner_join(self, table: &TableSchema, on: impl IntoIterator<Item = Expr>) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    /// Appends an OUTER JOIN.
    #[must_use]
    pub fn outer_join(self, table: &TableSchema, on: impl IntoIterator<Item = Expr>) -> Self {
        self.join(JoinKind::Outer, table, on)
    }

    /// Appends a LEFT JOIN.
    #[must_use]
    pub fn left_join(self, table: &TableSchema, on: impl IntoIterator<Item = Expr>) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// Appends a RIGHT JOIN.
    #[must_use]
    pub fn right_join(self, table: &TableSchema, on: impl IntoIterator<Item = Expr>) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    /// Adds conditions to the WHERE clause.
    ///
    /// Conditions from every call are AND-ed together.
    #[must_use]
    pub fn where_clause(mut self, conditions: impl IntoIterator<Item = Expr>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Sets the ordering, replacing any previous one.
    #[must_use]
    pub fn order_by(mut self, column: &Column, direction: OrderDirection) -> Self {
        self.ordering = Some((column.clone(), direction));
        self
    }

    /// Sets LIMIT, replacing any previous value.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets OFFSET, replacing any previous value.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// The projection list.
    #[must_use]
    pub fn projection(&self) -> &[Projection] {
        &self.projection
    }

    /// The FROM table name, if set.
    #[must_use]
    pub fn from_table_name(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Joins in call order.
    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Accumulated WHERE conditions.
    #[must_use]
    pub fn conditions(&self) -> &[Expr] {
        &self.conditions
    }

    /// The active ordering.
    #[must_use]
    pub fn ordering(&self) -> Option<(&Column, OrderDirection)> {
        self.ordering.as_ref().map(|(c, d)| (c, *d))
    }

    /// The LIMIT value.
    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// The OFFSET value.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u64> {
        self.offset
    }
}

impl Query for Select {
    // The ordering is recorded but not rendered, and OFFSET precedes LIMIT:
    // both are part of the established output format.
    fn to_sql(&self) -> Result<String> {
        let from = self
            .from
            .as_deref()
            .ok_or_else(|| SqlError::query_build("from_table() must be set for select()"))?;
        if self.projection.is_empty() {
            return Err(SqlError::query_build("select() needs at least one column"));
        }

        let columns = self
            .projection
            .iter()
            .map(Projection::to_sql)
            .collect::<Result<Vec<_>>>()?;

        let mut sql = String::from("SELECT ");
        sql.push_str(&columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(from);

        if !self.joins.is_empty() {
            let joins = self
                .joins
                .iter()
                .map(Join::to_sql)
                .collect::<Result<Vec<_>>>()?;
            sql.push(' ');
            sql.push_str(&joins.join(" "));
        }

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&and_all(&self.conditions)?);
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(sql)
    }
}
