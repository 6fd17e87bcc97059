//! Expression trees.
//!
//! Expressions are built with plain functions (`eq`, `add`, `like`, ...)
//! rather than operator overloading. Every operand is `impl Into<Expr>`, so
//! bare integers, floats, strings and timestamps are promoted to
//! [`Literal`]s at construction time. Nodes are never mutated after they are
//! built; cloning an expression to reuse it in another clause is cheap for
//! column references and safe for everything else.
//!
//! ```rust
//! use tally_core::expr::{add, eq};
//! use tally_core::{integer, TableRegistry};
//!
//! let mut registry = TableRegistry::new();
//! let accounts = registry
//!     .declare_table("accounts", None, vec![integer("account_id").primary_key()])
//!     .unwrap();
//! let account_id = accounts.column("account_id").unwrap();
//!
//! assert_eq!(eq(&account_id, 1).to_sql().unwrap(), "accounts.account_id = 1");
//! assert_eq!(add(&account_id, 2.5).to_sql().unwrap(), "accounts.account_id + 2.5");
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::column::Column;
use crate::error::{Result, SqlError};
use crate::value::Literal;

/// Operators taking a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation.
    Neg,
    /// Unary plus.
    Pos,
    /// Bitwise not.
    Invert,
    /// Null check.
    IsNull,
    /// Negated null check.
    IsNotNull,
}

impl UnaryOperator {
    /// Returns the SQL token.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Pos => "+",
            Self::Invert => "~",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Returns true if the token follows the operand.
    #[must_use]
    pub const fn is_postfix(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// Operators taking two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Modulo.
    Mod,
    /// Exponentiation.
    Pow,
    /// Floor division.
    FloorDiv,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Set membership.
    In,
    /// Negated set membership.
    NotIn,
    /// Pattern match.
    Like,
    /// Negated pattern match.
    NotLike,
    /// Case-insensitive pattern match.
    ILike,
    /// Negated case-insensitive pattern match.
    NotILike,
    /// Range check.
    Between,
    /// Negated range check.
    NotBetween,
}

impl BinaryOperator {
    /// Returns the SQL token.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::FloorDiv => "//",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
        }
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Inline literal.
    Literal(Literal),
    /// Qualified column reference.
    Column(Column),
    /// Unary operation.
    Unary {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        operand: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// The operator.
        op: BinaryOperator,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Parenthesised list, the right operand of `IN`.
    List(Vec<Expr>),
    /// Bounds of a `BETWEEN`.
    Range {
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
    },
}

impl Expr {
    /// Builds a unary node.
    #[must_use]
    pub fn unary(op: UnaryOperator, operand: impl Into<Self>) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand.into()),
        }
    }

    /// Builds a binary node.
    #[must_use]
    pub fn binary(op: BinaryOperator, left: impl Into<Self>, right: impl Into<Self>) -> Self {
        Self::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    /// Renders the expression as SQL text.
    ///
    /// Nested operations are written out flat, without parentheses, so the
    /// database applies its own operator precedence: `mul(add(a, 1), 3)`
    /// renders as `a + 1 * 3`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Serialization`] if a literal in the tree cannot be
    /// rendered and [`SqlError::QueryBuild`] for an empty `IN` list.
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Self::Literal(literal) => literal.to_sql(),
            Self::Column(column) => Ok(column.to_sql()),
            Self::Unary { op, operand } => {
                let operand = operand.to_sql()?;
                if op.is_postfix() {
                    Ok(format!("{operand} {}", op.as_sql()))
                } else {
                    Ok(format!("{}{operand}", op.as_sql()))
                }
            }
            Self::Binary { op, left, right } => Ok(format!(
                "{} {} {}",
                left.to_sql()?,
                op.as_sql(),
                right.to_sql()?
            )),
            Self::List(items) => {
                if items.is_empty() {
                    return Err(SqlError::query_build("IN list must not be empty"));
                }
                let items = items.iter().map(Self::to_sql).collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", items.join(", ")))
            }
            Self::Range { low, high } => Ok(format!("{} AND {}", low.to_sql()?, high.to_sql()?)),
        }
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<&Column> for Expr {
    fn from(column: &Column) -> Self {
        Self::Column(column.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! expr_from_scalar {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Literal(Literal::from(value))
                }
            }
        )+
    };
}

expr_from_scalar!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    NaiveDateTime,
    DateTime<Utc>
);

/// `-<operand>`
#[must_use]
pub fn neg(operand: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOperator::Neg, operand)
}

/// `+<operand>`
#[must_use]
pub fn pos(operand: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOperator::Pos, operand)
}

/// `~<operand>`
#[must_use]
pub fn invert(operand: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOperator::Invert, operand)
}

/// `<operand> IS NULL`
#[must_use]
pub fn is_null(operand: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOperator::IsNull, operand)
}

/// `<operand> IS NOT NULL`
#[must_use]
pub fn is_not_null(operand: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOperator::IsNotNull, operand)
}

macro_rules! binary_constructors {
    ($($(#[$doc:meta])* $name:ident => $op:ident;)+) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
                Expr::binary(BinaryOperator::$op, left, right)
            }
        )+
    };
}

binary_constructors! {
    /// `<left> + <right>`
    add => Add;
    /// `<left> - <right>`
    sub => Sub;
    /// `<left> * <right>`
    mul => Mul;
    /// `<left> / <right>`
    div => Div;
    /// `<left> % <right>`
    modulo => Mod;
    /// `<left> ** <right>`
    ///
    /// PostgreSQL has no `**` operator; use `power()` there.
    pow => Pow;
    /// `<left> // <right>`
    ///
    /// PostgreSQL has no `//` operator; use `div()` there.
    floor_div => FloorDiv;
    /// `<left> = <right>`
    eq => Eq;
    /// `<left> != <right>`
    ne => Ne;
    /// `<left> > <right>`
    gt => Gt;
    /// `<left> >= <right>`
    ge => Ge;
    /// `<left> < <right>`
    lt => Lt;
    /// `<left> <= <right>`
    le => Le;
    /// `<left> LIKE <right>`
    like => Like;
    /// `<left> NOT LIKE <right>`
    not_like => NotLike;
    /// `<left> ILIKE <right>`
    ilike => ILike;
    /// `<left> NOT ILIKE <right>`
    not_ilike => NotILike;
}

/// `<left> IN (<v1>, <v2>, ...)`
#[must_use]
pub fn in_list<I, T>(left: impl Into<Expr>, values: I) -> Expr
where
    I: IntoIterator<Item = T>,
    T: Into<Expr>,
{
    let list = Expr::List(values.into_iter().map(Into::into).collect());
    Expr::binary(BinaryOperator::In, left, list)
}

/// `<left> NOT IN (<v1>, <v2>, ...)`
#[must_use]
pub fn not_in_list<I, T>(left: impl Into<Expr>, values: I) -> Expr
where
    I: IntoIterator<Item = T>,
    T: Into<Expr>,
{
    let list = Expr::List(values.into_iter().map(Into::into).collect());
    Expr::binary(BinaryOperator::NotIn, left, list)
}

fn range(low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
    Expr::Range {
        low: Box::new(low.into()),
        high: Box::new(high.into()),
    }
}

/// `<operand> BETWEEN <low> AND <high>`
#[must_use]
pub fn between(operand: impl Into<Expr>, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOperator::Between, operand, range(low, high))
}

/// `<operand> NOT BETWEEN <low> AND <high>`
#[must_use]
pub fn not_between(
    operand: impl Into<Expr>,
    low: impl Into<Expr>,
    high: impl Into<Expr>,
) -> Expr {
    Expr::binary(BinaryOperator::NotBetween, operand, range(low, high))
}
