//! SQL literals and untyped row values.
//!
//! `Literal` is the only value kind that can appear inside an expression
//! tree. `SqlValue` is what a connection hands back for a row cell; it is
//! wider than `Literal` and converts into one only for the supported kinds.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Result, SqlError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A literal value rendered inline into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer value.
    Integer(i64),
    /// Text value.
    Text(String),
    /// Floating-point value.
    Float(f64),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
}

impl Literal {
    /// Returns the inline SQL representation.
    ///
    /// Text is single-quoted with embedded quotes doubled, timestamps are
    /// single-quoted ISO-8601, numbers are bare.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Serialization`] for NaN or infinite floats, which
    /// have no numeric SQL spelling.
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Self::Integer(n) => Ok(n.to_string()),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                Ok(format!("'{escaped}'"))
            }
            Self::Float(f) => {
                if f.is_finite() {
                    // Debug keeps the fractional part ("1.0", not "1")
                    Ok(format!("{f:?}"))
                } else {
                    Err(SqlError::serialization(format!(
                        "float literal {f} has no SQL representation"
                    )))
                }
            }
            Self::Timestamp(ts) => Ok(format!("'{}'", ts.format(TIMESTAMP_FORMAT))),
        }
    }

    /// Returns a short name for the literal kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Float(_) => "float",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

macro_rules! literal_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )+
    };
}

literal_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value.naive_utc())
    }
}

/// An untyped value read back from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Timestamp value.
    Timestamp(NaiveDateTime),
    /// Binary value.
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp payload, if any.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Literal> for SqlValue {
    fn from(value: Literal) -> Self {
        match value {
            Literal::Integer(n) => Self::Integer(n),
            Literal::Text(s) => Self::Text(s),
            Literal::Float(f) => Self::Float(f),
            Literal::Timestamp(ts) => Self::Timestamp(ts),
        }
    }
}

impl TryFrom<SqlValue> for Literal {
    type Error = SqlError;

    fn try_from(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Integer(n) => Ok(Self::Integer(n)),
            SqlValue::Text(s) => Ok(Self::Text(s)),
            SqlValue::Float(f) => Ok(Self::Float(f)),
            SqlValue::Timestamp(ts) => Ok(Self::Timestamp(ts)),
            SqlValue::Null => Err(SqlError::serialization("NULL is not a literal value")),
            SqlValue::Bool(_) => Err(SqlError::serialization(
                "boolean values are not supported as literals",
            )),
            SqlValue::Bytes(_) => Err(SqlError::serialization(
                "binary values are not supported as literals",
            )),
        }
    }
}
