//! Error types for schema declaration and SQL generation.

use thiserror::Error;

/// Errors raised while declaring schemas or rendering SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// Invalid or conflicting table/column declaration.
    #[error("schema error: {0}")]
    Schema(String),

    /// A required clause was missing when the query was rendered.
    #[error("query build error: {0}")]
    QueryBuild(String),

    /// A value cannot be rendered as a SQL literal.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SqlError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub(crate) fn query_build(message: impl Into<String>) -> Self {
        Self::QueryBuild(message.into())
    }

    pub(crate) fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Result type alias for schema and SQL generation.
pub type Result<T> = std::result::Result<T, SqlError>;
