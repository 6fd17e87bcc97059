//! Server-side SQL functions usable as column defaults.

/// A function evaluated by the database server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFunction {
    /// `NOW()`
    Now,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
}

impl SqlFunction {
    /// Returns the SQL spelling of the function call.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Now => "NOW()",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }
}
