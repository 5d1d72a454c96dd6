//! Issue query builder and execution primitives
//!
//! This module turns an [`IssueFilter`] into parameterized SQL against the
//! issue table and runs it:
//! - Every filter value is a bound parameter, never part of the SQL text
//! - The only interpolated identifier is the table name, validated up front
//! - Results are bounded by the filter's record limit
//!
//! The store is read-only; nothing here writes issue rows.

mod builder;
mod filter;
mod store;

pub use builder::{BuiltQuery, QueryBuilder, Statement};
pub use filter::IssueFilter;
pub use store::IssueStore;

use miette::Diagnostic;
use thiserror::Error;

/// Default name of the issue table
pub const DEFAULT_ISSUE_TABLE: &str = "accessibility_checker";

/// Errors raised while building or running issue queries
///
/// Configuration problems are fatal and are never retried here.
#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("Invalid issue table name: {name:?}")]
    #[diagnostic(
        code(a11y::query::invalid_table),
        help("table names may only contain ASCII letters, digits and underscores")
    )]
    InvalidTableName { name: String },

    #[error("Issue table does not exist: {name}")]
    #[diagnostic(
        code(a11y::query::missing_table),
        help("run `a11y init` or check `issue_table` in .a11y/config.yaml")
    )]
    MissingTable { name: String },

    #[error("Database error: {0}")]
    #[diagnostic(code(a11y::query::sqlite))]
    Sqlite(#[from] rusqlite::Error),
}

impl QueryError {
    /// Whether this error comes from a misconfigured storage target
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidTableName { .. } | QueryError::MissingTable { .. }
        )
    }
}

/// A table name that is safe to place in SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: &str) -> Result<Self, QueryError> {
        let valid = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(QueryError::InvalidTableName {
                name: name.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_ISSUE_TABLE.to_string())
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests;
