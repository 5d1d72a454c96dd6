//! SQL generation for issue filters

use rusqlite::types::Value;

use super::{IssueFilter, TableName};
use crate::core::issue::IgnoreMode;

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Translates filters into queries against one site's issues
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: TableName,
    site_id: i64,
}

impl QueryBuilder {
    pub fn new(table: TableName, site_id: i64) -> Self {
        Self { table, site_id }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn site_id(&self) -> i64 {
        self.site_id
    }

    /// Build the WHERE clauses for a filter
    pub fn build(&self, filter: &IssueFilter) -> BuiltQuery {
        let filter = filter.normalized();

        // Site, ignore and post type clauses form the scope used for
        // truncation checks; rule clauses narrow it further.
        let mut scope = Vec::new();
        let mut scope_params = Vec::new();

        scope.push("site_id = ?".to_string());
        scope_params.push(Value::Integer(self.site_id));

        match filter.ignore_mode {
            IgnoreMode::ExcludeIgnored => {
                scope.push("ignored = 0 AND ignored_globally = 0".to_string());
            }
            IgnoreMode::IncludeIgnored => {}
            IgnoreMode::OnlyIgnored => {
                scope.push("(ignored = 1 OR ignored_globally = 1)".to_string());
            }
        }

        if !filter.include_all_post_types {
            if filter.post_types.is_empty() {
                scope.push("1 = 0".to_string());
            } else {
                scope.push(in_clause("post_type", filter.post_types.len()));
                scope_params.extend(filter.post_types.iter().cloned().map(Value::Text));
            }
        }

        let mut clauses = scope.clone();
        let mut params = scope_params.clone();

        let rule_types: Vec<&str> = filter
            .rule_types
            .iter()
            .filter(|t| t.is_stored())
            .map(|t| t.as_str())
            .collect();
        if !rule_types.is_empty() {
            clauses.push(in_clause("rule_type", rule_types.len()));
            params.extend(rule_types.into_iter().map(|t| Value::Text(t.to_string())));
        }

        if !filter.rule_slugs.is_empty() {
            clauses.push(in_clause("rule_slug", filter.rule_slugs.len()));
            params.extend(filter.rule_slugs.iter().cloned().map(Value::Text));
        }

        BuiltQuery {
            table: self.table.clone(),
            where_sql: clauses.join(" AND "),
            params,
            scope_sql: scope.join(" AND "),
            scope_params,
            limit: clamp_limit(filter.record_limit),
        }
    }
}

/// A filter compiled against a specific table and site
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    table: TableName,
    where_sql: String,
    params: Vec<Value>,
    scope_sql: String,
    scope_params: Vec<Value>,
    limit: i64,
}

impl BuiltQuery {
    /// Full WHERE clause (without the keyword)
    pub fn where_sql(&self) -> &str {
        &self.where_sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows matching the filter, bounded by the record limit
    pub fn count(&self) -> Statement {
        self.bounded(|inner| format!("SELECT COUNT(*) FROM ({})", inner), "id")
    }

    /// Distinct (rule_slug, object) pairs among the bounded rows
    pub fn distinct_count(&self) -> Statement {
        self.bounded(
            |inner| {
                format!(
                    "SELECT COUNT(*) FROM (SELECT DISTINCT rule_slug, object FROM ({}))",
                    inner
                )
            },
            "rule_slug, object",
        )
    }

    /// Distinct post ids among the bounded rows
    pub fn distinct_post_count(&self) -> Statement {
        self.bounded(
            |inner| format!("SELECT COUNT(DISTINCT post_id) FROM ({})", inner),
            "post_id",
        )
    }

    /// Matching ids in ascending order, bounded by the record limit
    pub fn ids(&self) -> Statement {
        self.bounded(|inner| inner, "id")
    }

    /// Full matching rows in ascending id order, bounded by the record limit
    pub fn records(&self) -> Statement {
        self.bounded(
            |inner| inner,
            "id, site_id, post_id, post_type, rule_slug, rule_type, object, ignored, ignored_globally",
        )
    }

    /// Unbounded count over the site, ignore and post type scope
    pub fn scope_count(&self) -> Statement {
        Statement {
            sql: format!(
                "SELECT COUNT(*) FROM {} WHERE {}",
                self.table, self.scope_sql
            ),
            params: self.scope_params.clone(),
        }
    }

    fn bounded(&self, wrap: impl FnOnce(String) -> String, columns: &str) -> Statement {
        let inner = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY id LIMIT ?",
            columns, self.table, self.where_sql
        );
        let mut params = self.params.clone();
        params.push(Value::Integer(self.limit));

        Statement {
            sql: wrap(inner),
            params,
        }
    }
}

/// `column IN (?, ?, ...)` with one placeholder per value
fn in_clause(column: &str, count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column, placeholders)
}

fn clamp_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
