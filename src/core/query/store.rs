//! Execution of built issue queries against SQLite

use rusqlite::{params, params_from_iter, Connection};

use super::{IssueFilter, QueryBuilder, QueryError, Statement, TableName};
use crate::core::issue::IssueRecord;

/// Read-only view of one site's issues
pub struct IssueStore<'c> {
    conn: &'c Connection,
    builder: QueryBuilder,
}

impl<'c> IssueStore<'c> {
    /// Bind to an issue table, failing if it cannot be resolved
    pub fn open(conn: &'c Connection, table: &str, site_id: i64) -> Result<Self, QueryError> {
        let table = TableName::new(table)?;

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.as_str()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(QueryError::MissingTable {
                name: table.to_string(),
            });
        }

        Ok(Self {
            conn,
            builder: QueryBuilder::new(table, site_id),
        })
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn site_id(&self) -> i64 {
        self.builder.site_id()
    }

    /// Number of matching rows, bounded by the record limit
    pub fn count(&self, filter: &IssueFilter) -> Result<u64, QueryError> {
        self.scalar(&self.builder.build(filter).count())
    }

    /// Number of distinct (rule_slug, object) pairs among matching rows
    pub fn distinct_count(&self, filter: &IssueFilter) -> Result<u64, QueryError> {
        self.scalar(&self.builder.build(filter).distinct_count())
    }

    /// Number of distinct posts among matching rows
    pub fn distinct_post_count(&self, filter: &IssueFilter) -> Result<u64, QueryError> {
        self.scalar(&self.builder.build(filter).distinct_post_count())
    }

    /// Matching issue ids in ascending order
    pub fn ids(&self, filter: &IssueFilter) -> Result<Vec<i64>, QueryError> {
        let statement = self.builder.build(filter).ids();
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let rows = stmt.query_map(params_from_iter(statement.params.iter()), |row| {
            row.get::<_, i64>(0)
        })?;

        let ids = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Matching issue rows in ascending id order
    pub fn records(&self, filter: &IssueFilter) -> Result<Vec<IssueRecord>, QueryError> {
        let statement = self.builder.build(filter).records();
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let rows = stmt.query_map(params_from_iter(statement.params.iter()), |row| {
            Ok(IssueRecord {
                id: row.get(0)?,
                site_id: row.get(1)?,
                post_id: row.get(2)?,
                post_type: row.get(3)?,
                rule_slug: row.get(4)?,
                rule_type: row.get(5)?,
                object: row.get(6)?,
                ignored: row.get(7)?,
                ignored_globally: row.get(8)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Whether the unbounded scope holds more rows than the record limit
    pub fn has_truncated_results(&self, filter: &IssueFilter) -> Result<bool, QueryError> {
        let total = self.scalar(&self.builder.build(filter).scope_count())?;
        Ok(total > filter.record_limit)
    }

    fn scalar(&self, statement: &Statement) -> Result<u64, QueryError> {
        let value: i64 = self.conn.query_row(
            &statement.sql,
            params_from_iter(statement.params.iter()),
            |row| row.get(0),
        )?;
        Ok(value.max(0) as u64)
    }
}
