//! SQLite database backing the engine
//!
//! One database file holds:
//! - The issue table written by the scanner (read-only here)
//! - The post population with per-post issue density
//! - Site options, including the full scan state
//! - Transients used as the summary cache store
//!
//! The issue table name is configurable, so it is created separately from
//! the fixed tables via [`Database::ensure_issue_table`].

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::core::query::{IssueStore, QueryError, TableName};

/// Database file location within a project
pub const DATABASE_FILE: &str = ".a11y/issues.db";

/// Current schema version of the fixed tables
const SCHEMA_VERSION: i32 = 2;

/// Connection to the engine's SQLite database
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }

        let conn = Connection::open(path).into_diagnostic()?;

        // Enable WAL mode so the scanner can write while we read
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .into_diagnostic()?;

        let mut db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.prepare_schema()?;
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().into_diagnostic()?;
        let mut db = Self { conn, path: None };
        db.prepare_schema()?;
        Ok(db)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read-only issue queries for one site
    pub fn issue_store(&self, table: &str, site_id: i64) -> Result<IssueStore<'_>, QueryError> {
        IssueStore::open(&self.conn, table, site_id)
    }

    /// Create the issue table if it does not exist yet
    pub fn ensure_issue_table(&self, table: &str) -> Result<(), QueryError> {
        let table = TableName::new(table)?;
        self.create_issue_table(&table)
    }

    fn prepare_schema(&mut self) -> Result<()> {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        if current_version != SCHEMA_VERSION {
            debug!(
                from = current_version,
                to = SCHEMA_VERSION,
                "initializing database schema"
            );
            // Cached summaries may not match the new shape
            self.conn
                .execute_batch("DROP TABLE IF EXISTS transients;")
                .into_diagnostic()?;
            self.init_schema()?;
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Seeding helpers standing in for the scanner in tests

    use rusqlite::{params, Connection};

    use super::Database;
    use crate::core::query::DEFAULT_ISSUE_TABLE;

    pub fn database() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.ensure_issue_table(DEFAULT_ISSUE_TABLE).unwrap();
        db
    }

    /// Issue row to insert; defaults to a non-ignored error on a post
    pub struct NewIssue<'a> {
        pub site_id: i64,
        pub post_id: i64,
        pub post_type: &'a str,
        pub rule_slug: &'a str,
        pub rule_type: &'a str,
        pub object: &'a str,
        pub ignored: bool,
        pub ignored_globally: bool,
    }

    impl Default for NewIssue<'_> {
        fn default() -> Self {
            Self {
                site_id: 1,
                post_id: 1,
                post_type: "post",
                rule_slug: "img_alt_missing",
                rule_type: "error",
                object: "<img src=\"a.png\">",
                ignored: false,
                ignored_globally: false,
            }
        }
    }

    pub fn insert_issue(conn: &Connection, issue: NewIssue<'_>) -> i64 {
        conn.execute(
            &format!(
                "INSERT INTO {} (site_id, post_id, post_type, rule_slug, rule_type, object, ignored, ignored_globally)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                DEFAULT_ISSUE_TABLE
            ),
            params![
                issue.site_id,
                issue.post_id,
                issue.post_type,
                issue.rule_slug,
                issue.rule_type,
                issue.object,
                issue.ignored,
                issue.ignored_globally
            ],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn insert_post(
        conn: &Connection,
        id: i64,
        post_type: &str,
        post_status: &str,
        issue_density: Option<f64>,
    ) {
        conn.execute(
            "INSERT INTO posts (id, site_id, post_type, post_status, issue_density) VALUES (?1, 1, ?2, ?3, ?4)",
            params![id, post_type, post_status, issue_density],
        )
        .unwrap();
    }

    pub fn set_option(conn: &Connection, name: &str, value: &str) {
        conn.execute(
            "INSERT OR REPLACE INTO options (site_id, name, value) VALUES (1, ?1, ?2)",
            params![name, value],
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file_and_schema() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(DATABASE_FILE);
        let db = Database::open(&path).unwrap();

        assert!(path.exists());
        let tables: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('posts', 'options', 'transients')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("issues.db");
        {
            let db = Database::open(&path).unwrap();
            fixtures::insert_post(db.connection(), 7, "page", "publish", None);
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_issue_store_requires_table() {
        let db = Database::open_in_memory().unwrap();
        let err = db.issue_store("accessibility_checker", 1).err().unwrap();
        assert!(matches!(err, QueryError::MissingTable { .. }));
        assert!(err.is_configuration());

        db.ensure_issue_table("accessibility_checker").unwrap();
        assert!(db.issue_store("accessibility_checker", 1).is_ok());
    }

    #[test]
    fn test_ensure_issue_table_rejects_bad_name() {
        let db = Database::open_in_memory().unwrap();
        let err = db.ensure_issue_table("issues; DROP TABLE posts").unwrap_err();
        assert!(matches!(err, QueryError::InvalidTableName { .. }));
    }
}
