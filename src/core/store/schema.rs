//! Database schema initialization

use miette::{IntoDiagnostic, Result};
use rusqlite::params;

use super::{Database, SCHEMA_VERSION};
use crate::core::query::{QueryError, TableName};

impl Database {
    /// Initialize the fixed tables
    pub(super) fn init_schema(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Content items that can be scanned
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                site_id INTEGER NOT NULL DEFAULT 1,
                post_type TEXT NOT NULL,
                post_status TEXT NOT NULL,
                issue_density REAL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_scope ON posts(site_id, post_type, post_status);

            -- Per-site options (full scan state lives here)
            CREATE TABLE IF NOT EXISTS options (
                site_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (site_id, name)
            );

            -- Expiring key/value entries used by the summary cache
            CREATE TABLE IF NOT EXISTS transients (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            "#,
            )
            .into_diagnostic()?;

        self.conn
            .execute("DELETE FROM schema_version", [])
            .into_diagnostic()?;
        self.conn
            .execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .into_diagnostic()?;

        Ok(())
    }

    /// Create the issue table under a validated name
    pub(super) fn create_issue_table(&self, table: &TableName) -> Result<(), QueryError> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                post_id INTEGER NOT NULL,
                post_type TEXT NOT NULL,
                rule_slug TEXT NOT NULL,
                rule_type TEXT NOT NULL,
                object TEXT NOT NULL DEFAULT '',
                ignored INTEGER NOT NULL DEFAULT 0,
                ignored_globally INTEGER NOT NULL DEFAULT 0,
                created TEXT,
                user INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_{t}_scope ON {t}(site_id, post_type);
            CREATE INDEX IF NOT EXISTS idx_{t}_rule ON {t}(rule_slug);
            CREATE INDEX IF NOT EXISTS idx_{t}_post ON {t}(post_id);
            "#,
            t = table
        ))?;
        Ok(())
    }
}
