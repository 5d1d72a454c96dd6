//! Scannable post population

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::core::config::Config;
use crate::core::query::{QueryError, TableName};

/// Post type that is public but never scanned
const ATTACHMENT_POST_TYPE: &str = "attachment";

/// Source of the content population that scans run over
pub trait PostPopulation {
    /// Post types the scanner checks
    fn scannable_post_types(&self) -> Vec<String>;

    /// Post statuses the scanner checks
    fn scannable_post_statuses(&self) -> Vec<String>;

    /// Publicly visible post types (attachments excluded)
    fn public_post_types(&self) -> Vec<String>;

    /// Number of posts of the given types and statuses
    fn count_posts(&self, post_types: &[String], statuses: &[String]) -> Result<u64, QueryError>;

    /// Number of posts of the given types and statuses with no issue rows
    ///
    /// Ignored issues still count as issues.
    fn count_posts_without_issues(
        &self,
        post_types: &[String],
        statuses: &[String],
    ) -> Result<u64, QueryError>;

    /// Mean issue density over posts with a density above zero
    ///
    /// Posts without issues (density 0) do not take part in the average.
    fn average_issue_density(
        &self,
        post_types: &[String],
        statuses: &[String],
    ) -> Result<Option<f64>, QueryError>;

    /// Number of posts the scanner covers
    fn scannable_posts_count(&self) -> Result<u64, QueryError> {
        self.count_posts(&self.scannable_post_types(), &self.scannable_post_statuses())
    }
}

/// Post population read from the `posts` table
pub struct SqlitePostPopulation<'c> {
    conn: &'c Connection,
    site_id: i64,
    issue_table: TableName,
    scannable_post_types: Vec<String>,
    scannable_post_statuses: Vec<String>,
    public_post_types: Vec<String>,
}

impl<'c> SqlitePostPopulation<'c> {
    pub fn new(conn: &'c Connection, site_id: i64) -> Self {
        Self {
            conn,
            site_id,
            issue_table: TableName::default(),
            scannable_post_types: Vec::new(),
            scannable_post_statuses: Vec::new(),
            public_post_types: Vec::new(),
        }
    }

    pub fn from_config(conn: &'c Connection, config: &Config) -> Result<Self, QueryError> {
        Ok(Self::new(conn, config.site_id())
            .with_issue_table(TableName::new(config.issue_table())?)
            .with_scannable_post_types(config.scannable_post_types())
            .with_scannable_post_statuses(config.scannable_post_statuses())
            .with_public_post_types(config.public_post_types()))
    }

    /// Issue table consulted for posts without issues
    pub fn with_issue_table(mut self, table: TableName) -> Self {
        self.issue_table = table;
        self
    }

    pub fn with_scannable_post_types(mut self, post_types: Vec<String>) -> Self {
        self.scannable_post_types = post_types;
        self
    }

    pub fn with_scannable_post_statuses(mut self, statuses: Vec<String>) -> Self {
        self.scannable_post_statuses = statuses;
        self
    }

    pub fn with_public_post_types(mut self, post_types: Vec<String>) -> Self {
        self.public_post_types = post_types;
        self
    }

    /// WHERE clause selecting this site's posts of the given types/statuses
    fn scope(&self, post_types: &[String], statuses: &[String]) -> (String, Vec<Value>) {
        let mut sql = String::from("site_id = ?");
        let mut params = vec![Value::Integer(self.site_id)];

        sql.push_str(&format!(
            " AND post_type IN ({})",
            vec!["?"; post_types.len()].join(", ")
        ));
        params.extend(post_types.iter().cloned().map(Value::Text));

        sql.push_str(&format!(
            " AND post_status IN ({})",
            vec!["?"; statuses.len()].join(", ")
        ));
        params.extend(statuses.iter().cloned().map(Value::Text));

        (sql, params)
    }
}

impl PostPopulation for SqlitePostPopulation<'_> {
    fn scannable_post_types(&self) -> Vec<String> {
        self.scannable_post_types.clone()
    }

    fn scannable_post_statuses(&self) -> Vec<String> {
        self.scannable_post_statuses.clone()
    }

    fn public_post_types(&self) -> Vec<String> {
        self.public_post_types
            .iter()
            .filter(|t| t.as_str() != ATTACHMENT_POST_TYPE)
            .cloned()
            .collect()
    }

    fn count_posts(&self, post_types: &[String], statuses: &[String]) -> Result<u64, QueryError> {
        if post_types.is_empty() || statuses.is_empty() {
            return Ok(0);
        }

        let (scope, params) = self.scope(post_types, statuses);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM posts WHERE {}", scope),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_posts_without_issues(
        &self,
        post_types: &[String],
        statuses: &[String],
    ) -> Result<u64, QueryError> {
        if post_types.is_empty() || statuses.is_empty() {
            return Ok(0);
        }

        let (scope, params) = self.scope(post_types, statuses);
        let sql = format!(
            "SELECT COUNT(*) FROM posts p WHERE {} AND NOT EXISTS \
             (SELECT 1 FROM {} i WHERE i.site_id = p.site_id AND i.post_id = p.id)",
            scope, self.issue_table
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn average_issue_density(
        &self,
        post_types: &[String],
        statuses: &[String],
    ) -> Result<Option<f64>, QueryError> {
        if post_types.is_empty() || statuses.is_empty() {
            return Ok(None);
        }

        let (scope, params) = self.scope(post_types, statuses);
        let average: Option<f64> = self.conn.query_row(
            &format!(
                "SELECT AVG(issue_density) FROM posts WHERE {} AND issue_density > 0",
                scope
            ),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(average)
    }
}
