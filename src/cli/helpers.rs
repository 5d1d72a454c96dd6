//! Shared helper functions for CLI commands
//!
//! Opening the project database and rendering key/value records are the
//! same for every command, so they live here.

use std::collections::BTreeMap;

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::SqliteCacheStore;
use crate::core::posts::SqlitePostPopulation;
use crate::core::query::IssueStore;
use crate::core::rules::RuleSet;
use crate::core::scan::OptionScanOrchestrator;
use crate::core::stats::{StatsAggregator, StatsSettings};
use crate::core::{Config, Database, Project};

/// An opened project: its configuration and database
pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub db: Database,
}

impl Workspace {
    /// Discover the project (or use `--project`) and open its database
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match &global.project {
            Some(path) => Project::discover_from(path),
            None => Project::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = Config::load(Some(&project));
        let db = Database::open(&project.database_path())?;

        Ok(Self {
            project,
            config,
            db,
        })
    }

    /// Issue queries against the configured table and site
    pub fn issues(&self) -> Result<IssueStore<'_>> {
        Ok(self
            .db
            .issue_store(self.config.issue_table(), self.config.site_id())?)
    }

    pub fn posts(&self) -> Result<SqlitePostPopulation<'_>> {
        Ok(SqlitePostPopulation::from_config(
            self.db.connection(),
            &self.config,
        )?)
    }

    pub fn cache(&self) -> SqliteCacheStore<'_> {
        SqliteCacheStore::new(self.db.connection())
    }

    /// Run `f` with an aggregator wired to this workspace
    pub fn with_stats<R>(&self, f: impl FnOnce(&StatsAggregator<'_>) -> Result<R>) -> Result<R> {
        let issues = self.issues()?;
        let posts = self.posts()?;
        let rules = RuleSet::builtin();
        let cache = self.cache();
        let scans = OptionScanOrchestrator::new(self.db.connection(), self.config.site_id());

        let stats = StatsAggregator::new(
            &issues,
            &posts,
            &rules,
            &cache,
            StatsSettings::from(&self.config),
        )
        .with_scan_orchestrator(&scans);
        f(&stats)
    }
}

/// Print a flat record in the requested format
///
/// `Auto` shows a table of the display strings where the record has them.
pub fn print_record(title: &str, record: &BTreeMap<String, Value>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(record).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for (key, value) in record {
                println!("{}\t{}", key, escape_tsv(&display_value(value)));
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, value) in record {
                builder.push_record([key.clone(), display_value(value)]);
            }
            println!("## {}\n", title);
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Auto => {
            let mut builder = Builder::default();
            for (key, value) in record {
                if key.ends_with("_formatted") {
                    continue;
                }
                let shown = record
                    .get(&format!("{}_formatted", key))
                    .map(display_value)
                    .unwrap_or_else(|| display_value(value));
                builder.push_record([key.replace('_', " "), shown]);
            }
            println!("{}", style(title).bold());
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}

/// Render a JSON value without quotes around strings
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Keep a TSV field on one line and in one column
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("N/A")), "N/A");
        assert_eq!(display_value(&json!(12)), "12");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "-");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("<p>é</p>", 8), "<p>é</p>");
    }

    #[test]
    fn test_escape_tsv() {
        assert_eq!(escape_tsv("a\tb\nc"), "a b c");
        assert_eq!(escape_tsv("plain"), "plain");
    }
}
