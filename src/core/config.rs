//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::core::query::DEFAULT_ISSUE_TABLE;
use crate::core::Project;

/// Default number of issue rows a query considers
pub const DEFAULT_RECORD_LIMIT: u64 = 100_000;

/// Default freshness window of cached summaries (one day)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60 * 24;

/// Engine configuration with layered hierarchy
///
/// Unset values fall back to built-in defaults through the accessors.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site partition used for every query
    pub site_id: Option<i64>,

    /// Maximum issue rows considered by a single query
    pub record_limit: Option<u64>,

    /// Seconds a computed summary stays fresh
    pub cache_ttl_secs: Option<u64>,

    /// Name of the issue table
    pub issue_table: Option<String>,

    pub scannable_post_types: Option<Vec<String>>,

    pub scannable_post_statuses: Option<Vec<String>>,

    pub public_post_types: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (applied by the accessors)

        // 2. Global user config (~/.config/a11y/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.a11y/config.yaml)
        if let Some(project) = project {
            let project_config_path = project.project_dir().join("config.yaml");
            if let Some(project_config) = Self::read_file(&project_config_path) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    /// Parse a YAML document into a config layer
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    fn read_file(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "a11y")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.site_id.is_some() {
            self.site_id = other.site_id;
        }
        if other.record_limit.is_some() {
            self.record_limit = other.record_limit;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
        if other.issue_table.is_some() {
            self.issue_table = other.issue_table;
        }
        if other.scannable_post_types.is_some() {
            self.scannable_post_types = other.scannable_post_types;
        }
        if other.scannable_post_statuses.is_some() {
            self.scannable_post_statuses = other.scannable_post_statuses;
        }
        if other.public_post_types.is_some() {
            self.public_post_types = other.public_post_types;
        }
    }

    /// Apply `A11Y_*` overrides from an environment lookup
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %value, "ignoring invalid environment override");
                    None
                }
            }
        }

        if let Some(site_id) = parse("A11Y_SITE_ID", lookup("A11Y_SITE_ID")) {
            self.site_id = Some(site_id);
        }
        if let Some(limit) = parse("A11Y_RECORD_LIMIT", lookup("A11Y_RECORD_LIMIT")) {
            self.record_limit = Some(limit);
        }
        if let Some(ttl) = parse("A11Y_CACHE_TTL", lookup("A11Y_CACHE_TTL")) {
            self.cache_ttl_secs = Some(ttl);
        }
    }

    pub fn site_id(&self) -> i64 {
        self.site_id.unwrap_or(1)
    }

    pub fn record_limit(&self) -> u64 {
        self.record_limit.unwrap_or(DEFAULT_RECORD_LIMIT)
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn issue_table(&self) -> &str {
        self.issue_table.as_deref().unwrap_or(DEFAULT_ISSUE_TABLE)
    }

    pub fn scannable_post_types(&self) -> Vec<String> {
        self.scannable_post_types
            .clone()
            .unwrap_or_else(|| to_strings(&["post", "page"]))
    }

    pub fn scannable_post_statuses(&self) -> Vec<String> {
        self.scannable_post_statuses
            .clone()
            .unwrap_or_else(|| to_strings(&["publish", "future", "draft", "pending", "private"]))
    }

    pub fn public_post_types(&self) -> Vec<String> {
        self.public_post_types
            .clone()
            .unwrap_or_else(|| to_strings(&["post", "page"]))
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
