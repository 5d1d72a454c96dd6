//! Key/value cache store for computed summaries
//!
//! Summaries are cached under keys derived from:
//! - The engine version, so incompatible record shapes never collide
//! - The record limit, since truncated counts differ per limit
//! - The scope: site-wide or one post type
//!
//! Write failures are never fatal to callers; see the stats aggregator.

mod memory;
mod sqlite;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use std::time::Duration;

use thiserror::Error;

/// Prefix shared by every key this engine owns
const KEY_PREFIX: &str = "a11y_scans_stats";

/// Errors from a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

/// A namespaced key/value store with per-entry TTL
pub trait CacheStore {
    /// Fetch a value; `None` when absent or expired
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value for `ttl`
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a value; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Scope of a cached summary
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    SiteWide,
    ByPostType(String),
}

impl CacheKey {
    /// The site-wide key followed by one key per post type
    pub fn all<I, S>(post_types: I) -> Vec<CacheKey>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        std::iter::once(CacheKey::SiteWide)
            .chain(post_types.into_iter().map(|p| CacheKey::ByPostType(p.into())))
            .collect()
    }
}

/// Builds storage key names for one engine version and record limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNamespace {
    version: String,
    record_limit: u64,
}

impl CacheNamespace {
    pub fn new(version: impl Into<String>, record_limit: u64) -> Self {
        Self {
            version: version.into(),
            record_limit,
        }
    }

    /// Namespace for this build of the engine
    pub fn current(record_limit: u64) -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), record_limit)
    }

    fn prefix(&self) -> String {
        format!("{}_{}_{}_", KEY_PREFIX, self.version, self.record_limit)
    }

    /// Storage key for a cache scope
    pub fn key(&self, key: &CacheKey) -> String {
        match key {
            CacheKey::SiteWide => format!("{}summary", self.prefix()),
            CacheKey::ByPostType(post_type) => {
                format!("{}issues_summary_by_post_type_{}", self.prefix(), post_type)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_embeds_version_and_limit() {
        let ns = CacheNamespace::new("1.2.0", 500);
        assert_eq!(
            ns.key(&CacheKey::SiteWide),
            "a11y_scans_stats_1.2.0_500_summary"
        );
        assert_eq!(
            ns.key(&CacheKey::ByPostType("page".into())),
            "a11y_scans_stats_1.2.0_500_issues_summary_by_post_type_page"
        );
    }

    #[test]
    fn test_limits_do_not_collide() {
        let a = CacheNamespace::new("1.0.0", 100);
        let b = CacheNamespace::new("1.0.0", 200);
        assert_ne!(a.key(&CacheKey::SiteWide), b.key(&CacheKey::SiteWide));
    }

    #[test]
    fn test_all_keys() {
        let keys = CacheKey::all(["post", "page"]);
        assert_eq!(
            keys,
            vec![
                CacheKey::SiteWide,
                CacheKey::ByPostType("post".into()),
                CacheKey::ByPostType("page".into()),
            ]
        );
    }
}
