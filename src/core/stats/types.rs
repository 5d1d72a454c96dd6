//! Summary record types

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::clock::saturating_add;
use crate::core::scan::ScanState;

/// Display value of a density that could not be computed
pub const NOT_APPLICABLE: &str = "N/A";

/// Freshness of a cached summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing cached under the key
    Absent,
    Fresh,
    /// Older than the TTL
    StaleByAge,
    /// A full scan completed after the entry was cached
    StaleByEvent,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheState::Absent => write!(f, "absent"),
            CacheState::Fresh => write!(f, "fresh"),
            CacheState::StaleByAge => write!(f, "stale (expired)"),
            CacheState::StaleByEvent => write!(f, "stale (full scan completed)"),
        }
    }
}

/// Cache bookkeeping carried by every summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub cache_id: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub cache_hit: bool,
}

impl CacheMeta {
    /// Classify this entry at `now`
    pub fn state(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
        last_full_scan: Option<DateTime<Utc>>,
    ) -> CacheState {
        if now > self.expires_at || now > saturating_add(self.cached_at, ttl) {
            return CacheState::StaleByAge;
        }
        if last_full_scan.is_some_and(|completed| completed > self.cached_at) {
            return CacheState::StaleByEvent;
        }
        CacheState::Fresh
    }
}

/// Average issue density, or "N/A" when no post qualifies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IssueDensity {
    Percentage(f64),
    NotApplicable,
}

impl IssueDensity {
    pub fn percentage(&self) -> Option<f64> {
        match self {
            IssueDensity::Percentage(p) => Some(*p),
            IssueDensity::NotApplicable => None,
        }
    }
}

impl Serialize for IssueDensity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IssueDensity::Percentage(p) => serializer.serialize_f64(*p),
            IssueDensity::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for IssueDensity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(p) => Ok(IssueDensity::Percentage(p)),
            Raw::Text(s) if s == NOT_APPLICABLE => Ok(IssueDensity::NotApplicable),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid issue density: {:?}",
                s
            ))),
        }
    }
}

/// Site-wide scan statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub scannable_posts_count: u64,
    pub scannable_post_types_count: u64,
    pub public_post_types_count: u64,
    pub rule_count: u64,
    pub tests_count: u64,
    pub posts_scanned: u64,
    pub posts_without_issues: u64,
    pub is_truncated: bool,
    pub warnings: u64,
    pub distinct_warnings: u64,
    pub errors: u64,
    pub distinct_errors: u64,
    pub contrast_errors: u64,
    pub distinct_contrast_errors: u64,
    pub errors_without_contrast: u64,
    pub distinct_errors_without_contrast: u64,
    pub ignored: u64,
    pub distinct_ignored: u64,
    pub rules_failed: u64,
    pub rules_passed: u64,
    pub passed_percentage: f64,
    pub avg_issues_per_post: f64,
    pub avg_issue_density_percentage: IssueDensity,
    pub fullscan_running: bool,
    pub fullscan_state: ScanState,
    pub fullscan_completed_at: Option<DateTime<Utc>>,
    pub cache: CacheMeta,
    /// `<field>_formatted` display strings
    pub formatted: BTreeMap<String, String>,
}

impl SummaryRecord {
    /// Integer counters, by field name
    pub fn counts(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("scannable_posts_count", self.scannable_posts_count),
            ("scannable_post_types_count", self.scannable_post_types_count),
            ("public_post_types_count", self.public_post_types_count),
            ("rule_count", self.rule_count),
            ("tests_count", self.tests_count),
            ("posts_scanned", self.posts_scanned),
            ("posts_without_issues", self.posts_without_issues),
            ("warnings", self.warnings),
            ("distinct_warnings", self.distinct_warnings),
            ("errors", self.errors),
            ("distinct_errors", self.distinct_errors),
            ("contrast_errors", self.contrast_errors),
            ("distinct_contrast_errors", self.distinct_contrast_errors),
            ("errors_without_contrast", self.errors_without_contrast),
            (
                "distinct_errors_without_contrast",
                self.distinct_errors_without_contrast,
            ),
            ("ignored", self.ignored),
            ("distinct_ignored", self.distinct_ignored),
            ("rules_failed", self.rules_failed),
            ("rules_passed", self.rules_passed),
        ]
    }

    /// Flat key/value view with cache metadata and formatted strings inlined
    pub fn to_flat_map(&self) -> BTreeMap<String, serde_json::Value> {
        flatten(self)
    }
}

/// Error/warning breakdown for one post type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeSummary {
    pub post_type: String,
    pub errors: u64,
    pub distinct_errors: u64,
    pub warnings: u64,
    pub distinct_warnings: u64,
    pub contrast_errors: u64,
    pub distinct_contrast_errors: u64,
    pub errors_without_contrast: u64,
    pub distinct_errors_without_contrast: u64,
    pub cache: CacheMeta,
    pub formatted: BTreeMap<String, String>,
}

impl PostTypeSummary {
    pub fn counts(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("errors", self.errors),
            ("distinct_errors", self.distinct_errors),
            ("warnings", self.warnings),
            ("distinct_warnings", self.distinct_warnings),
            ("contrast_errors", self.contrast_errors),
            ("distinct_contrast_errors", self.distinct_contrast_errors),
            ("errors_without_contrast", self.errors_without_contrast),
            (
                "distinct_errors_without_contrast",
                self.distinct_errors_without_contrast,
            ),
        ]
    }

    pub fn to_flat_map(&self) -> BTreeMap<String, serde_json::Value> {
        flatten(self)
    }
}

/// Records that carry cache metadata
pub trait CachedRecord {
    fn cache_meta(&self) -> &CacheMeta;
    fn cache_meta_mut(&mut self) -> &mut CacheMeta;
}

impl CachedRecord for SummaryRecord {
    fn cache_meta(&self) -> &CacheMeta {
        &self.cache
    }

    fn cache_meta_mut(&mut self) -> &mut CacheMeta {
        &mut self.cache
    }
}

impl CachedRecord for PostTypeSummary {
    fn cache_meta(&self) -> &CacheMeta {
        &self.cache
    }

    fn cache_meta_mut(&mut self) -> &mut CacheMeta {
        &mut self.cache
    }
}

/// Result of proactively filling the cache
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheLoadStats {
    /// Whether the site-wide summary was persisted
    pub summary_stored: bool,
    /// Post types whose summaries were computed
    pub post_types: Vec<String>,
    pub duration_ms: u64,
}

fn flatten<T: Serialize>(record: &T) -> BTreeMap<String, serde_json::Value> {
    let mut out = BTreeMap::new();
    let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(record) else {
        return out;
    };

    for (key, value) in fields {
        match (key.as_str(), value) {
            ("cache" | "formatted", serde_json::Value::Object(nested)) => {
                out.extend(nested);
            }
            (_, value) => {
                out.insert(key, value);
            }
        }
    }
    out
}
