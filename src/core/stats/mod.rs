//! Cached scan statistics
//!
//! The aggregator runs a fixed battery of issue queries and derives the
//! dashboard metrics from them. Results are cached per scope and are reused
//! while they are younger than the TTL and no full scan has completed since
//! they were computed.
//!
//! Query errors propagate unchanged. Cache failures are logged and never
//! keep a freshly computed summary from the caller.

mod types;

pub use types::*;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::cache::{CacheError, CacheKey, CacheNamespace, CacheStore};
use crate::core::clock::saturating_add;
pub use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{Config, DEFAULT_CACHE_TTL_SECS, DEFAULT_RECORD_LIMIT};
use crate::core::format::{Formatter, PlainFormatter};
use crate::core::issue::{IgnoreMode, RuleType};
use crate::core::posts::PostPopulation;
use crate::core::query::{IssueFilter, IssueStore, QueryError};
use crate::core::rules::RuleRegistry;
use crate::core::scan::{ScanOrchestrator, ScanStatus};

static DEFAULT_FORMATTER: PlainFormatter = PlainFormatter::new();
static SYSTEM_CLOCK: SystemClock = SystemClock;

/// Upper bound for the TTL of a summary
const MAX_TTL_DAYS: i64 = 365 * 100;

/// Tunables for the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSettings {
    /// Maximum issue rows considered per query
    pub record_limit: u64,
    /// How long a computed summary stays fresh
    pub cache_ttl: Duration,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            record_limit: DEFAULT_RECORD_LIMIT,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl From<&Config> for StatsSettings {
    fn from(config: &Config) -> Self {
        Self {
            record_limit: config.record_limit(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs()).min(max_ttl()),
        }
    }
}

fn max_ttl() -> Duration {
    Duration::from_secs(MAX_TTL_DAYS as u64 * 24 * 60 * 60)
}

/// Computes and caches summary statistics for one site
pub struct StatsAggregator<'a> {
    issues: &'a IssueStore<'a>,
    posts: &'a dyn PostPopulation,
    rules: &'a dyn RuleRegistry,
    cache: &'a dyn CacheStore,
    scans: Option<&'a dyn ScanOrchestrator>,
    formatter: &'a dyn Formatter,
    clock: &'a dyn Clock,
    settings: StatsSettings,
    namespace: CacheNamespace,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(
        issues: &'a IssueStore<'a>,
        posts: &'a dyn PostPopulation,
        rules: &'a dyn RuleRegistry,
        cache: &'a dyn CacheStore,
        settings: StatsSettings,
    ) -> Self {
        Self {
            issues,
            posts,
            rules,
            cache,
            scans: None,
            formatter: &DEFAULT_FORMATTER,
            clock: &SYSTEM_CLOCK,
            settings,
            namespace: CacheNamespace::current(settings.record_limit),
        }
    }

    /// Read full scan state from an orchestrator
    pub fn with_scan_orchestrator(mut self, scans: &'a dyn ScanOrchestrator) -> Self {
        self.scans = Some(scans);
        self
    }

    pub fn with_formatter(mut self, formatter: &'a dyn Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_namespace(mut self, namespace: CacheNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn settings(&self) -> &StatsSettings {
        &self.settings
    }

    /// Storage key for a scope
    pub fn cache_id(&self, key: &CacheKey) -> String {
        self.namespace.key(key)
    }

    /// Site-wide summary, from cache when fresh
    pub fn summary(&self) -> Result<SummaryRecord, QueryError> {
        let key = CacheKey::SiteWide;
        if let Some(hit) = self.cached::<SummaryRecord>(&key) {
            return Ok(hit);
        }

        let record = self.compute_summary(&key)?;
        if record.posts_scanned > 0 {
            self.store(&key, &record);
        } else {
            // Nothing to report on; make sure no stale numbers linger
            self.forget(&key);
        }
        Ok(record)
    }

    /// Error and warning breakdown for one post type, from cache when fresh
    pub fn issues_summary_by_post_type(
        &self,
        post_type: &str,
    ) -> Result<PostTypeSummary, QueryError> {
        let key = CacheKey::ByPostType(post_type.to_string());
        if let Some(hit) = self.cached::<PostTypeSummary>(&key) {
            return Ok(hit);
        }

        let record = self.compute_post_type_summary(&key, post_type)?;
        let posts = self.posts.count_posts(
            &[post_type.to_string()],
            &self.posts.scannable_post_statuses(),
        )?;
        if posts > 0 {
            self.store(&key, &record);
        } else {
            self.forget(&key);
        }
        Ok(record)
    }

    /// Recompute and store every summary
    ///
    /// Meant for a background scheduler rather than interactive requests.
    pub fn load_cache(&self) -> Result<CacheLoadStats, QueryError> {
        let start = Instant::now();
        self.clear_cache();

        let summary = self.summary()?;
        let public = self.posts.public_post_types();
        let post_types: Vec<String> = self
            .posts
            .scannable_post_types()
            .into_iter()
            .filter(|t| public.contains(t))
            .collect();

        for post_type in &post_types {
            self.issues_summary_by_post_type(post_type)?;
        }

        let stats = CacheLoadStats {
            summary_stored: summary.posts_scanned > 0,
            post_types,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            post_types = stats.post_types.len(),
            duration_ms = stats.duration_ms,
            "summary cache loaded"
        );
        Ok(stats)
    }

    /// Drop the site-wide entry and every public post type entry
    ///
    /// Returns the number of keys removed (or attempted).
    pub fn clear_cache(&self) -> usize {
        let keys = CacheKey::all(self.posts.public_post_types());
        for key in &keys {
            self.forget(key);
        }
        debug!(keys = keys.len(), "summary cache cleared");
        keys.len()
    }

    /// Freshness of the entry stored under a scope
    pub fn cache_state(&self, key: &CacheKey) -> CacheState {
        #[derive(Deserialize)]
        struct Envelope {
            cache: CacheMeta,
        }

        match self.read_entry::<Envelope>(key) {
            Some(entry) => entry.cache.state(
                self.clock.now(),
                self.ttl(),
                self.scan_status().completed_at,
            ),
            None => CacheState::Absent,
        }
    }

    fn compute_summary(&self, key: &CacheKey) -> Result<SummaryRecord, QueryError> {
        let now = self.clock.now();
        let limit = self.settings.record_limit;
        info!(cache_id = %self.cache_id(key), "computing scan summary");

        let post_types = self.posts.scannable_post_types();
        let statuses = self.posts.scannable_post_statuses();
        let public_post_types = self.posts.public_post_types();
        let scannable_posts_count = self.posts.count_posts(&post_types, &statuses)?;

        let rules = self.rules.rules();
        let rule_count = rules.len() as u64;

        let everything = IssueFilter::all_post_types(limit);
        let warnings = everything.clone().with_rule_types([RuleType::Warning]);
        let contrast = everything.clone().with_rule_types([RuleType::ColorContrast]);
        let errors = everything.clone().with_rule_types([RuleType::Error]);
        let ignored = everything
            .clone()
            .with_ignore_mode(IgnoreMode::OnlyIgnored);

        let is_truncated = self.issues.has_truncated_results(&everything)?;
        let warning_count = self.issues.count(&warnings)?;
        let distinct_warnings = self.issues.distinct_count(&warnings)?;
        let contrast_count = self.issues.count(&contrast)?;
        let distinct_contrast = self.issues.distinct_count(&contrast)?;
        let error_count = self.issues.count(&errors)?;
        let distinct_errors = self.issues.distinct_count(&errors)?;
        let ignored_count = self.issues.count(&ignored)?;
        let distinct_ignored = self.issues.distinct_count(&ignored)?;

        let mut rules_failed = 0u64;
        for rule in rules {
            let presence = IssueFilter::all_post_types(1).with_rule_slugs([rule.slug.as_str()]);
            if self.issues.count(&presence)? > 0 {
                rules_failed += 1;
            }
        }
        let rules_passed = rule_count.saturating_sub(rules_failed);

        let posts_without_issues = self
            .posts
            .count_posts_without_issues(&post_types, &statuses)?;

        let posts_scanned = scannable_posts_count;
        let passed_percentage = if posts_scanned > 0 && rule_count > 0 {
            round2(rules_passed as f64 * 100.0 / rule_count as f64)
        } else {
            100.0
        };
        let avg_issues_per_post = if posts_scanned > 0 {
            round2((warning_count + error_count) as f64 / posts_scanned as f64)
        } else {
            0.0
        };
        let density = match self.posts.average_issue_density(&post_types, &statuses)? {
            Some(average) => IssueDensity::Percentage(round2(average)),
            None => IssueDensity::NotApplicable,
        };

        let scan = self.scan_status();

        let mut record = SummaryRecord {
            scannable_posts_count,
            scannable_post_types_count: post_types.len() as u64,
            public_post_types_count: public_post_types.len() as u64,
            rule_count,
            tests_count: scannable_posts_count.saturating_mul(rule_count),
            posts_scanned,
            posts_without_issues,
            is_truncated,
            warnings: warning_count,
            distinct_warnings,
            errors: error_count,
            distinct_errors,
            contrast_errors: contrast_count,
            distinct_contrast_errors: distinct_contrast,
            errors_without_contrast: error_count.saturating_sub(contrast_count),
            distinct_errors_without_contrast: distinct_errors.saturating_sub(distinct_contrast),
            ignored: ignored_count,
            distinct_ignored,
            rules_failed,
            rules_passed,
            passed_percentage,
            avg_issues_per_post,
            avg_issue_density_percentage: density,
            fullscan_running: scan.running,
            fullscan_state: scan.state,
            fullscan_completed_at: scan.completed_at,
            cache: self.new_meta(key, now),
            formatted: Default::default(),
        };
        record.formatted = self.format_summary(&record);
        Ok(record)
    }

    fn compute_post_type_summary(
        &self,
        key: &CacheKey,
        post_type: &str,
    ) -> Result<PostTypeSummary, QueryError> {
        let now = self.clock.now();
        debug!(post_type, "computing post type summary");

        let base = IssueFilter::new(self.settings.record_limit).with_post_types([post_type]);
        let errors = base.clone().with_rule_types([RuleType::Error]);
        let warnings = base.clone().with_rule_types([RuleType::Warning]);
        let contrast = base.with_rule_types([RuleType::ColorContrast]);

        let error_count = self.issues.count(&errors)?;
        let distinct_errors = self.issues.distinct_count(&errors)?;
        let contrast_count = self.issues.count(&contrast)?;
        let distinct_contrast = self.issues.distinct_count(&contrast)?;

        let mut record = PostTypeSummary {
            post_type: post_type.to_string(),
            errors: error_count,
            distinct_errors,
            warnings: self.issues.count(&warnings)?,
            distinct_warnings: self.issues.distinct_count(&warnings)?,
            contrast_errors: contrast_count,
            distinct_contrast_errors: distinct_contrast,
            errors_without_contrast: error_count.saturating_sub(contrast_count),
            distinct_errors_without_contrast: distinct_errors.saturating_sub(distinct_contrast),
            cache: self.new_meta(key, now),
            formatted: Default::default(),
        };

        let mut formatted = self.format_counts(&record.counts());
        self.format_meta(&record.cache, &mut formatted);
        record.formatted = formatted;
        Ok(record)
    }

    fn format_summary(&self, record: &SummaryRecord) -> std::collections::BTreeMap<String, String> {
        let mut formatted = self.format_counts(&record.counts());

        formatted.insert(
            "passed_percentage_formatted".into(),
            self.formatter.format_percentage(record.passed_percentage),
        );
        formatted.insert(
            "avg_issues_per_post_formatted".into(),
            self.formatter.format_number(record.avg_issues_per_post, 2),
        );
        formatted.insert(
            "avg_issue_density_percentage_formatted".into(),
            match record.avg_issue_density_percentage.percentage() {
                Some(p) => self.formatter.format_percentage(p),
                None => NOT_APPLICABLE.to_string(),
            },
        );
        formatted.insert(
            "fullscan_completed_at_formatted".into(),
            match record.fullscan_completed_at {
                Some(at) => self.formatter.format_date(at),
                None => "Never".to_string(),
            },
        );
        self.format_meta(&record.cache, &mut formatted);
        formatted
    }

    fn format_counts(&self, counts: &[(&str, u64)]) -> std::collections::BTreeMap<String, String> {
        counts
            .iter()
            .map(|(name, value)| {
                (
                    format!("{}_formatted", name),
                    self.formatter.format_count(*value),
                )
            })
            .collect()
    }

    fn format_meta(
        &self,
        meta: &CacheMeta,
        formatted: &mut std::collections::BTreeMap<String, String>,
    ) {
        formatted.insert(
            "cached_at_formatted".into(),
            self.formatter.format_date(meta.cached_at),
        );
        formatted.insert(
            "expires_at_formatted".into(),
            self.formatter.format_date(meta.expires_at),
        );
    }

    fn new_meta(&self, key: &CacheKey, now: DateTime<Utc>) -> CacheMeta {
        CacheMeta {
            cache_id: self.cache_id(key),
            cached_at: now,
            expires_at: saturating_add(now, self.ttl()),
            cache_hit: false,
        }
    }

    fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.cache_ttl.min(max_ttl()))
            .unwrap_or_else(|_| chrono::Duration::days(MAX_TTL_DAYS))
    }

    fn scan_status(&self) -> ScanStatus {
        ScanStatus::read(self.scans)
    }

    /// Fresh cached record for a scope, marked as a cache hit
    fn cached<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned + CachedRecord,
    {
        let mut record = self.read_entry::<T>(key)?;
        let state = record.cache_meta().state(
            self.clock.now(),
            self.ttl(),
            self.scan_status().completed_at,
        );
        debug!(cache_id = %self.cache_id(key), %state, "summary cache lookup");

        if state != CacheState::Fresh {
            return None;
        }
        record.cache_meta_mut().cache_hit = true;
        Some(record)
    }

    fn read_entry<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let cache_id = self.cache_id(key);
        let raw = match self.cache.get(&cache_id) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(cache_id = %cache_id, error = %e, "summary cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(cache_id = %cache_id, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &CacheKey, record: &T) {
        let cache_id = self.cache_id(key);
        let result = serde_json::to_string(record)
            .map_err(CacheError::from)
            .and_then(|json| {
                self.cache
                    .set(&cache_id, &json, self.settings.cache_ttl.min(max_ttl()))
            });

        if let Err(e) = result {
            warn!(cache_id = %cache_id, error = %e, "failed to store summary cache");
        }
    }

    fn forget(&self, key: &CacheKey) {
        let cache_id = self.cache_id(key);
        if let Err(e) = self.cache.delete(&cache_id) {
            warn!(cache_id = %cache_id, error = %e, "failed to clear summary cache");
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
