//! Filters describing which issues a query considers

use std::collections::BTreeSet;

use crate::core::issue::{IgnoreMode, RuleType, COLOR_CONTRAST_RULE_SLUG};

/// Which issues a query should consider
///
/// Sets are ordered so the generated SQL is stable for a given filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    /// Allowed post types. Empty matches nothing unless
    /// `include_all_post_types` is set.
    pub post_types: BTreeSet<String>,
    /// Allowed rule types (empty = any)
    pub rule_types: BTreeSet<RuleType>,
    /// Allowed rule slugs (empty = any)
    pub rule_slugs: BTreeSet<String>,
    pub ignore_mode: IgnoreMode,
    /// Skip the post type predicate entirely
    pub include_all_post_types: bool,
    /// Maximum number of rows considered
    pub record_limit: u64,
}

impl IssueFilter {
    /// Empty filter: no post types, default ignore mode
    pub fn new(record_limit: u64) -> Self {
        Self {
            post_types: BTreeSet::new(),
            rule_types: BTreeSet::new(),
            rule_slugs: BTreeSet::new(),
            ignore_mode: IgnoreMode::default(),
            include_all_post_types: false,
            record_limit,
        }
    }

    /// Filter across every post type
    pub fn all_post_types(record_limit: u64) -> Self {
        Self::new(record_limit).with_all_post_types()
    }

    pub fn with_post_types<I, S>(mut self, post_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_types.extend(post_types.into_iter().map(Into::into));
        self
    }

    pub fn with_rule_types<I>(mut self, rule_types: I) -> Self
    where
        I: IntoIterator<Item = RuleType>,
    {
        self.rule_types.extend(rule_types);
        self
    }

    pub fn with_rule_slugs<I, S>(mut self, rule_slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_slugs.extend(rule_slugs.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_mode(mut self, mode: IgnoreMode) -> Self {
        self.ignore_mode = mode;
        self
    }

    pub fn with_all_post_types(mut self) -> Self {
        self.include_all_post_types = true;
        self
    }

    pub fn with_record_limit(mut self, record_limit: u64) -> Self {
        self.record_limit = record_limit;
        self
    }

    /// Rewrite the `color_contrast` pseudo-type into its rule slug
    ///
    /// Color contrast is a rule, not a stored `rule_type`, so it moves from
    /// `rule_types` to `rule_slugs`.
    pub fn normalized(&self) -> Self {
        let mut filter = self.clone();
        if filter.rule_types.remove(&RuleType::ColorContrast) {
            filter
                .rule_slugs
                .insert(COLOR_CONTRAST_RULE_SLUG.to_string());
        }
        filter
    }
}
