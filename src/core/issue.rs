//! Issue record vocabulary: rule types and ignore modes

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Rule slug that stands in for the `color_contrast` pseudo-type
pub const COLOR_CONTRAST_RULE_SLUG: &str = "color_contrast_failure";

/// Type of a rule as used in issue filters
///
/// Storage only knows `error` and `warning`. `ColorContrast` is a
/// filter-level alias for the `color_contrast_failure` rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Error,
    Warning,
    ColorContrast,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Error => "error",
            RuleType::Warning => "warning",
            RuleType::ColorContrast => "color_contrast",
        }
    }

    /// Whether this value exists as a `rule_type` column value
    pub fn is_stored(&self) -> bool {
        !matches!(self, RuleType::ColorContrast)
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(RuleType::Error),
            "warning" => Ok(RuleType::Warning),
            "color_contrast" | "color-contrast" => Ok(RuleType::ColorContrast),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

/// How ignored issues take part in a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreMode {
    /// Only issues that are neither ignored nor globally ignored
    #[default]
    #[value(name = "exclude")]
    ExcludeIgnored,
    /// No ignore predicate at all
    #[value(name = "include")]
    IncludeIgnored,
    /// Only issues that are ignored or globally ignored
    #[value(name = "only")]
    OnlyIgnored,
}

impl std::fmt::Display for IgnoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreMode::ExcludeIgnored => write!(f, "exclude"),
            IgnoreMode::IncludeIgnored => write!(f, "include"),
            IgnoreMode::OnlyIgnored => write!(f, "only"),
        }
    }
}

/// One detected accessibility issue instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: i64,
    pub site_id: i64,
    pub post_id: i64,
    pub post_type: String,
    pub rule_slug: String,
    /// Stored rule type (`error` or `warning`)
    pub rule_type: String,
    /// Object signature, usually the offending HTML
    pub object: String,
    pub ignored: bool,
    pub ignored_globally: bool,
}
