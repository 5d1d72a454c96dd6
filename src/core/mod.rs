//! Core module - issue queries, statistics and their storage

pub mod cache;
pub mod clock;
pub mod config;
pub mod format;
pub mod issue;
pub mod posts;
pub mod project;
pub mod query;
pub mod rules;
pub mod scan;
pub mod stats;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheStore, MemoryCacheStore, SqliteCacheStore};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use format::{Formatter, PlainFormatter};
pub use issue::{IgnoreMode, RuleType};
pub use posts::{PostPopulation, SqlitePostPopulation};
pub use project::{Project, ProjectError};
pub use query::{IssueFilter, IssueStore, QueryBuilder, QueryError};
pub use rules::{RuleDefinition, RuleRegistry, RuleSet};
pub use scan::{OptionScanOrchestrator, ScanOrchestrator, ScanState};
pub use stats::{CacheState, PostTypeSummary, StatsAggregator, StatsSettings, SummaryRecord};
pub use store::Database;
