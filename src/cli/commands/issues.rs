//! `a11y issues` command - Filtered issue counts, ids and rows

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use rusqlite::types::Value;
use serde_json::json;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_tsv, truncate_str, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::issue::{IgnoreMode, IssueRecord, RuleType};
use crate::core::query::{BuiltQuery, IssueFilter, IssueStore, Statement};

/// Widest object snippet shown in tables
const OBJECT_WIDTH: usize = 60;

/// What to compute over the matching issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IssueMetric {
    /// Number of matching issues
    Count,
    /// Number of distinct (rule, element) pairs
    Distinct,
    /// Number of distinct posts with a matching issue
    Posts,
    /// Matching issue ids, ascending
    Ids,
    /// Whether the record limit cut the result short
    Truncated,
    /// Matching issue rows
    List,
}

impl IssueMetric {
    fn as_str(&self) -> &'static str {
        match self {
            IssueMetric::Count => "count",
            IssueMetric::Distinct => "distinct",
            IssueMetric::Posts => "posts",
            IssueMetric::Ids => "ids",
            IssueMetric::Truncated => "truncated",
            IssueMetric::List => "list",
        }
    }

    fn statement(&self, query: &BuiltQuery) -> Statement {
        match self {
            IssueMetric::Count => query.count(),
            IssueMetric::Distinct => query.distinct_count(),
            IssueMetric::Posts => query.distinct_post_count(),
            IssueMetric::Ids => query.ids(),
            IssueMetric::Truncated => query.scope_count(),
            IssueMetric::List => query.records(),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct IssuesArgs {
    /// Metric to compute
    #[arg(value_enum)]
    pub metric: IssueMetric,

    /// Post types to include (default: configured scannable post types)
    #[arg(long = "post-type", short = 'p')]
    pub post_types: Vec<String>,

    /// Rule types to include
    #[arg(long = "rule-type", short = 't', value_enum)]
    pub rule_types: Vec<RuleType>,

    /// Rule slugs to include
    #[arg(long = "rule", short = 'r')]
    pub rules: Vec<String>,

    /// How ignored issues are treated
    #[arg(long, value_enum, default_value_t = IgnoreMode::ExcludeIgnored)]
    pub ignored: IgnoreMode,

    /// Match every post type
    #[arg(long, conflicts_with = "post_types")]
    pub all_post_types: bool,

    /// Maximum issue rows considered (default: configured record limit)
    #[arg(long, short = 'n')]
    pub limit: Option<u64>,

    /// Print the generated SQL and bound values to stderr
    #[arg(long)]
    pub explain: bool,
}

impl IssuesArgs {
    fn filter(&self, workspace: &Workspace) -> IssueFilter {
        let limit = self.limit.unwrap_or_else(|| workspace.config.record_limit());
        let filter = IssueFilter::new(limit)
            .with_rule_types(self.rule_types.iter().copied())
            .with_rule_slugs(self.rules.iter().cloned())
            .with_ignore_mode(self.ignored);

        if self.all_post_types {
            filter.with_all_post_types()
        } else if self.post_types.is_empty() {
            filter.with_post_types(workspace.config.scannable_post_types())
        } else {
            filter.with_post_types(self.post_types.iter().cloned())
        }
    }
}

pub fn run(args: IssuesArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let issues = workspace.issues()?;
    let filter = args.filter(&workspace);

    if args.explain {
        let statement = args.metric.statement(&issues.builder().build(&filter));
        eprintln!("{} {}", style("SQL:").bold(), statement.sql);
        eprintln!(
            "{} [{}]",
            style("Params:").bold(),
            statement
                .params
                .iter()
                .map(display_param)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    match compute(&issues, args.metric, &filter)? {
        Outcome::Value(value) => print_result(args.metric, &value, global.format),
        Outcome::Records(records) => print_records(&records, global.format),
    }
}

/// Result of a metric: a scalar or id list, or full rows
enum Outcome {
    Value(serde_json::Value),
    Records(Vec<IssueRecord>),
}

fn compute(issues: &IssueStore<'_>, metric: IssueMetric, filter: &IssueFilter) -> Result<Outcome> {
    let value = match metric {
        IssueMetric::Count => json!(issues.count(filter)?),
        IssueMetric::Distinct => json!(issues.distinct_count(filter)?),
        IssueMetric::Posts => json!(issues.distinct_post_count(filter)?),
        IssueMetric::Ids => json!(issues.ids(filter)?),
        IssueMetric::Truncated => json!(issues.has_truncated_results(filter)?),
        IssueMetric::List => return Ok(Outcome::Records(issues.records(filter)?)),
    };
    Ok(Outcome::Value(value))
}

fn print_result(metric: IssueMetric, value: &serde_json::Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = json!({ "metric": metric.as_str(), "value": value });
            println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let doc = json!({ "metric": metric.as_str(), "value": value });
            print!("{}", serde_yml::to_string(&doc).into_diagnostic()?);
        }
        OutputFormat::Md => match value {
            serde_json::Value::Array(ids) => {
                println!("| id |\n|----|");
                for id in ids {
                    println!("| {} |", id);
                }
            }
            other => println!("| {} |\n|----|\n| {} |", metric.as_str(), other),
        },
        // One value per line so the output pipes cleanly
        OutputFormat::Auto | OutputFormat::Tsv => match value {
            serde_json::Value::Array(ids) => {
                for id in ids {
                    println!("{}", id);
                }
            }
            other => println!("{}", other),
        },
    }
    Ok(())
}

fn print_records(records: &[IssueRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&records).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for r in records {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    r.id,
                    r.post_id,
                    r.post_type,
                    r.rule_slug,
                    r.rule_type,
                    ignored_label(r),
                    escape_tsv(&r.object)
                );
            }
        }
        OutputFormat::Md | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "Post", "Type", "Rule", "Rule Type", "Ignored", "Object"]);
            for r in records {
                builder.push_record([
                    r.id.to_string(),
                    r.post_id.to_string(),
                    r.post_type.clone(),
                    r.rule_slug.clone(),
                    r.rule_type.clone(),
                    ignored_label(r).to_string(),
                    truncate_str(&escape_tsv(&r.object), OBJECT_WIDTH),
                ]);
            }
            if format == OutputFormat::Md {
                println!("{}", builder.build().with(Style::markdown()));
            } else {
                println!("{}", builder.build().with(Style::rounded()));
                println!("{} issue(s) found", style(records.len()).cyan());
            }
        }
    }
    Ok(())
}

fn ignored_label(record: &IssueRecord) -> &'static str {
    match (record.ignored, record.ignored_globally) {
        (_, true) => "global",
        (true, false) => "yes",
        (false, false) => "no",
    }
}

fn display_param(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("{:?}", s),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
