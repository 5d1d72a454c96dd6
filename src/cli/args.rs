//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cache::CacheCommands, completions::CompletionsArgs, init::InitArgs, issues::IssuesArgs,
    summary::SummaryArgs,
};

#[derive(Parser)]
#[command(name = "a11y")]
#[command(author, version, about = "Accessibility scan insights")]
#[command(long_about = "Query stored accessibility issues and report cached site and post type summaries.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .a11y/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new a11y project
    Init(InitArgs),

    /// Show the site-wide or per post type scan summary
    Summary(SummaryArgs),

    /// Count and list stored issues
    Issues(IssuesArgs),

    /// Manage cached summaries
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// Markdown tables
    Md,
}
