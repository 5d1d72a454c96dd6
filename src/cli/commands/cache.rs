//! `a11y cache` command - Manage cached summaries
//!
//! Summaries live in the `transients` table of the project database:
//! - One site-wide entry
//! - One entry per public post type
//!
//! Entries go stale after the configured TTL or when a full scan completes.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::CacheKey;
use crate::core::posts::PostPopulation;
use crate::core::stats::CacheState;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Recompute and store every summary
    Load,

    /// Remove every cached summary and purge expired entries
    Clear,

    /// Show the freshness of each cached summary
    Status,
}

pub fn run(cmd: CacheCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CacheCommands::Load => run_load(global),
        CacheCommands::Clear => run_clear(global),
        CacheCommands::Status => run_status(global),
    }
}

fn run_load(global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;

    if !global.quiet {
        println!("{} Loading summary cache...", style("→").blue());
    }
    let stats = workspace.with_stats(|stats| Ok(stats.load_cache()?))?;

    if global.quiet {
        return Ok(());
    }
    println!(
        "{} Cache loaded in {}ms",
        style("✓").green(),
        stats.duration_ms
    );
    if stats.summary_stored {
        println!("  Site summary: {}", style("stored").green());
    } else {
        println!("  Site summary: {}", style("skipped (no scannable posts)").yellow());
    }
    println!("  Post types:   {}", style(stats.post_types.join(", ")).cyan());
    Ok(())
}

fn run_clear(global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;

    let cleared = workspace.with_stats(|stats| Ok(stats.clear_cache()))?;
    let purged = workspace.cache().purge_expired().into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Cleared {} summary key(s), purged {} expired entr{}",
            style("✓").green(),
            cleared,
            purged,
            if purged == 1 { "y" } else { "ies" }
        );
    }
    Ok(())
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;
    let keys = CacheKey::all(workspace.posts()?.public_post_types());

    let rows: Vec<(String, String, CacheState)> = workspace.with_stats(|stats| {
        Ok(keys
            .iter()
            .map(|key| {
                let scope = match key {
                    CacheKey::SiteWide => "site".to_string(),
                    CacheKey::ByPostType(post_type) => post_type.clone(),
                };
                (scope, stats.cache_id(key), stats.cache_state(key))
            })
            .collect())
    })?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let doc: Vec<_> = rows
                .iter()
                .map(|(scope, id, state)| json!({ "scope": scope, "key": id, "state": state.to_string() }))
                .collect();
            if global.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&doc).into_diagnostic()?);
            }
        }
        OutputFormat::Tsv => {
            for (scope, id, state) in &rows {
                println!("{}\t{}\t{}", scope, id, state);
            }
        }
        OutputFormat::Md | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["Scope", "Key", "State"]);
            for (scope, id, state) in &rows {
                builder.push_record([scope.clone(), id.clone(), state.to_string()]);
            }
            if global.format == OutputFormat::Md {
                println!("{}", builder.build().with(Style::markdown()));
            } else {
                println!("{}", style("Cache Status").bold());
                println!("  Location: {}", workspace.project.database_path().display());
                println!("{}", builder.build().with(Style::rounded()));
            }
        }
    }
    Ok(())
}
