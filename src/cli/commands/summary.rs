//! `a11y summary` command - Site-wide and per post type statistics

use console::style;
use miette::Result;

use crate::cli::helpers::{print_record, Workspace};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Summarize a single post type instead of the whole site
    #[arg(long, short = 'p')]
    pub post_type: Option<String>,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::open(global)?;

    let (title, record, cache_hit) = workspace.with_stats(|stats| match &args.post_type {
        Some(post_type) => {
            let summary = stats.issues_summary_by_post_type(post_type)?;
            Ok((
                format!("Issues for post type '{}'", post_type),
                summary.to_flat_map(),
                summary.cache.cache_hit,
            ))
        }
        None => {
            let summary = stats.summary()?;
            Ok((
                "Scan summary".to_string(),
                summary.to_flat_map(),
                summary.cache.cache_hit,
            ))
        }
    })?;

    print_record(&title, &record, global.format)?;

    if global.verbose && !global.quiet {
        let source = if cache_hit { "cache" } else { "fresh query" };
        eprintln!("{} served from {}", style("→").blue(), source);
    }
    Ok(())
}
