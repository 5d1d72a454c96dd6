//! `a11y init` command - Initialize a new project

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::{Config, Database};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
    }

    let project = match Project::init(&path) {
        Ok(project) => {
            if !global.quiet {
                println!(
                    "{} Initialized a11y project at {}",
                    style("✓").green(),
                    style(project.root().display()).cyan()
                );
            }
            project
        }
        Err(ProjectError::AlreadyExists(root)) => {
            if !global.quiet {
                println!(
                    "{} a11y project already exists at {}",
                    style("!").yellow(),
                    style(root.display()).cyan()
                );
            }
            Project::discover_from(&path).map_err(|e| miette::miette!("{}", e))?
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    // Schema creation is idempotent, so re-running init repairs a missing table
    let config = Config::load(Some(&project));
    let db = Database::open(&project.database_path())?;
    db.ensure_issue_table(config.issue_table())?;

    if !global.quiet {
        println!(
            "  Database: {}",
            style(project.database_path().display()).dim()
        );
        println!();
        println!("Next steps:");
        println!(
            "  {} Show the site summary",
            style("a11y summary").yellow()
        );
        println!(
            "  {} Count open errors",
            style("a11y issues count --rule-type error").yellow()
        );
    }
    Ok(())
}
