use a11y::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let default_filter = if global.verbose { "a11y=info" } else { "a11y=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init(args) => a11y::cli::commands::init::run(args, &global),
        Commands::Summary(args) => a11y::cli::commands::summary::run(args, &global),
        Commands::Issues(args) => a11y::cli::commands::issues::run(args, &global),
        Commands::Cache(cmd) => a11y::cli::commands::cache::run(cmd, &global),
        Commands::Completions(args) => a11y::cli::commands::completions::run(args),
    }
}
