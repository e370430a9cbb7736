//! Davtree CLI - Command-line utility for safe tree export, access checks
//! and cache tags.

mod cli;
mod commands;
mod config;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let config = config::FileConfig::load(cli.config.as_deref())?;

    match &cli.command {
        cli::Commands::Export(args) => {
            commands::export::execute(args, &config, &*formatter, cli.quiet || cli.json)
        }
        cli::Commands::Walk(args) => commands::walk::execute(args, &*formatter),
        cli::Commands::Etag(args) => commands::etag::execute(args, &*formatter),
        cli::Commands::Check(args) => commands::check::execute(args, &config, &*formatter),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` overrides the
/// flag-derived level.
fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
