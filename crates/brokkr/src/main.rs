//! Brokkr CLI - clone and engine management for the Brokkr toolkit
//!
//! This is the main entry point for the Brokkr command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    // Run command
    match cli.command {
        Commands::Clone(args) => commands::clone::run(args).await,
        Commands::Clones(args) => commands::clones::run(args).await,
        Commands::Version(args) => commands::version::run(args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
