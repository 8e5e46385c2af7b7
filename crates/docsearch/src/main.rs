//! Command-line interface for docsearch.
//!
//! Compiles documentation search queries, shows the ranking request they produce and runs
//! them against a corpus of JSON document sets.

mod cli;

use std::{env, io, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{
    CommandContext,
    args::{Cli, Commands},
    commands,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "DOCSEARCH_LOG";

/// Installs the stderr log subscriber, filtered by `DOCSEARCH_LOG` (default `warn`).
fn init_tracing() {
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("warning: logging unavailable: {e}");
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let ctx = match cli.command {
        Commands::Init(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(),
    };
    match ctx {
        Ok(ctx) => commands::run(cli.command, &ctx),
        Err(code) => code,
    }
}
