//! `docsearch init`: writes a starter `.docsearch.toml`.

use std::{fs, process::ExitCode};

use docsearch_config::TemplateScope;
use tracing::debug;

use crate::cli::{args::InitCommand, context::CommandContext, output::subheader};

/// Writes the starter file for the scope the command resolves to.
///
/// An existing file is only replaced with `--force`.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let scope = TemplateScope::for_dir(&ctx.cwd, cmd.global);
    let Some(target) = scope.target(&ctx.cwd) else {
        eprintln!("error: no home directory to write ~/.docsearch.toml into");
        return ExitCode::FAILURE;
    };

    if target.exists() && !cmd.force {
        eprintln!("error: {} already exists", target.display());
        eprintln!("rerun with --force to replace it");
        return ExitCode::FAILURE;
    }

    let starter = scope.starter();
    if let Err(e) = fs::write(&target, &starter) {
        eprintln!("error: cannot write {}: {e}", target.display());
        return ExitCode::FAILURE;
    }
    debug!(?scope, path = %target.display(), "wrote starter config");

    println!("Wrote {}", target.display());
    println!();
    println!("{}", subheader("Configuration written:"));
    for line in starter.lines() {
        println!("   {line}");
    }

    ExitCode::SUCCESS
}
