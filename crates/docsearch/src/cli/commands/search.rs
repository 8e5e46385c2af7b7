//! Implementation of `docsearch search`.

use std::process::ExitCode;

use docsearch_index::Searcher;

use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{print_json, print_response},
};

/// Searches the corpus and prints the results.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let search = match ctx.validate(&cmd.request) {
        Ok(search) => search,
        Err(code) => return code,
    };

    let backend = match ctx.backend(cmd.corpus.as_deref()) {
        Ok(backend) => backend,
        Err(code) => return code,
    };

    let response = match Searcher::new(backend).search_validated(&search) {
        Ok(response) => response,
        Err(e) => {
            eprintln!("error: search failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return print_json(&response);
    }

    print_response(&response);
    ExitCode::SUCCESS
}
