//! Implementation of `docsearch request`.

use std::process::ExitCode;

use docsearch_index::RankingQueryBuilder;

use crate::cli::{args::RequestCommand, context::CommandContext};

/// Prints the backend query document for a validated request.
pub fn run(ctx: &CommandContext, cmd: &RequestCommand) -> ExitCode {
    let search = match ctx.validate(&cmd.request) {
        Ok(search) => search,
        Err(code) => return code,
    };

    let request = match RankingQueryBuilder::new(&search.index, &search.query)
        .pagination(search.options.pagination())
        .highlight(search.options.highlight.clone())
        .build()
    {
        Ok(request) => request,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match request.to_json() {
        Ok(json) => {
            eprintln!("index: {}", request.index);
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize request: {e}");
            ExitCode::FAILURE
        }
    }
}
