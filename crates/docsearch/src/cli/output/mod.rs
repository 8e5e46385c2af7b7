//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use docsearch_index::SearchResponse;
use serde::Serialize;

/// ANSI escape codes used by the text output.
mod colors {
    /// Resets all attributes.
    pub const RESET: &str = "\x1b[0m";
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Dimmed text.
    pub const DIM: &str = "\x1b[2m";
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Prints a search response as a summary line and a results table.
pub fn print_response(response: &SearchResponse) {
    println!(
        "{}",
        subheader(&format!(
            "Page {} of results, {} matching pages",
            response.page, response.total
        ))
    );
    println!("{}", dim(&format!("terms: {}", response.terms.join(", "))));

    if response.data.is_empty() {
        println!("{}", dim("(no results on this page)"));
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "Section", "URL", "Excerpt"]);

    for (rank, result) in response.data.iter().enumerate() {
        let hierarchy = if result.highlights.hierarchy.is_empty() {
            &result.hierarchy
        } else {
            &result.highlights.hierarchy
        };
        let excerpt = result
            .highlights
            .contents
            .first()
            .unwrap_or(&result.contents);
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(hierarchy.join(" › ")),
            Cell::new(&result.url),
            Cell::new(excerpt),
        ]);
    }

    println!("{table}");
}
