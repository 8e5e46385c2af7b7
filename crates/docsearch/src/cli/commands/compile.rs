//! Implementation of `docsearch compile`.

use std::process::ExitCode;

use docsearch_query::{CompileError, QueryString};
use serde::Serialize;

use crate::cli::{
    args::CompileCommand,
    output::{dim, print_json, subheader},
};

/// JSON output for `docsearch compile`.
#[derive(Serialize)]
struct CompileOutput {
    /// Raw input.
    input: String,
    /// Whether the query renders.
    compilable: bool,
    /// Exact form, absent when the query does not render.
    exact: Option<String>,
    /// Fuzzy form.
    fuzzy: Option<String>,
    /// Prefix form.
    prefix: Option<String>,
    /// Every term, prohibited ones included.
    terms: Vec<String>,
    /// Terms that can produce matches.
    matchable_terms: Vec<String>,
    /// Number of terms.
    term_count: usize,
    /// Length of the shortest term in characters.
    shortest_term_length: Option<usize>,
}

impl CompileOutput {
    /// Collects every view of `query`.
    fn new(query: &QueryString) -> Self {
        Self {
            input: query.tree().input().to_string(),
            compilable: query.is_compilable(),
            exact: query.to_exact().ok(),
            fuzzy: query.to_fuzzy().ok(),
            prefix: query.to_prefix().ok(),
            terms: query.extract_terms(),
            matchable_terms: query.extract_matchable_terms(),
            term_count: query.term_count(),
            shortest_term_length: query.shortest_term_length(),
        }
    }
}

/// Prints the syntax tree and compiled forms of a query.
pub fn run(cmd: &CompileCommand) -> ExitCode {
    let query = QueryString::new(&cmd.query);

    if cmd.json {
        return print_json(&CompileOutput::new(&query));
    }

    println!("{}", subheader("Syntax tree:"));
    match query.tree().root() {
        Some(root) => {
            for line in root.to_string().lines() {
                println!("   {line}");
            }
        }
        None => println!("   {}", dim("(empty query)")),
    }
    println!();

    println!("{}", subheader("Compiled:"));
    print_form("exact", query.to_exact());
    print_form("fuzzy", query.to_fuzzy());
    print_form("prefix", query.to_prefix());
    println!();

    println!("{}", subheader("Terms:"));
    println!("   all:       {}", query.extract_terms().join(", "));
    println!("   matchable: {}", query.extract_matchable_terms().join(", "));
    println!("   count:     {}", query.term_count());
    match query.shortest_term_length() {
        Some(len) => println!("   shortest:  {len}"),
        None => println!("   shortest:  {}", dim("(no terms)")),
    }
    println!();
    println!("compilable: {}", query.is_compilable());

    ExitCode::SUCCESS
}

/// Prints one compiled form, or the reason it failed.
fn print_form(name: &str, form: Result<String, CompileError>) {
    match form {
        Ok(text) => println!("   {name:7} {text}"),
        Err(e) => println!("   {name:7} {}", dim(&format!("({e})"))),
    }
}
