//! Clap argument definitions for the `docsearch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docsearch_index::SearchParams;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Documentation search - query compiler and ranking engine")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Request parameters shared by `search` and `request`.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Query text
    pub query: String,

    /// Documentation language, e.g. en
    #[arg(short = 'l', long)]
    pub lang: Option<String>,

    /// Documentation version; legacy aliases are accepted
    #[arg(short = 'V', long)]
    pub version: Option<String>,

    /// Page number, clamped to the result window [default: 1]
    #[arg(short = 'p', long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Results per page, clamped to 1-100 [default: from config]
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Marker before highlighted matches [default: from config]
    #[arg(long)]
    pub pre_tag: Option<String>,

    /// Marker after highlighted matches [default: from config]
    #[arg(long)]
    pub post_tag: Option<String>,

    /// Output encoder: html escapes results, anything else leaves them as stored
    #[arg(long)]
    pub encoder: Option<String>,
}

impl RequestArgs {
    /// Converts the flags into caller parameters.
    pub fn to_params(&self) -> SearchParams {
        SearchParams {
            lang: self.lang.clone(),
            version: self.version.clone(),
            q: Some(self.query.clone()),
            page: self.page,
            limit: self.limit,
            highlight_pre_tag: self.pre_tag.clone(),
            highlight_post_tag: self.post_tag.clone(),
            encoder: self.encoder.clone(),
        }
    }
}

/// Arguments for `docsearch search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    /// Request parameters.
    pub request: RequestArgs,

    /// Directory of <index>.json document sets [default: backend.corpus]
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `docsearch compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    /// Query text
    pub query: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `docsearch request`.
#[derive(Args, Debug, Clone)]
pub struct RequestCommand {
    #[command(flatten)]
    /// Request parameters.
    pub request: RequestArgs,
}

/// Arguments for `docsearch init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.docsearch.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `docsearch` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search a documentation corpus
    Search(SearchCommand),

    /// Show how a query is parsed and compiled
    Compile(CompileCommand),

    /// Print the backend request for a query
    Request(RequestCommand),

    /// Show effective configuration settings
    Config,

    /// Initialize docsearch configuration in current directory
    Init(InitCommand),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn request_flags_become_params() {
        let cli = Cli::parse_from([
            "docsearch", "search", "view cells", "--lang", "en", "--version", "4-0", "--page",
            "-3", "--encoder", "html",
        ]);
        let Commands::Search(cmd) = cli.command else {
            panic!("expected search command");
        };
        let params = cmd.request.to_params();
        assert_eq!(params.q.as_deref(), Some("view cells"));
        assert_eq!(params.lang.as_deref(), Some("en"));
        assert_eq!(params.version.as_deref(), Some("4-0"));
        assert_eq!(params.page, Some(-3));
        assert_eq!(params.limit, None);
        assert_eq!(params.encoder.as_deref(), Some("html"));
    }
}
