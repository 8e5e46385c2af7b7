//! Error types for query compilation.
//!
//! Lexing and parsing never fail: malformed input degrades to a best-effort
//! tree. The only failure is rendering a tree that has no textual form.

use thiserror::Error;

/// Failure to render a syntax tree back into query text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A word term carries no text and cannot be written out.
    #[error("cannot render an empty word term")]
    EmptyWord,
}
