//! Query language compiler for docsearch.
//!
//! User queries are written in a small boolean language:
//!
//! - **Words**: `controller` - terms that should appear
//! - **Phrases**: `"save data"` - exact sequences
//! - **Mandatory / prohibited**: `+orm -legacy`
//! - **Boolean keywords**: `AND`, `OR`, `NOT` (also `&&`, `||`, `!`)
//! - **Grouping**: `(a b) OR c` - precedence control
//!
//! Input is parsed leniently, sanitized, and rendered back into the backend's
//! query-string syntax in three forms: exact, fuzzy (`term~`) and prefix
//! (`term*`).
//!
//! # Example
//!
//! ```
//! use docsearch_query::QueryString;
//!
//! let query = QueryString::new("save* -delete");
//! assert!(query.is_compilable());
//! assert_eq!(query.to_fuzzy().unwrap(), "save~ -delete~");
//! assert_eq!(query.extract_matchable_terms(), vec!["save"]);
//! ```

#![warn(missing_docs)]

mod ast;
mod compiler;
mod error;
mod generate;
mod lexer;
mod parser;
mod sanitize;

pub use ast::{Node, SyntaxTree};
pub use compiler::QueryString;
pub use error::CompileError;
pub use generate::{Generator, TermModifier};
pub use lexer::{Token, tokenize};
pub use parser::parse;
pub use sanitize::sanitize;
