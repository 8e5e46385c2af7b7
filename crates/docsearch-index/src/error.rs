//! Error types for the docsearch-index crate.

use std::{io, path::PathBuf};

use docsearch_query::CompileError;
use thiserror::Error;

/// Errors raised by a search backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("search backend unavailable: {0}")]
    Unavailable(String),

    /// The requested index does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// The backend rejected or failed the request.
    #[error("search backend error: {0}")]
    Failed(String),

    /// A document set could not be indexed.
    #[error("failed to build index {index}: {message}")]
    Index {
        /// Index being built.
        index: String,
        /// Underlying index error.
        message: String,
    },

    /// Failed to read a document set from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A document set is not valid JSON.
    #[error("invalid document set {path}: {source}")]
    Parse {
        /// File that could not be parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl BackendError {
    /// Creates an `Index` error from an index name and a tantivy error.
    pub(crate) fn index(index: &str, source: &tantivy::TantivyError) -> Self {
        Self::Index {
            index: index.to_string(),
            message: source.to_string(),
        }
    }
}

/// Errors that can occur while running a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query tree could not be rendered for the backend.
    #[error("malformed query: {0}")]
    MalformedQuery(#[from] CompileError),

    /// The backend call failed. No partial results are produced.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Why a search request was rejected before reaching the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// No language was given.
    #[error("missing language")]
    MissingLanguage,

    /// No version was given.
    #[error("missing version")]
    MissingVersion,

    /// The query does not render, has no terms, or has a term that is too short.
    #[error("invalid query syntax")]
    InvalidSyntax,
}

impl RejectReason {
    /// Machine-readable reason code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingLanguage => "missing-language",
            Self::MissingVersion => "missing-version",
            Self::InvalidSyntax => "invalid-syntax",
        }
    }
}
