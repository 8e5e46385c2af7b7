//! Ranking and highlight reconciliation for documentation search.
//!
//! This crate turns a compiled [`QueryString`](docsearch_query::QueryString) into a
//! backend search request and the backend's answer into caller-facing results. It handles:
//! - Validation of caller parameters against configuration
//! - Building the ranking request: prefix and fuzzy alternatives, title boost, nesting,
//!   position and priority decay, page collapsing and highlighting
//! - Reconciling highlighted breadcrumbs with their positions in the hierarchy
//! - An in-memory backend that runs requests on RAM tantivy indexes built from JSON
//!   document sets
//!
//! # Example
//!
//! ```no_run
//! use docsearch_index::{MemoryBackend, SearchOptions, Searcher};
//! use docsearch_query::QueryString;
//!
//! let backend = MemoryBackend::from_dir("./corpus".as_ref()).unwrap();
//! let searcher = Searcher::new(backend);
//! let query = QueryString::new("view cells");
//! let response = searcher
//!     .search("cake-docs-5-en", &query, &SearchOptions::default())
//!     .unwrap();
//! println!("{} pages matched", response.total);
//! ```

#![warn(missing_docs)]

mod backend;
mod document;
mod error;
pub mod html;
mod options;
mod params;
mod reconcile;
mod request;
mod response;
mod searcher;

pub use backend::{MemoryBackend, SearchBackend};
pub use document::{Document, DocumentKind, Priority};
pub use error::{BackendError, RejectReason, SearchError};
pub use options::{
    Encoder, HighlightOptions, MAX_LIMIT, MAX_RESULT_WINDOW, MIN_LIMIT, Pagination,
    SearchOptions,
};
pub use params::{SearchParams, ValidatedSearch};
pub use reconcile::{CONTENTS_EXCERPT_CHARS, reconcile, reconcile_hierarchy};
pub use request::{
    Aggregation, BoolQuery, COLLAPSE_COUNT, Cardinality, Collapse, CombineMode, Field,
    FieldBoost, FunctionScoreQuery, Highlight, HighlightField, Operator, Query,
    QueryStringQuery, RankingQueryBuilder, ScoreFunction, SearchRequest, SortClause, SortKey,
    SortOrder,
};
pub use response::{
    AggregationValue, BackendResponse, Highlights, Hit, Hits, SearchResponse, SearchResult,
};
pub use searcher::Searcher;
