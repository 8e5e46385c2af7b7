//! Search orchestration.
//!
//! A [`Searcher`] builds the ranking request for a query, runs it on a backend and turns
//! the hits into caller-facing results.

use docsearch_query::QueryString;
use tracing::{debug, warn};

use crate::{
    backend::SearchBackend,
    error::SearchError,
    options::SearchOptions,
    params::ValidatedSearch,
    reconcile::reconcile,
    request::RankingQueryBuilder,
    response::SearchResponse,
};

/// Runs searches against a backend.
pub struct Searcher<B> {
    /// Backend receiving the requests.
    backend: B,
}

impl<B: SearchBackend> Searcher<B> {
    /// Creates a searcher over `backend`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Searches `index` for `query`.
    ///
    /// The reported page is the clamped page. `total` counts distinct pages, not sections.
    pub fn search(
        &self,
        index: &str,
        query: &QueryString,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let pagination = options.pagination();
        let request = RankingQueryBuilder::new(index, query)
            .pagination(pagination)
            .highlight(options.highlight.clone())
            .build()?;
        debug!(
            index,
            page = pagination.page,
            limit = pagination.limit,
            offset = pagination.offset,
            "built search request"
        );

        let response = self.backend.search(&request).inspect_err(|e| {
            warn!(index, error = %e, "search backend call failed");
        })?;

        let data: Vec<_> = response
            .hits
            .hits
            .iter()
            .map(|hit| reconcile(hit, &options.highlight))
            .collect();
        let total = response.collapse_count();
        debug!(hits = data.len(), total, "reconciled search response");

        Ok(SearchResponse {
            page: pagination.page,
            total,
            data,
            terms: query.extract_matchable_terms(),
        })
    }

    /// Runs a validated caller request.
    pub fn search_validated(&self, search: &ValidatedSearch) -> Result<SearchResponse, SearchError> {
        self.search(&search.index, &search.query, &search.options)
    }
}
