//! Backend responses and the caller-facing result shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{document::Document, request::COLLAPSE_COUNT};

/// Raw backend response, in Elasticsearch response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    /// Returned hits.
    pub hits: Hits,
    /// Aggregation results by name.
    #[serde(default)]
    pub aggregations: BTreeMap<String, AggregationValue>,
}

impl BackendResponse {
    /// Distinct page count after collapsing, zero when the aggregation is missing.
    pub fn collapse_count(&self) -> u64 {
        self.aggregations
            .get(COLLAPSE_COUNT)
            .map_or(0, |agg| agg.value)
    }
}

/// Hit list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    /// Hits for the requested window, best first.
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One matched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Final score.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Stored document.
    #[serde(rename = "_source")]
    pub source: Document,
    /// Highlighted fragments by field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub highlight: BTreeMap<String, Vec<String>>,
}

impl Hit {
    /// Highlighted fragments for `field`, empty when none were returned.
    pub fn highlights(&self, field: &str) -> &[String] {
        self.highlight.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Single-value aggregation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationValue {
    /// Aggregated value.
    pub value: u64,
}

/// Response returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Page number after clamping.
    pub page: usize,
    /// Approximate number of distinct matching pages.
    pub total: u64,
    /// Results for the page.
    pub data: Vec<SearchResult>,
    /// Terms that contribute to matching.
    pub terms: Vec<String>,
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Section URL, or the external URL.
    pub url: String,
    /// URL of the containing page.
    pub page_url: String,
    /// Nesting level within the page.
    pub level: u32,
    /// Position within the page.
    pub position: u32,
    /// Breadcrumb titles, root first.
    pub hierarchy: Vec<String>,
    /// Leading excerpt of the contents, or the URL for external documents.
    pub contents: String,
    /// Highlighted text.
    pub highlights: Highlights,
}

/// Highlighted text of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Highlights {
    /// Contents fragments as returned by the backend.
    pub contents: Vec<String>,
    /// Hierarchy with highlighted entries in place, or empty when nothing matched.
    pub hierarchy: Vec<String>,
}
