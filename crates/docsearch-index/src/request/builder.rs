//! Ranking query construction.

use std::collections::BTreeMap;

use docsearch_query::{CompileError, QueryString};

use super::{
    Aggregation, BoolQuery, COLLAPSE_COUNT, Cardinality, Collapse, CombineMode, Field, FieldBoost,
    FunctionScoreQuery, Highlight, HighlightField, Operator, Query, QueryStringQuery,
    ScoreFunction, SearchRequest, SortClause, SortKey, SortOrder,
};
use crate::options::{HighlightOptions, Pagination};

/// Boost for prefix matches in the breadcrumb hierarchy.
const HIERARCHY_BOOST: f64 = 10.0;

/// Boost for prefix matches in the section body.
const CONTENTS_BOOST: f64 = 2.0;

/// Boost for the optional title clause.
const TITLE_BOOST: f64 = 4.0;

/// Allowed distance between phrase terms in the required clauses.
const PHRASE_SLOP: u32 = 2;

/// Score lost by the deepest nested section of a page.
const NESTING_DECAY_RANGE: f64 = 0.2;

/// Score lost by the last section of a page.
const POSITION_DECAY_RANGE: f64 = 0.1;

/// Multiplier for low-priority documents.
const LOW_PRIORITY_FACTOR: f64 = 0.1;

/// Keyword field results are collapsed and counted on.
const PAGE_URL: &str = "page_url";

/// Precision threshold of the distinct page count.
const PRECISION_THRESHOLD: u32 = 600;

/// Approximate length of a contents highlight fragment.
const CONTENTS_FRAGMENT_SIZE: usize = 60;

/// Maximum contents highlight fragments per hit.
const CONTENTS_FRAGMENTS: usize = 3;

/// Builds the backend request for one search.
///
/// The request requires a prefix match in the hierarchy or contents, or a fuzzy match in the
/// hierarchy. An exact-ish title match adds score. The combined score is multiplied by a
/// nesting decay, a position decay, and a low-priority deboost. Results collapse on the page
/// URL, with a distinct page count standing in for the total.
#[derive(Debug, Clone)]
pub struct RankingQueryBuilder<'a> {
    /// Compiled user query.
    query: &'a QueryString,
    /// Target index.
    index: String,
    /// Page window.
    pagination: Pagination,
    /// Highlight markers and encoding.
    highlight: HighlightOptions,
}

impl<'a> RankingQueryBuilder<'a> {
    /// Starts a request for `query` against `index`, first page with default options.
    pub fn new(index: impl Into<String>, query: &'a QueryString) -> Self {
        Self {
            query,
            index: index.into(),
            pagination: Pagination::clamp(1, 10),
            highlight: HighlightOptions::default(),
        }
    }

    /// Sets the page window.
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets highlight markers and encoding.
    pub fn highlight(mut self, highlight: HighlightOptions) -> Self {
        self.highlight = highlight;
        self
    }

    /// Builds the request.
    ///
    /// Fails only when the query tree cannot be rendered.
    pub fn build(&self) -> Result<SearchRequest, CompileError> {
        let prefix = self.query.to_prefix()?;
        let fuzzy = self.query.to_fuzzy()?;

        let required = BoolQuery {
            must: Vec::new(),
            should: vec![
                Query::QueryString(QueryStringQuery {
                    query: prefix.clone(),
                    fields: vec![
                        FieldBoost::boosted(Field::Hierarchy, HIERARCHY_BOOST),
                        FieldBoost::boosted(Field::Contents, CONTENTS_BOOST),
                    ],
                    default_operator: Operator::And,
                    phrase_slop: Some(PHRASE_SLOP),
                    boost: None,
                }),
                Query::QueryString(QueryStringQuery {
                    query: fuzzy,
                    fields: vec![FieldBoost::plain(Field::Hierarchy)],
                    default_operator: Operator::And,
                    phrase_slop: Some(PHRASE_SLOP),
                    boost: None,
                }),
            ],
            minimum_should_match: Some(1),
        };

        let title = Query::QueryString(QueryStringQuery {
            query: prefix,
            fields: vec![FieldBoost::plain(Field::Title)],
            default_operator: Operator::And,
            phrase_slop: None,
            boost: Some(TITLE_BOOST),
        });

        let query = Query::FunctionScore(FunctionScoreQuery {
            query: Box::new(Query::Bool(BoolQuery {
                must: vec![Query::Bool(required)],
                should: vec![title],
                minimum_should_match: None,
            })),
            functions: vec![
                ScoreFunction::NestingDecay {
                    range: NESTING_DECAY_RANGE,
                },
                ScoreFunction::PositionDecay {
                    range: POSITION_DECAY_RANGE,
                },
                ScoreFunction::PriorityDeboost {
                    factor: LOW_PRIORITY_FACTOR,
                },
            ],
            score_mode: CombineMode::Multiply,
            boost_mode: CombineMode::Multiply,
        });

        Ok(SearchRequest {
            index: self.index.clone(),
            from: self.pagination.offset,
            size: self.pagination.limit,
            query,
            sort: vec![
                SortClause {
                    key: SortKey::Score,
                    order: SortOrder::Desc,
                },
                SortClause {
                    key: SortKey::Field(String::from("position")),
                    order: SortOrder::Asc,
                },
            ],
            collapse: Collapse {
                field: String::from(PAGE_URL),
            },
            aggs: BTreeMap::from([(
                String::from(COLLAPSE_COUNT),
                Aggregation::Cardinality(Cardinality {
                    field: String::from(PAGE_URL),
                    precision_threshold: PRECISION_THRESHOLD,
                }),
            )]),
            highlight: self.build_highlight(),
        })
    }

    /// Highlight spec: fragmented contents, whole hierarchy values.
    fn build_highlight(&self) -> Highlight {
        Highlight {
            pre_tags: vec![self.highlight.pre_tag.clone()],
            post_tags: vec![self.highlight.post_tag.clone()],
            encoder: self.highlight.encoder,
            fields: BTreeMap::from([
                (
                    Field::Contents,
                    HighlightField {
                        fragment_size: Some(CONTENTS_FRAGMENT_SIZE),
                        number_of_fragments: CONTENTS_FRAGMENTS,
                    },
                ),
                (
                    Field::Hierarchy,
                    HighlightField {
                        fragment_size: None,
                        number_of_fragments: 0,
                    },
                ),
            ]),
        }
    }
}
