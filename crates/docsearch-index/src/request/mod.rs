//! Backend request documents.
//!
//! A [`SearchRequest`] is built once per search and never mutated afterwards. It serializes to
//! an Elasticsearch query document, and [`MemoryBackend`](crate::MemoryBackend) compiles the
//! same value into tantivy queries.

mod builder;

use std::{collections::BTreeMap, fmt};

pub use builder::RankingQueryBuilder;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{document::Document, options::Encoder};

/// Name of the distinct page count aggregation.
pub const COLLAPSE_COUNT: &str = "collapse_count";

/// A complete request to a search backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    /// Index to search. Addressed out of band, not part of the query document.
    #[serde(skip)]
    pub index: String,
    /// Number of collapsed hits to skip.
    pub from: usize,
    /// Number of collapsed hits to return.
    pub size: usize,
    /// Scoring query.
    pub query: Query,
    /// Sort order, most significant first.
    pub sort: Vec<SortClause>,
    /// Field collapsing.
    pub collapse: Collapse,
    /// Named aggregations.
    pub aggs: BTreeMap<String, Aggregation>,
    /// Highlighting directives.
    pub highlight: Highlight,
}

impl SearchRequest {
    /// Renders the query document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A query clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Base query whose score is adjusted by per-document functions.
    FunctionScore(FunctionScoreQuery),
    /// Boolean combination of clauses.
    Bool(BoolQuery),
    /// Query-language string matched against fields.
    QueryString(QueryStringQuery),
}

/// Boolean combination of clauses.
///
/// With `must` clauses present, `should` clauses only add score. Without them at least
/// `minimum_should_match` (default 1) must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    /// Clauses that must all match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    /// Optional clauses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    /// Number of `should` clauses that must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<usize>,
}

/// A query-language string matched against one or more fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStringQuery {
    /// Query text.
    pub query: String,
    /// Fields to search, with per-field boosts.
    pub fields: Vec<FieldBoost>,
    /// Operator between clauses that have no explicit operator.
    pub default_operator: Operator,
    /// Allowed distance between phrase terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase_slop: Option<u32>,
    /// Query-level score multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

/// Default operator of a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    /// Every clause is required.
    And,
    /// Clauses are optional.
    Or,
}

/// Full-text fields of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Section title.
    Title,
    /// Breadcrumb titles. Multi-valued.
    Hierarchy,
    /// Section body.
    Contents,
}

impl Field {
    /// Field name as stored in the backend.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Hierarchy => "hierarchy",
            Self::Contents => "contents",
        }
    }

    /// Stored values of this field in `doc`.
    pub fn values(self, doc: &Document) -> Vec<&str> {
        match self {
            Self::Title => vec![doc.title.as_str()],
            Self::Hierarchy => doc.hierarchy.iter().map(String::as_str).collect(),
            Self::Contents => vec![doc.contents.as_str()],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A searched field with an optional boost, serialized as `field^boost`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBoost {
    /// Searched field.
    pub field: Field,
    /// Score multiplier for matches in this field.
    pub boost: Option<f64>,
}

impl FieldBoost {
    /// A field without boost.
    pub const fn plain(field: Field) -> Self {
        Self { field, boost: None }
    }

    /// A boosted field.
    pub const fn boosted(field: Field, boost: f64) -> Self {
        Self {
            field,
            boost: Some(boost),
        }
    }

    /// Effective multiplier.
    pub fn factor(&self) -> f64 {
        self.boost.unwrap_or(1.0)
    }
}

impl fmt::Display for FieldBoost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.boost {
            Some(boost) => write!(f, "{}^{boost}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

impl Serialize for FieldBoost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Query whose score is adjusted by per-document functions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionScoreQuery {
    /// Base query.
    pub query: Box<Query>,
    /// Score functions.
    pub functions: Vec<ScoreFunction>,
    /// How function results combine with each other.
    pub score_mode: CombineMode,
    /// How the combined function result combines with the query score.
    pub boost_mode: CombineMode,
}

impl FunctionScoreQuery {
    /// Combined function factor for `doc`.
    pub fn factor(&self, doc: &Document) -> f64 {
        self.score_mode
            .combine(self.functions.iter().map(|function| function.evaluate(doc)))
    }

    /// Final score of `doc` given its base query score.
    pub fn score(&self, query_score: f64, doc: &Document) -> f64 {
        self.boost_mode
            .combine([query_score, self.factor(doc)])
    }
}

/// Combination of function scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Scores are multiplied.
    Multiply,
}

impl CombineMode {
    /// Combines `scores`.
    pub fn combine(self, scores: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            Self::Multiply => scores.into_iter().product(),
        }
    }
}

/// A per-document score multiplier, a pure function of one document's fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreFunction {
    /// Linear decay over the section's nesting level within its page.
    NestingDecay {
        /// Score lost at the deepest level.
        range: f64,
    },
    /// Linear decay over the section's position within its page.
    PositionDecay {
        /// Score lost at the last position.
        range: f64,
    },
    /// Constant factor for low-priority documents.
    PriorityDeboost {
        /// Multiplier applied to low-priority documents.
        factor: f64,
    },
}

impl ScoreFunction {
    /// Evaluates the function for `doc`.
    pub fn evaluate(&self, doc: &Document) -> f64 {
        match *self {
            Self::NestingDecay { range } => linear_decay(doc.level, doc.max_level, range),
            Self::PositionDecay { range } => linear_decay(doc.position, doc.max_position, range),
            Self::PriorityDeboost { factor } => {
                if doc.is_low_priority() {
                    factor
                } else {
                    1.0
                }
            }
        }
    }

    /// Painless source evaluated by the backend.
    const fn script(&self) -> &'static str {
        match self {
            Self::NestingDecay { .. } => {
                "double scale = (double)Math.max(1, doc['max_level'].value); \
                 return 1 - (((double)doc['level'].value / scale) * params.range);"
            }
            Self::PositionDecay { .. } => {
                "double scale = (double)Math.max(1, doc['max_position'].value); \
                 return 1 - (((double)doc['position'].value / scale) * params.range);"
            }
            Self::PriorityDeboost { .. } => {
                "return doc['priority'].value == 'low' ? params.factor : 1.0;"
            }
        }
    }

    /// Script parameters.
    fn params(&self) -> BTreeMap<&'static str, f64> {
        match *self {
            Self::NestingDecay { range } | Self::PositionDecay { range } => {
                BTreeMap::from([("range", range)])
            }
            Self::PriorityDeboost { factor } => BTreeMap::from([("factor", factor)]),
        }
    }
}

/// `1 - (distance / max(1, scale)) * range`.
fn linear_decay(distance: u32, scale: u32, range: f64) -> f64 {
    1.0 - (f64::from(distance) / f64::from(scale.max(1))) * range
}

/// Wire form of a script score function.
#[derive(Serialize)]
struct ScriptScore {
    /// Script to evaluate.
    script: Script,
}

/// Wire form of a stored script.
#[derive(Serialize)]
struct Script {
    /// Painless source.
    source: &'static str,
    /// Named parameters.
    params: BTreeMap<&'static str, f64>,
}

impl Serialize for ScoreFunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            "script_score",
            &ScriptScore {
                script: Script {
                    source: self.script(),
                    params: self.params(),
                },
            },
        )?;
        map.end()
    }
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Computed relevance score.
    Score,
    /// A numeric document field.
    Field(String),
}

impl SortKey {
    /// Key name in the sort spec.
    pub fn name(&self) -> &str {
        match self {
            Self::Score => "_score",
            Self::Field(name) => name,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// One sort criterion, serialized as `{"key": {"order": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    /// Sorted value.
    pub key: SortKey,
    /// Direction.
    pub order: SortOrder,
}

/// Wire form of a sort direction.
#[derive(Serialize)]
struct SortSpec {
    /// Direction.
    order: SortOrder,
}

impl Serialize for SortClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key.name(), &SortSpec { order: self.order })?;
        map.end()
    }
}

/// Keep only the best hit per distinct value of a keyword field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collapse {
    /// Keyword field to group by.
    pub field: String,
}

/// An aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Approximate distinct count of a keyword field.
    Cardinality(Cardinality),
}

/// Approximate distinct count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cardinality {
    /// Keyword field to count.
    pub field: String,
    /// Count below which results are expected to be exact.
    pub precision_threshold: u32,
}

/// Highlighting directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    /// Markers inserted before matches.
    pub pre_tags: Vec<String>,
    /// Markers inserted after matches.
    pub post_tags: Vec<String>,
    /// Encoding applied to highlighted text.
    pub encoder: Encoder,
    /// Highlighted fields.
    pub fields: BTreeMap<Field, HighlightField>,
}

impl Highlight {
    /// First pre tag, or empty.
    pub fn pre_tag(&self) -> &str {
        self.pre_tags.first().map_or("", String::as_str)
    }

    /// First post tag, or empty.
    pub fn post_tag(&self) -> &str {
        self.post_tags.first().map_or("", String::as_str)
    }
}

/// Per-field highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightField {
    /// Approximate fragment length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_size: Option<usize>,
    /// Maximum fragments. Zero returns whole matched values.
    pub number_of_fragments: usize,
}
