//! Compilation of request queries into tantivy queries.
//!
//! Every `query_string` clause is read with Lucene query-parser rules and turned into
//! tantivy queries: exact words become BM25 term queries, prefix and fuzzy words become
//! constant-score automaton queries, and a leaf searched in several fields keeps the best
//! boosted field. An outer `function_score` is kept aside and applied per hit.

use std::collections::{BTreeMap, BTreeSet};

use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, DisjunctionMaxQuery, FuzzyTermQuery, Occur,
        PhraseQuery, Query as TantivyQuery, TermQuery,
    },
    schema::{Field as TantivyField, IndexRecordOption},
    tokenizer::TextAnalyzer,
};

use super::{
    analyzer::build_analyzer,
    fuzzy::fuzzy_distance,
    query_string::{QueryExpr, TermKind, read},
    schema::SectionSchema,
};
use crate::{
    document::Document,
    error::BackendError,
    request::{BoolQuery, Field, FieldBoost, FunctionScoreQuery, Query, QueryStringQuery},
};

/// Words a query looks for, per searched field, with how each is compared.
pub type HighlightTerms = BTreeMap<Field, BTreeSet<(String, TermKind)>>;

/// A request query ready to run against a section index.
pub struct CompiledQuery<'r> {
    /// Matching and base scoring.
    pub query: Box<dyn TantivyQuery>,
    /// Per-document functions applied to the base score.
    pub function_score: Option<&'r FunctionScoreQuery>,
    /// Positive words per field, for highlighting.
    pub highlight_terms: HighlightTerms,
}

impl CompiledQuery<'_> {
    /// Final score of `doc` given its base score.
    pub fn score(&self, base: f64, doc: &Document) -> f64 {
        self.function_score
            .map_or(base, |spec| spec.score(base, doc))
    }
}

/// Compiles request queries against one schema.
pub struct QueryCompiler<'s> {
    /// Field handles.
    schema: &'s SectionSchema,
    /// Analyzer for plain words and phrases.
    analyzer: TextAnalyzer,
    /// Positive words seen so far.
    highlight_terms: HighlightTerms,
}

impl<'s> QueryCompiler<'s> {
    /// Creates a compiler for `schema`.
    pub fn new(schema: &'s SectionSchema) -> Self {
        Self {
            schema,
            analyzer: build_analyzer(),
            highlight_terms: BTreeMap::new(),
        }
    }

    /// Compiles `query`. A `function_score` is only accepted as the outermost clause.
    pub fn compile<'r>(mut self, query: &'r Query) -> Result<CompiledQuery<'r>, BackendError> {
        let (function_score, base) = match query {
            Query::FunctionScore(spec) => (Some(spec), spec.query.as_ref()),
            other => (None, other),
        };
        let query = self.request_query(base)?;
        Ok(CompiledQuery {
            query,
            function_score,
            highlight_terms: self.highlight_terms,
        })
    }

    /// Compiles a nested request clause.
    fn request_query(&mut self, query: &Query) -> Result<Box<dyn TantivyQuery>, BackendError> {
        match query {
            Query::FunctionScore(_) => Err(BackendError::Failed(String::from(
                "function_score is only supported as the outermost query",
            ))),
            Query::Bool(bool_query) => self.bool_query(bool_query),
            Query::QueryString(query_string) => self.query_string(query_string),
        }
    }

    /// Compiles a bool clause. Without `must` clauses at least one `should` clause has to
    /// match; with them, `minimum_should_match: 1` makes the `should` group required.
    fn bool_query(&mut self, query: &BoolQuery) -> Result<Box<dyn TantivyQuery>, BackendError> {
        if query.must.is_empty() && query.should.is_empty() {
            return Ok(Box::new(AllQuery));
        }
        let minimum = query.minimum_should_match.unwrap_or(0);
        if minimum > 1 {
            return Err(BackendError::Failed(format!(
                "minimum_should_match {minimum} is not supported"
            )));
        }

        let mut clauses = Vec::with_capacity(query.must.len() + 1);
        for must in &query.must {
            clauses.push((Occur::Must, self.request_query(must)?));
        }
        let mut should = Vec::with_capacity(query.should.len());
        for clause in &query.should {
            should.push((Occur::Should, self.request_query(clause)?));
        }

        if minimum == 1 && !clauses.is_empty() && !should.is_empty() {
            let group: Box<dyn TantivyQuery> = Box::new(BooleanQuery::new(should));
            clauses.push((Occur::Must, group));
        } else {
            clauses.extend(should);
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles a query string clause.
    fn query_string(
        &mut self,
        query: &QueryStringQuery,
    ) -> Result<Box<dyn TantivyQuery>, BackendError> {
        let expr = read(
            &mut self.analyzer,
            &query.query,
            query.default_operator,
            query.phrase_slop.unwrap_or(0),
        )
        .map_err(|e| BackendError::Failed(e.to_string()))?;

        let compiled = self.expr(&expr, &query.fields, false);
        let boosted: Box<dyn TantivyQuery> = match query.boost {
            Some(boost) => Box::new(BoostQuery::new(compiled, boost as f32)),
            None => compiled,
        };
        Ok(boosted)
    }

    /// Compiles a parsed query string. Words under a prohibited clause are not highlighted.
    fn expr(
        &mut self,
        expr: &QueryExpr,
        fields: &[FieldBoost],
        negated: bool,
    ) -> Box<dyn TantivyQuery> {
        match expr {
            QueryExpr::Term { text, kind } => {
                if !negated {
                    self.note(fields, text, *kind);
                }
                self.per_field(fields, |field| term_query(field, text, *kind))
            }
            QueryExpr::Phrase { terms, slop } => {
                if !negated {
                    for term in terms {
                        self.note(fields, term, TermKind::Exact);
                    }
                }
                self.per_field(fields, |field| -> Box<dyn TantivyQuery> {
                    let mut phrase = PhraseQuery::new(
                        terms
                            .iter()
                            .map(|term| Term::from_field_text(field, term))
                            .collect(),
                    );
                    phrase.set_slop(*slop);
                    Box::new(phrase)
                })
            }
            QueryExpr::Bool(clauses) => {
                let clauses = clauses
                    .iter()
                    .map(|(occur, clause)| {
                        let negated = negated || *occur == Occur::MustNot;
                        (*occur, self.expr(clause, fields, negated))
                    })
                    .collect();
                Box::new(BooleanQuery::new(clauses))
            }
            QueryExpr::MatchAll => Box::new(AllQuery),
        }
    }

    /// Runs `leaf` in every field and keeps the best boosted score.
    fn per_field(
        &self,
        fields: &[FieldBoost],
        leaf: impl Fn(TantivyField) -> Box<dyn TantivyQuery>,
    ) -> Box<dyn TantivyQuery> {
        let disjuncts = fields
            .iter()
            .map(|searched| {
                let query = leaf(self.schema.field(searched.field));
                let boosted: Box<dyn TantivyQuery> = match searched.boost {
                    Some(boost) => Box::new(BoostQuery::new(query, boost as f32)),
                    None => query,
                };
                boosted
            })
            .collect();
        Box::new(DisjunctionMaxQuery::new(disjuncts))
    }

    /// Records a positive word for every field it is searched in.
    fn note(&mut self, fields: &[FieldBoost], text: &str, kind: TermKind) {
        for searched in fields {
            self.highlight_terms
                .entry(searched.field)
                .or_default()
                .insert((text.to_string(), kind));
        }
    }
}

/// Query for one word in one field.
fn term_query(field: TantivyField, text: &str, kind: TermKind) -> Box<dyn TantivyQuery> {
    let term = Term::from_field_text(field, text);
    match kind {
        TermKind::Exact => Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
        TermKind::Prefix => Box::new(FuzzyTermQuery::new_prefix(term, 0, true)),
        TermKind::Fuzzy(explicit) => {
            Box::new(FuzzyTermQuery::new(term, fuzzy_distance(text, explicit), true))
        }
    }
}
