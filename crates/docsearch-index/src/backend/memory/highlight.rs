//! Highlighting of matched terms in stored values.
//!
//! The words of a query are first expanded to the indexed terms they matched. Fields asking
//! for whole values (`number_of_fragments = 0`) get every value containing one of those
//! terms. Other fields get the best fragment chosen by tantivy's snippet generator.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
};

use tantivy::{
    Searcher as TantivySearcher, Term,
    query::{BooleanQuery, Occur, Query as TantivyQuery, TermQuery},
    schema::IndexRecordOption,
    snippet::SnippetGenerator,
    tokenizer::TextAnalyzer,
};
use tracing::trace;

use super::{
    analyzer::{build_analyzer, match_ranges, merge_ranges},
    compile::HighlightTerms,
    fuzzy::{FuzzyBuilders, expand_terms},
    schema::SectionSchema,
};
use crate::{
    document::Document,
    error::BackendError,
    html,
    options::Encoder,
    request::{Field, Highlight},
};

/// Fragment size used when a field requests fragments without a size.
const DEFAULT_FRAGMENT_SIZE: usize = 100;

/// How one field is highlighted.
enum FieldMode {
    /// Every matched value, whole.
    Whole {
        /// Indexed terms to mark.
        terms: BTreeSet<String>,
    },
    /// The best fragment of the first matched value.
    Fragment {
        /// Snippet generator for the field.
        generator: SnippetGenerator,
    },
}

/// Highlights hits of one search.
pub struct Highlighter<'h> {
    /// Highlighted fields with their mode.
    fields: Vec<(Field, FieldMode)>,
    /// Analyzer locating terms in whole values.
    analyzer: TextAnalyzer,
    /// Markers and encoding.
    spec: &'h Highlight,
}

impl<'h> Highlighter<'h> {
    /// Prepares highlighting of the requested fields for a query with `words`.
    ///
    /// Fields the query does not search, or whose words match no indexed term, are skipped.
    pub fn new(
        searcher: &TantivySearcher,
        schema: &SectionSchema,
        words: &HighlightTerms,
        fuzzy: &FuzzyBuilders,
        spec: &'h Highlight,
    ) -> Result<Self, BackendError> {
        let mut fields = Vec::new();

        for (&field, options) in &spec.fields {
            let Some(field_words) = words.get(&field) else {
                continue;
            };
            let handle = schema.field(field);
            let mut terms = BTreeSet::new();
            for (word, kind) in field_words {
                expand_terms(searcher, handle, &fuzzy.dfa(word, *kind), &mut terms)?;
            }
            trace!(
                %field,
                words = field_words.len(),
                terms = terms.len(),
                "expanded highlight terms"
            );
            if terms.is_empty() {
                continue;
            }

            let mode = if options.number_of_fragments == 0 {
                FieldMode::Whole { terms }
            } else {
                let clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = terms
                    .iter()
                    .map(|term| {
                        let query: Box<dyn TantivyQuery> = Box::new(TermQuery::new(
                            Term::from_field_text(handle, term),
                            IndexRecordOption::WithFreqs,
                        ));
                        (Occur::Should, query)
                    })
                    .collect();
                let query = BooleanQuery::new(clauses);
                let mut generator = SnippetGenerator::create(searcher, &query, handle)
                    .map_err(|e| BackendError::Failed(format!("snippet setup failed: {e}")))?;
                generator
                    .set_max_num_chars(options.fragment_size.unwrap_or(DEFAULT_FRAGMENT_SIZE));
                FieldMode::Fragment { generator }
            };
            fields.push((field, mode));
        }

        Ok(Self {
            fields,
            analyzer: build_analyzer(),
            spec,
        })
    }

    /// Highlighted values for every field of `doc` that has matches.
    pub fn highlight(&mut self, doc: &Document) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::new();

        for (field, mode) in &self.fields {
            let values = field.values(doc);
            let fragments: Vec<String> = match mode {
                FieldMode::Whole { terms } => values
                    .iter()
                    .filter_map(|value| {
                        let ranges = match_ranges(&mut self.analyzer, value, terms);
                        (!ranges.is_empty()).then(|| render(value, &ranges, self.spec))
                    })
                    .collect(),
                FieldMode::Fragment { generator } => values
                    .iter()
                    .map(|value| generator.snippet(value))
                    .find(|snippet| !snippet.highlighted().is_empty())
                    .map(|snippet| {
                        let ranges = merge_ranges(snippet.highlighted().to_vec());
                        render(snippet.fragment(), &ranges, self.spec)
                    })
                    .into_iter()
                    .collect(),
            };
            if !fragments.is_empty() {
                out.insert(field.name().to_string(), fragments);
            }
        }

        out
    }
}

/// Renders `text` with markers around `ranges`.
fn render(text: &str, ranges: &[Range<usize>], spec: &Highlight) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for range in ranges {
        push_text(&mut out, &text[cursor..range.start], spec.encoder);
        out.push_str(spec.pre_tag());
        push_text(&mut out, &text[range.clone()], spec.encoder);
        out.push_str(spec.post_tag());
        cursor = range.end;
    }
    push_text(&mut out, &text[cursor..], spec.encoder);

    out
}

/// Appends `text`, encoded as requested.
fn push_text(out: &mut String, text: &str, encoder: Encoder) {
    if encoder.is_html() {
        out.push_str(&html::encode(text));
    } else {
        out.push_str(text);
    }
}
