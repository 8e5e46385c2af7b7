//! Levenshtein automata for query words and their expansion against term dictionaries.
//!
//! Scoring leaves prefix and fuzzy matching to tantivy's own queries. Highlighting needs the
//! concrete indexed terms a word stood for, so the same automaton is run over each
//! segment's term dictionary.

use std::{collections::BTreeSet, str};

use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder, SINK_STATE};
use tantivy::{Searcher as TantivySearcher, schema::Field as TantivyField};
use tantivy_fst::Automaton;

use super::query_string::TermKind;
use crate::error::BackendError;

/// Largest edit distance a fuzzy word may ask for.
pub const MAX_DISTANCE: u8 = 2;

/// Adapts a [`DFA`] to the automaton interface of tantivy's term dictionary.
struct LevenshteinDfa<'a>(&'a DFA);

impl Automaton for LevenshteinDfa<'_> {
    type State = u32;

    fn start(&self) -> Self::State {
        self.0.initial_state()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &Self::State) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        self.0.transition(*state, byte)
    }
}

/// Edit distance of a fuzzy word. Without an explicit distance, words of one or two
/// characters must match exactly, three to five allow one edit and longer words two.
pub fn fuzzy_distance(term: &str, explicit: Option<u8>) -> u8 {
    explicit
        .unwrap_or_else(|| match term.chars().count() {
            0..=2 => 0,
            3..=5 => 1,
            _ => 2,
        })
        .min(MAX_DISTANCE)
}

/// Automaton builders for edit distances 0 to 2, transpositions counting as one edit.
pub struct FuzzyBuilders {
    /// Builders indexed by distance.
    builders: [LevenshteinAutomatonBuilder; 3],
}

impl FuzzyBuilders {
    /// Creates the builders.
    pub fn new() -> Self {
        Self {
            builders: [0, 1, 2].map(|distance| LevenshteinAutomatonBuilder::new(distance, true)),
        }
    }

    /// Automaton accepting the indexed terms `term` matches as a word of `kind`.
    pub fn dfa(&self, term: &str, kind: TermKind) -> DFA {
        match kind {
            TermKind::Exact => self.builders[0].build_dfa(term),
            TermKind::Prefix => self.builders[0].build_prefix_dfa(term),
            TermKind::Fuzzy(explicit) => {
                self.builders[usize::from(fuzzy_distance(term, explicit))].build_dfa(term)
            }
        }
    }
}

impl Default for FuzzyBuilders {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds the terms of `field` accepted by `dfa`, across all segments, to `out`.
pub fn expand_terms(
    searcher: &TantivySearcher,
    field: TantivyField,
    dfa: &DFA,
    out: &mut BTreeSet<String>,
) -> Result<(), BackendError> {
    fn failed(e: impl std::fmt::Display) -> BackendError {
        BackendError::Failed(format!("term lookup failed: {e}"))
    }

    for segment_reader in searcher.segment_readers() {
        let inverted_index = segment_reader.inverted_index(field).map_err(failed)?;
        let mut stream = inverted_index
            .terms()
            .search(LevenshteinDfa(dfa))
            .into_stream()
            .map_err(failed)?;
        while stream.advance() {
            if let Ok(term) = str::from_utf8(stream.key()) {
                out.insert(term.to_string());
            }
        }
    }
    Ok(())
}
