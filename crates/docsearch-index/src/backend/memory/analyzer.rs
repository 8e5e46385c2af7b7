//! Text analysis for the in-memory index.
//!
//! The pipeline splits on whitespace and punctuation, lowercases, and drops tokens longer
//! than 40 bytes. There is no stemming, so stored text and query words compare the way the
//! standard analyzer of a search server compares them.

use std::{collections::BTreeSet, ops::Range};

use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream};

/// Name of the tokenizer registered with every index.
pub const DOCSEARCH_TOKENIZER: &str = "docsearch_text";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Builds the text analyzer shared by indexing, query reading and highlighting.
pub fn build_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .build()
}

/// Terms of `text` in analyzed form.
pub fn terms(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut out = Vec::new();
    while let Some(token) = stream.next() {
        out.push(token.text.clone());
    }
    out
}

/// Byte ranges of the tokens of `text` whose analyzed form is in `matched`.
///
/// Ranges are sorted and merged where they touch.
pub fn match_ranges(
    analyzer: &mut TextAnalyzer,
    text: &str,
    matched: &BTreeSet<String>,
) -> Vec<Range<usize>> {
    if matched.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let mut stream = analyzer.token_stream(text);
    let mut ranges = Vec::new();
    while let Some(token) = stream.next() {
        if matched.contains(&token.text) {
            ranges.push(token.offset_from..token.offset_to);
        }
    }
    merge_ranges(ranges)
}

/// Merges overlapping or adjacent byte ranges. The result is sorted by start position.
pub fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| r.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Vec<String> {
        terms(&mut build_analyzer(), text)
    }

    #[test]
    fn splits_and_lowercases() {
        assert_eq!(
            analyze("The FormHelper::create() method"),
            ["the", "formhelper", "create", "method"]
        );
        assert_eq!(analyze("user_name"), ["user", "name"]);
        assert_eq!(analyze("Überblick 2.0"), ["überblick", "2", "0"]);
        assert!(analyze("*** --- !!").is_empty());
    }

    #[test]
    fn long_tokens_are_dropped() {
        let long = "a".repeat(41);
        assert_eq!(analyze(&format!("short {long} tail")), ["short", "tail"]);
    }

    #[test]
    fn match_ranges_point_into_source() {
        let text = "Héllo, wörld and more wörld";
        let matched = BTreeSet::from(["wörld".to_string()]);
        let ranges = match_ranges(&mut build_analyzer(), text, &matched);
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| &text[r.clone()] == "wörld"));
    }

    #[test]
    fn merge_ranges_combines_overlapping_and_adjacent() {
        assert_eq!(merge_ranges(vec![10..15, 0..5, 3..8, 15..18]), vec![0..8, 10..18]);
        assert!(merge_ranges(Vec::new()).is_empty());
    }
}
