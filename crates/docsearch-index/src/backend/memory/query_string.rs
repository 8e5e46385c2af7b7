//! Reader for the Lucene query-string syntax carried by `query_string` clauses.
//!
//! Supports words with backslash escapes, a trailing `*` (prefix), a trailing `~` with an
//! optional edit distance (fuzzy), quoted phrases with an optional `~slop`, `+`, `-`, `!`,
//! `NOT`, `AND`/`&&`, `OR`/`||` and parenthesized groups. Clause occurrence follows the
//! classic Lucene query parser, including its handling of the default operator.
//!
//! Words without a modifier are analyzed like stored text; a word that analyzes to several
//! tokens becomes a phrase. Prefix and fuzzy words are only lowercased.

use tantivy::{query::Occur, tokenizer::TextAnalyzer};
use thiserror::Error;

use super::analyzer::terms;
use crate::request::Operator;

/// Deepest group nesting accepted.
const MAX_GROUP_DEPTH: usize = 1024;

/// How a term is compared against indexed terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TermKind {
    /// Equal tokens.
    Exact,
    /// Tokens starting with the term.
    Prefix,
    /// Tokens within an edit distance. `None` picks the distance from the term length.
    Fuzzy(Option<u8>),
}

/// A parsed query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// A single term.
    Term {
        /// Normalized term text.
        text: String,
        /// Comparison mode.
        kind: TermKind,
    },
    /// Terms in order, at most `slop` extra positions apart in total.
    Phrase {
        /// Analyzed terms.
        terms: Vec<String>,
        /// Allowed extra distance.
        slop: u32,
    },
    /// Boolean combination.
    Bool(Vec<(Occur, Self)>),
    /// Matches every document with a constant score.
    MatchAll,
}

impl QueryExpr {
    /// Creates a Bool expression, unwrapping a single non-negated clause.
    pub fn bool(mut clauses: Vec<(Occur, Self)>) -> Self {
        if clauses.len() == 1
            && clauses[0].0 != Occur::MustNot
            && let Some((_, expr)) = clauses.pop()
        {
            return expr;
        }
        Self::Bool(clauses)
    }
}

/// A query string that cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse query [{query}]: {message}")]
pub struct ReadError {
    /// The offending query string.
    pub query: String,
    /// What went wrong.
    pub message: String,
}

/// Lexical elements of the query-string syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    /// An unquoted word, unescaped.
    Word {
        /// Word text.
        text: String,
        /// Modifier suffix.
        kind: TermKind,
    },
    /// A quoted phrase, unescaped.
    Phrase {
        /// Phrase text.
        text: String,
        /// Explicit slop.
        slop: Option<u32>,
    },
    /// `AND` or `&&`.
    And,
    /// `OR` or `||`.
    Or,
    /// `NOT`, `!` or `-`.
    Not,
    /// `+`.
    Required,
    /// `(`.
    Open,
    /// `)`.
    Close,
}

/// Splits a query string into lexemes.
fn lex(input: &str) -> Result<Vec<Lexeme>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut lexemes = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        let next = chars.get(pos + 1).copied();
        match ch {
            c if c.is_whitespace() => pos += 1,
            '(' => {
                lexemes.push(Lexeme::Open);
                pos += 1;
            }
            ')' => {
                lexemes.push(Lexeme::Close);
                pos += 1;
            }
            '+' => {
                lexemes.push(Lexeme::Required);
                pos += 1;
            }
            '-' | '!' => {
                lexemes.push(Lexeme::Not);
                pos += 1;
            }
            '&' if next == Some('&') => {
                lexemes.push(Lexeme::And);
                pos += 2;
            }
            '|' if next == Some('|') => {
                lexemes.push(Lexeme::Or);
                pos += 2;
            }
            '"' => {
                let (text, end) = lex_phrase(&chars, pos + 1)?;
                let (slop, end) = lex_number(&chars, end);
                lexemes.push(Lexeme::Phrase {
                    text,
                    slop: slop.map(|(n, _)| n),
                });
                pos = end;
            }
            _ => {
                let (lexeme, end) = lex_word(&chars, pos)?;
                lexemes.push(lexeme);
                pos = end;
            }
        }
    }

    Ok(lexemes)
}

/// Reads a phrase body starting after the opening quote.
fn lex_phrase(chars: &[char], mut pos: usize) -> Result<(String, usize), String> {
    let mut text = String::new();
    while let Some(&ch) = chars.get(pos) {
        match ch {
            '"' => return Ok((text, pos + 1)),
            '\\' => {
                let escaped = chars.get(pos + 1).ok_or("escape at end of input")?;
                text.push(*escaped);
                pos += 2;
            }
            _ => {
                text.push(ch);
                pos += 1;
            }
        }
    }
    Err(String::from("unterminated phrase"))
}

/// Reads an optional `~N` suffix at `pos`. Returns `(N, had_digits)` when a `~` is present.
fn lex_number(chars: &[char], pos: usize) -> (Option<(u32, bool)>, usize) {
    if chars.get(pos) != Some(&'~') {
        return (None, pos);
    }
    let mut end = pos + 1;
    let mut value: u32 = 0;
    while let Some(digit) = chars.get(end).and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(digit);
        end += 1;
    }
    (Some((value, end > pos + 1)), end)
}

/// Reads an unquoted word starting at `pos`.
fn lex_word(chars: &[char], mut pos: usize) -> Result<(Lexeme, usize), String> {
    let mut text = String::new();
    let mut escaped_any = false;
    let mut prefix = false;

    while let Some(&ch) = chars.get(pos) {
        match ch {
            '\\' => {
                let escaped = chars.get(pos + 1).ok_or("escape at end of input")?;
                text.push(*escaped);
                escaped_any = true;
                pos += 2;
                continue;
            }
            c if c.is_whitespace() || matches!(c, '(' | ')' | '"' | '~') => break,
            '*' if is_word_end(chars.get(pos + 1).copied()) => {
                prefix = true;
                pos += 1;
                break;
            }
            _ => text.push(ch),
        }
        pos += 1;
    }

    if !escaped_any && !prefix {
        let keyword = match text.as_str() {
            "AND" => Some(Lexeme::And),
            "OR" => Some(Lexeme::Or),
            "NOT" => Some(Lexeme::Not),
            _ => None,
        };
        if let Some(keyword) = keyword {
            return Ok((keyword, pos));
        }
    }

    let (fuzzy, end) = lex_number(chars, pos);
    let kind = match fuzzy {
        Some((distance, true)) => {
            TermKind::Fuzzy(Some(u8::try_from(distance.min(2)).unwrap_or(2)))
        }
        Some((_, false)) => TermKind::Fuzzy(None),
        None if prefix => TermKind::Prefix,
        None => TermKind::Exact,
    };

    Ok((Lexeme::Word { text, kind }, end))
}

/// Whether a word ends before `next`.
fn is_word_end(next: Option<char>) -> bool {
    next.is_none_or(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '~'))
}

/// Clause modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    /// None given.
    None,
    /// `+`.
    Required,
    /// `-`, `!` or `NOT`.
    Not,
}

/// Conjunction introducing a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    /// None given.
    None,
    /// `AND`.
    And,
    /// `OR`.
    Or,
}

/// Recursive descent reader over lexemes.
struct Reader<'a> {
    /// Lexemes to read.
    lexemes: Vec<Lexeme>,
    /// Current position.
    position: usize,
    /// Current group depth.
    depth: usize,
    /// Operator for clauses without a conjunction.
    operator: Operator,
    /// Slop for phrases without an explicit one.
    phrase_slop: u32,
    /// Analyzer applied to plain words and phrases.
    analyzer: &'a mut TextAnalyzer,
}

impl Reader<'_> {
    /// Reads clauses until a closing parenthesis or the end.
    fn clauses(&mut self) -> Result<Vec<(Occur, QueryExpr)>, String> {
        let mut clauses = Vec::new();
        let mut seen_clause = false;

        while let Some(lexeme) = self.peek() {
            if *lexeme == Lexeme::Close {
                break;
            }
            let conjunction = match lexeme {
                Lexeme::And => Conjunction::And,
                Lexeme::Or => Conjunction::Or,
                _ => Conjunction::None,
            };
            if conjunction != Conjunction::None {
                if !seen_clause {
                    return Err(String::from("operator without left operand"));
                }
                self.position += 1;
            }
            let modifier = match self.peek() {
                Some(Lexeme::Required) => Modifier::Required,
                Some(Lexeme::Not) => Modifier::Not,
                _ => Modifier::None,
            };
            if modifier != Modifier::None {
                self.position += 1;
            }
            let expr = self.clause()?;
            seen_clause = true;
            self.add_clause(&mut clauses, conjunction, modifier, expr);
        }

        Ok(clauses)
    }

    /// Applies the conjunction to the previous clause and appends `expr`.
    fn add_clause(
        &self,
        clauses: &mut Vec<(Occur, QueryExpr)>,
        conjunction: Conjunction,
        modifier: Modifier,
        expr: Option<QueryExpr>,
    ) {
        if let Some(last) = clauses.last_mut()
            && last.0 != Occur::MustNot
        {
            match conjunction {
                Conjunction::And => last.0 = Occur::Must,
                Conjunction::Or if self.operator == Operator::And => last.0 = Occur::Should,
                _ => {}
            }
        }

        let Some(expr) = expr else {
            return;
        };

        let prohibited = modifier == Modifier::Not;
        let required = match self.operator {
            Operator::Or => {
                !prohibited && (modifier == Modifier::Required || conjunction == Conjunction::And)
            }
            Operator::And => !prohibited && conjunction != Conjunction::Or,
        };
        let occur = if prohibited {
            Occur::MustNot
        } else if required {
            Occur::Must
        } else {
            Occur::Should
        };
        clauses.push((occur, expr));
    }

    /// Reads one term, phrase or group. Returns `None` when it analyzes to nothing.
    fn clause(&mut self) -> Result<Option<QueryExpr>, String> {
        let lexeme = self
            .lexemes
            .get(self.position)
            .cloned()
            .ok_or("expected a term at end of input")?;
        self.position += 1;

        match lexeme {
            Lexeme::Word { text, kind } => Ok(self.word(&text, kind)),
            Lexeme::Phrase { text, slop } => Ok(phrase(
                terms(self.analyzer, &text),
                slop.unwrap_or(self.phrase_slop),
            )),
            Lexeme::Open => {
                if self.depth >= MAX_GROUP_DEPTH {
                    return Err(String::from("groups nested too deeply"));
                }
                self.depth += 1;
                let inner = self.clauses()?;
                self.depth -= 1;
                if self.peek() != Some(&Lexeme::Close) {
                    return Err(String::from("missing closing parenthesis"));
                }
                self.position += 1;
                Ok((!inner.is_empty()).then(|| QueryExpr::bool(inner)))
            }
            other => Err(format!("unexpected {other:?}")),
        }
    }

    /// Builds the expression for a word.
    fn word(&mut self, text: &str, kind: TermKind) -> Option<QueryExpr> {
        match kind {
            TermKind::Exact => phrase(terms(self.analyzer, text), 0),
            TermKind::Prefix | TermKind::Fuzzy(_) => {
                let text = text.to_lowercase();
                (!text.is_empty()).then_some(QueryExpr::Term { text, kind })
            }
        }
    }

    /// Current lexeme.
    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.position)
    }
}

/// Builds the expression for analyzed terms: nothing, one exact term, or a phrase.
fn phrase(mut terms: Vec<String>, slop: u32) -> Option<QueryExpr> {
    match terms.len() {
        0 => None,
        1 => terms.pop().map(|text| QueryExpr::Term {
            text,
            kind: TermKind::Exact,
        }),
        _ => Some(QueryExpr::Phrase { terms, slop }),
    }
}

/// Reads a query string.
///
/// A query made only of prohibited clauses matches every document not excluded by them.
pub fn read(
    analyzer: &mut TextAnalyzer,
    query: &str,
    operator: Operator,
    phrase_slop: u32,
) -> Result<QueryExpr, ReadError> {
    let fail = |message: String| ReadError {
        query: query.to_string(),
        message,
    };

    let mut reader = Reader {
        lexemes: lex(query).map_err(fail)?,
        position: 0,
        depth: 0,
        operator,
        phrase_slop,
        analyzer,
    };
    let mut clauses = reader.clauses().map_err(fail)?;
    if reader.peek().is_some() {
        return Err(fail(String::from("unbalanced closing parenthesis")));
    }

    if !clauses.is_empty() && clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
        clauses.push((Occur::Must, QueryExpr::MatchAll));
    }
    Ok(QueryExpr::bool(clauses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::analyzer::build_analyzer;

    fn and(query: &str) -> QueryExpr {
        read(&mut build_analyzer(), query, Operator::And, 0).unwrap()
    }

    fn term(text: &str, kind: TermKind) -> QueryExpr {
        QueryExpr::Term {
            text: text.into(),
            kind,
        }
    }

    #[test]
    fn modifiers() {
        assert_eq!(and("Save"), term("save", TermKind::Exact));
        assert_eq!(and("Save*"), term("save", TermKind::Prefix));
        assert_eq!(and("save~"), term("save", TermKind::Fuzzy(None)));
        assert_eq!(and("save~1"), term("save", TermKind::Fuzzy(Some(1))));
        assert_eq!(and("save~7"), term("save", TermKind::Fuzzy(Some(2))));
    }

    #[test]
    fn escapes_are_literal() {
        assert_eq!(and(r"user\:name*"), term("user:name", TermKind::Prefix));
        assert_eq!(and(r"\*\*\**"), term("***", TermKind::Prefix));
        assert_eq!(and(r"a\ b\~"), QueryExpr::Phrase {
            terms: vec!["a".into(), "b".into()],
            slop: 0,
        });
        assert_eq!(and(r"AND\*"), term("and", TermKind::Exact));
    }

    #[test]
    fn default_and_makes_clauses_required() {
        assert_eq!(
            and("view* cell*"),
            QueryExpr::Bool(vec![
                (Occur::Must, term("view", TermKind::Prefix)),
                (Occur::Must, term("cell", TermKind::Prefix)),
            ])
        );
    }

    #[test]
    fn or_makes_neighbours_optional() {
        assert_eq!(
            and("a1 OR b1 c1"),
            QueryExpr::Bool(vec![
                (Occur::Should, term("a1", TermKind::Exact)),
                (Occur::Should, term("b1", TermKind::Exact)),
                (Occur::Must, term("c1", TermKind::Exact)),
            ])
        );
    }

    #[test]
    fn prohibited_and_not() {
        assert_eq!(
            and("views -cells NOT helper"),
            QueryExpr::Bool(vec![
                (Occur::Must, term("views", TermKind::Exact)),
                (Occur::MustNot, term("cells", TermKind::Exact)),
                (Occur::MustNot, term("helper", TermKind::Exact)),
            ])
        );
    }

    #[test]
    fn pure_negative_matches_all() {
        assert_eq!(
            and("-nothing~"),
            QueryExpr::Bool(vec![
                (Occur::MustNot, term("nothing", TermKind::Fuzzy(None))),
                (Occur::Must, QueryExpr::MatchAll),
            ])
        );
    }

    #[test]
    fn phrases_use_default_slop() {
        let expr = read(&mut build_analyzer(), "\"View Cells\" \"x\"~4", Operator::And, 2).unwrap();
        assert_eq!(
            expr,
            QueryExpr::Bool(vec![
                (
                    Occur::Must,
                    QueryExpr::Phrase {
                        terms: vec!["view".into(), "cells".into()],
                        slop: 2,
                    }
                ),
                (Occur::Must, term("x", TermKind::Exact)),
            ])
        );
    }

    #[test]
    fn groups() {
        assert_eq!(
            and("+(a1 OR b1) c1"),
            QueryExpr::Bool(vec![
                (
                    Occur::Must,
                    QueryExpr::Bool(vec![
                        (Occur::Should, term("a1", TermKind::Exact)),
                        (Occur::Should, term("b1", TermKind::Exact)),
                    ])
                ),
                (Occur::Must, term("c1", TermKind::Exact)),
            ])
        );
    }

    #[test]
    fn empty_terms_are_dropped() {
        assert_eq!(and(r"\*\*\* views"), term("views", TermKind::Exact));
        assert_eq!(and(r"\*\*\* AND views"), term("views", TermKind::Exact));
        assert_eq!(and(""), QueryExpr::Bool(Vec::new()));
    }

    #[test]
    fn generated_queries_read_back() {
        let q = docsearch_query::QueryString::new("\"foo bar\" NOT baz but -no (yes !nah (deep))");
        for rendered in [q.to_exact(), q.to_fuzzy(), q.to_prefix()] {
            assert!(read(&mut build_analyzer(), &rendered.unwrap(), Operator::And, 2).is_ok());
        }
    }

    #[test]
    fn malformed_queries_fail() {
        for q in ["(views", "views)", "\"open", "AND views", "views AND", r"trailing\"] {
            assert!(read(&mut build_analyzer(), q, Operator::And, 0).is_err(), "query {q:?}");
        }
    }
}
