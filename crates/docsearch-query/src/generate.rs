//! Query text generation.
//!
//! Renders a syntax tree back into backend query-string syntax. Word terms
//! are escaped and receive the generator's modifier suffix; phrases are
//! quoted and never modified.

use std::fmt;

use crate::{ast::Node, error::CompileError};

/// Characters escaped with a backslash inside word terms.
const RESERVED: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
    ' ',
];

/// Suffix appended to every word term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermModifier {
    /// Terms are rendered as written.
    #[default]
    None,
    /// `~`: match terms within a small edit distance.
    Fuzzy,
    /// `*`: match terms by prefix.
    Prefix,
}

impl TermModifier {
    /// Returns the suffix text.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Fuzzy => "~",
            Self::Prefix => "*",
        }
    }
}

impl fmt::Display for TermModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Prefix => "prefix",
        })
    }
}

/// Renders syntax trees as query text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generator {
    /// Suffix for word terms.
    modifier: TermModifier,
}

impl Generator {
    /// Creates a generator that appends `modifier` to word terms.
    pub const fn new(modifier: TermModifier) -> Self {
        Self { modifier }
    }

    /// Renders a tree.
    ///
    /// The tree is walked with an explicit stack, so rendering depth is not
    /// bounded by the call stack.
    pub fn generate(&self, node: &Node) -> Result<String, CompileError> {
        let mut out = String::new();
        let mut pending = vec![Piece::Node(node)];

        while let Some(piece) = pending.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                Node::Term {
                    text,
                    phrase: false,
                } => {
                    if text.is_empty() {
                        return Err(CompileError::EmptyWord);
                    }
                    escape_word(text, &mut out);
                    out.push_str(self.modifier.suffix());
                }
                Node::Term { text, phrase: true } => {
                    out.push('"');
                    escape_phrase(text, &mut out);
                    out.push('"');
                }
                Node::Mandatory(child) => {
                    out.push('+');
                    pending.push(Piece::Node(child));
                }
                Node::Prohibited(child) => {
                    out.push('-');
                    pending.push(Piece::Node(child));
                }
                Node::Not(child) => {
                    out.push_str("NOT ");
                    pending.push(Piece::Node(child));
                }
                Node::Group(child) => {
                    out.push('(');
                    pending.extend([Piece::Text(")"), Piece::Node(child)]);
                }
                Node::Or(left, right) => {
                    pending.extend([Piece::Node(right), Piece::Text(" OR "), Piece::Node(left)]);
                }
                Node::And {
                    left,
                    right,
                    explicit,
                } => {
                    let keyword = if *explicit { " AND " } else { " " };
                    pending.extend([Piece::Node(right), Piece::Text(keyword), Piece::Node(left)]);
                }
            }
        }

        Ok(out)
    }
}

/// Work item for [`Generator::generate`]: a subtree still to render, or
/// literal text to emit once the pieces pushed after it are done.
enum Piece<'a> {
    /// A subtree.
    Node(&'a Node),
    /// Literal output.
    Text(&'static str),
}

/// Appends a word with reserved characters escaped.
fn escape_word(text: &str, out: &mut String) {
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

/// Appends phrase content with quotes and backslashes escaped.
fn escape_phrase(text: &str, out: &mut String) {
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
}
