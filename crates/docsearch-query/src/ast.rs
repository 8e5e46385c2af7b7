//! Query abstract syntax tree.
//!
//! Every node owns its children outright. Trees are built once by the parser
//! and only the sanitizer rewrites term text afterwards.

use std::fmt;

/// A parsed query node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single word or a quoted phrase.
    Term {
        /// Term text with quotes and escapes removed.
        text: String,
        /// Whether the term came from a quoted span.
        phrase: bool,
    },

    /// `+child`: the child must match.
    Mandatory(Box<Self>),

    /// `-child`: the child must not match.
    Prohibited(Box<Self>),

    /// `NOT child` or `!child`.
    Not(Box<Self>),

    /// Conjunction of two operands.
    And {
        /// Left operand.
        left: Box<Self>,
        /// Right operand.
        right: Box<Self>,
        /// True when written with the `AND` keyword, false for adjacency.
        explicit: bool,
    },

    /// Disjunction of two operands.
    Or(Box<Self>, Box<Self>),

    /// Parenthesized sub-query.
    Group(Box<Self>),
}

impl Node {
    /// Creates an unquoted word term.
    pub fn word(text: impl Into<String>) -> Self {
        Self::Term {
            text: text.into(),
            phrase: false,
        }
    }

    /// Creates a quoted phrase term.
    pub fn phrase(text: impl Into<String>) -> Self {
        Self::Term {
            text: text.into(),
            phrase: true,
        }
    }

    /// Creates a conjunction node.
    pub fn and(left: Self, right: Self, explicit: bool) -> Self {
        Self::And {
            left: Box::new(left),
            right: Box::new(right),
            explicit,
        }
    }

    /// Creates a disjunction node.
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Wraps a node in a group.
    pub fn group(inner: Self) -> Self {
        Self::Group(Box::new(inner))
    }

    /// Marks a node as mandatory.
    pub fn mandatory(inner: Self) -> Self {
        Self::Mandatory(Box::new(inner))
    }

    /// Marks a node as prohibited.
    pub fn prohibited(inner: Self) -> Self {
        Self::Prohibited(Box::new(inner))
    }

    /// Negates a node.
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Returns true for `Prohibited` and `Not` nodes, whose terms never
    /// contribute to a match.
    pub const fn is_negation(&self) -> bool {
        matches!(self, Self::Prohibited(_) | Self::Not(_))
    }

    /// Returns this node's children in left-to-right order.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Term { .. } => Vec::new(),
            Self::Mandatory(c) | Self::Prohibited(c) | Self::Not(c) | Self::Group(c) => {
                vec![c.as_ref()]
            }
            Self::And { left, right, .. } | Self::Or(left, right) => {
                vec![left.as_ref(), right.as_ref()]
            }
        }
    }

    /// Formats the node as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![(self, 0)];

        while let Some((node, indent)) = pending.pop() {
            let prefix = "  ".repeat(indent);
            match node {
                Self::Term {
                    text,
                    phrase: false,
                } => writeln!(f, "{prefix}Word({text:?})")?,
                Self::Term { text, phrase: true } => writeln!(f, "{prefix}Phrase({text:?})")?,
                Self::Mandatory(_) => writeln!(f, "{prefix}Mandatory")?,
                Self::Prohibited(_) => writeln!(f, "{prefix}Prohibited")?,
                Self::Not(_) => writeln!(f, "{prefix}Not")?,
                Self::And { explicit, .. } => {
                    let label = if *explicit { "And(explicit)" } else { "And" };
                    writeln!(f, "{prefix}{label}")?;
                }
                Self::Or(..) => writeln!(f, "{prefix}Or")?,
                Self::Group(_) => writeln!(f, "{prefix}Group")?,
            }
            pending.extend(node.children().into_iter().rev().map(|c| (c, indent + 1)));
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f)
    }
}

/// A parsed query together with the raw text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Raw input as received.
    input: String,
    /// Root node, or `None` when the input held nothing parseable.
    root: Option<Node>,
}

impl SyntaxTree {
    /// Creates a tree from its parts.
    pub fn new(input: impl Into<String>, root: Option<Node>) -> Self {
        Self {
            input: input.into(),
            root,
        }
    }

    /// Returns the raw input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the root node.
    pub const fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_are_ordered() {
        let node = Node::and(Node::word("a"), Node::word("b"), false);
        assert_eq!(node.children(), vec![&Node::word("a"), &Node::word("b")]);
        assert!(Node::word("a").children().is_empty());
    }

    #[test]
    fn negations() {
        assert!(Node::not(Node::word("a")).is_negation());
        assert!(Node::prohibited(Node::word("a")).is_negation());
        assert!(!Node::mandatory(Node::word("a")).is_negation());
    }

    #[test]
    fn display_tree() {
        let node = Node::or(
            Node::and(Node::word("a"), Node::phrase("b c"), true),
            Node::group(Node::not(Node::word("d"))),
        );
        let expected = "\
Or
  And(explicit)
    Word(\"a\")
    Phrase(\"b c\")
  Group
    Not
      Word(\"d\")
";
        assert_eq!(node.to_string(), expected);
    }
}
