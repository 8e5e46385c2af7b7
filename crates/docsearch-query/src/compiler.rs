//! The query compiler facade.
//!
//! [`QueryString`] parses and sanitizes user input once, then exposes the
//! rendered query forms and the term lists used for validation.

use crate::{
    ast::{Node, SyntaxTree},
    error::CompileError,
    generate::{Generator, TermModifier},
    parser::parse,
    sanitize::sanitize,
};

/// A compiled user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryString {
    /// The sanitized syntax tree.
    tree: SyntaxTree,
}

impl QueryString {
    /// Parses and sanitizes `input`. Never fails; see [`Self::is_compilable`].
    pub fn new(input: &str) -> Self {
        let mut root = parse(input);
        if let Some(node) = root.as_mut() {
            sanitize(node);
        }
        Self {
            tree: SyntaxTree::new(input, root),
        }
    }

    /// Wraps an already-built tree. The tree is used as given, unsanitized.
    pub fn from_tree(tree: SyntaxTree) -> Self {
        Self { tree }
    }

    /// Returns the underlying syntax tree.
    pub const fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Whether the tree renders without error.
    pub fn is_compilable(&self) -> bool {
        self.compile(TermModifier::None).is_ok()
    }

    /// Renders the query with `modifier` applied to every word term.
    ///
    /// An empty query renders as the empty string.
    pub fn compile(&self, modifier: TermModifier) -> Result<String, CompileError> {
        match self.tree.root() {
            Some(root) => Generator::new(modifier).generate(root),
            None => Ok(String::new()),
        }
    }

    /// Renders the query as written.
    pub fn to_exact(&self) -> Result<String, CompileError> {
        self.compile(TermModifier::None)
    }

    /// Renders the query with fuzzy word terms.
    pub fn to_fuzzy(&self) -> Result<String, CompileError> {
        self.compile(TermModifier::Fuzzy)
    }

    /// Renders the query with prefix word terms.
    pub fn to_prefix(&self) -> Result<String, CompileError> {
        self.compile(TermModifier::Prefix)
    }

    /// Returns the text of every term in pre-order, negated ones included.
    pub fn extract_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        if let Some(root) = self.tree.root() {
            collect_terms(root, true, &mut terms);
        }
        terms
    }

    /// Returns the terms that can contribute to a match: everything except
    /// terms under `NOT` or `-`.
    pub fn extract_matchable_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        if let Some(root) = self.tree.root() {
            collect_terms(root, false, &mut terms);
        }
        terms
    }

    /// Returns the number of terms.
    pub fn term_count(&self) -> usize {
        self.extract_terms().len()
    }

    /// Returns the length in characters of the shortest term, or `None` when
    /// there are no terms.
    pub fn shortest_term_length(&self) -> Option<usize> {
        self.extract_terms()
            .iter()
            .map(|term| term.chars().count())
            .min()
    }
}

/// Collects term text in pre-order. Negated subtrees are skipped unless
/// `include_negated` is set.
fn collect_terms(root: &Node, include_negated: bool, terms: &mut Vec<String>) {
    let mut pending = vec![root];

    while let Some(node) = pending.pop() {
        if let Node::Term { text, .. } = node {
            terms.push(text.clone());
        } else if include_negated || !node.is_negation() {
            pending.extend(node.children().into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "\"foo bar\" NOT baz but -no (yes !nah (deep))";

    #[test]
    fn mixed_query_forms() {
        let query = QueryString::new(MIXED);
        assert!(query.is_compilable());
        assert_eq!(
            query.to_exact().unwrap(),
            "\"foo bar\" NOT baz but -no (yes NOT nah (deep))"
        );
        assert_eq!(
            query.to_fuzzy().unwrap(),
            "\"foo bar\" NOT baz~ but~ -no~ (yes~ NOT nah~ (deep~))"
        );
        assert_eq!(
            query.to_prefix().unwrap(),
            "\"foo bar\" NOT baz* but* -no* (yes* NOT nah* (deep*))"
        );
    }

    #[test]
    fn mixed_query_terms() {
        let query = QueryString::new(MIXED);
        assert_eq!(
            query.extract_terms(),
            vec!["foo bar", "baz", "but", "no", "yes", "nah", "deep"]
        );
        assert_eq!(
            query.extract_matchable_terms(),
            vec!["foo bar", "but", "yes", "deep"]
        );
        assert_eq!(query.term_count(), 7);
    }

    #[test]
    fn matchable_terms_are_a_subset() {
        let query = QueryString::new("a -(b c) NOT d OR +e");
        let all = query.extract_terms();
        for term in query.extract_matchable_terms() {
            assert!(all.contains(&term));
        }
        assert_eq!(query.extract_matchable_terms(), vec!["a", "e"]);
    }

    #[test]
    fn shortest_term_length() {
        assert_eq!(
            QueryString::new("foo foobar foobarbaz").shortest_term_length(),
            Some(3)
        );
        assert_eq!(QueryString::new("ü ab").shortest_term_length(), Some(1));
        assert_eq!(QueryString::new("").shortest_term_length(), None);
    }

    #[test]
    fn malformed_input_is_corrected() {
        let input = "-(\"xml - +(view)\" (+sql ) *** OR **orm~~) user:name |*~\\  +\"foo bar\"    AND\0  \"   \" \"   \" +-";
        let query = QueryString::new(input);
        assert!(query.is_compilable());
        assert_eq!(
            query.to_exact().unwrap(),
            "-(\"xml - +(view)\" (+sql) \\*\\*\\* OR orm) user\\:name \\|\\*\\~\\  +\"foo bar\" AND \"   \" \"   \""
        );
    }

    #[test]
    fn user_modifiers_are_replaced() {
        let query = QueryString::new("contro~ help*");
        assert_eq!(query.to_prefix().unwrap(), "contro* help*");
        assert_eq!(query.to_fuzzy().unwrap(), "contro~ help~");
    }

    #[test]
    fn empty_query() {
        let query = QueryString::new("  ( ) ");
        assert!(query.is_compilable());
        assert_eq!(query.term_count(), 0);
        assert_eq!(query.to_exact().unwrap(), "");
    }

    #[test]
    fn empty_word_is_not_compilable() {
        let tree = SyntaxTree::new("", Some(Node::word("")));
        let query = QueryString::from_tree(tree);
        assert!(!query.is_compilable());
        assert_eq!(query.to_prefix(), Err(CompileError::EmptyWord));
    }

    #[test]
    fn long_sign_runs_compile() {
        let query = QueryString::new(&format!("{}a", "+".repeat(300_000)));
        assert_eq!(query.to_exact().unwrap(), "+a");
        assert_eq!(query.extract_terms(), vec!["a"]);
    }

    #[test]
    fn long_adjacency_compiles() {
        let query = QueryString::new(&"ab ".repeat(300_000));
        assert!(query.is_compilable());
        assert_eq!(query.term_count(), 300_000);
        assert_eq!(query.extract_matchable_terms().len(), 300_000);
        let prefix = query.to_prefix().unwrap();
        assert!(prefix.starts_with("ab* ab* ab*"));
        assert_eq!(prefix.len(), 300_000 * 4 - 1);
    }

    #[test]
    fn thousand_word_queries_are_compilable() {
        let query = QueryString::new(&"abc ".repeat(1100));
        assert!(query.is_compilable());
        assert_eq!(query.term_count(), 1100);
        assert_eq!(query.shortest_term_length(), Some(3));
    }

    #[test]
    fn long_keyword_chains_compile() {
        let input = vec!["a"; 50_000].join(" AND ");
        let query = QueryString::new(&input);
        assert_eq!(query.to_exact().unwrap(), input);

        let input = vec!["b"; 50_000].join(" OR ");
        assert_eq!(QueryString::new(&input).to_fuzzy().unwrap(), input.replace('b', "b~"));
    }

    #[test]
    fn compiled_forms_are_deterministic() {
        for input in [MIXED, "a OR b AND c", "((x", "+-!y"] {
            let first = QueryString::new(input);
            let second = QueryString::new(input);
            assert_eq!(first.to_exact(), second.to_exact());
            assert_eq!(first.to_fuzzy(), second.to_fuzzy());
            assert_eq!(first.to_prefix(), second.to_prefix());
        }
    }
}
