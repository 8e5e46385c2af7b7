//! Term sanitizing.
//!
//! Users sometimes type their own `*` and `~` operators. Those are stripped
//! from word terms because the generator appends its own modifier.

use crate::ast::Node;

/// Characters treated as user-supplied term modifiers.
const MODIFIERS: [char; 2] = ['*', '~'];

/// Strips leading and trailing modifier runs from every word term in the tree.
///
/// Phrases are left alone, as are words made only of modifier characters.
pub fn sanitize(node: &mut Node) {
    let mut pending = vec![node];

    while let Some(node) = pending.pop() {
        match node {
            Node::Term {
                text,
                phrase: false,
            } => {
                let cleaned = sanitize_word(text);
                if cleaned.len() != text.len() {
                    *text = cleaned.to_owned();
                }
            }
            Node::Term { phrase: true, .. } => {}
            Node::Mandatory(c) | Node::Prohibited(c) | Node::Not(c) | Node::Group(c) => {
                pending.push(c);
            }
            Node::And { left, right, .. } | Node::Or(left, right) => {
                pending.push(right);
                pending.push(left);
            }
        }
    }
}

/// Strips modifier runs from both ends of a word that has at least one
/// other character.
fn sanitize_word(word: &str) -> &str {
    let trimmed = word.trim_matches(MODIFIERS);
    if trimmed.is_empty() { word } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitized(mut node: Node) -> Node {
        sanitize(&mut node);
        node
    }

    #[test]
    fn strips_both_ends() {
        assert_eq!(sanitize_word("**orm~~"), "orm");
        assert_eq!(sanitize_word("foo*"), "foo");
        assert_eq!(sanitize_word("~foo"), "foo");
        assert_eq!(sanitize_word("*~*bar~*~"), "bar");
    }

    #[test]
    fn keeps_inner_modifiers() {
        assert_eq!(sanitize_word("a*b~c"), "a*b~c");
        assert_eq!(sanitize_word("*a*b*"), "a*b");
    }

    #[test]
    fn modifier_only_words_are_untouched() {
        assert_eq!(sanitize_word("***"), "***");
        assert_eq!(sanitize_word("~"), "~");
    }

    #[test]
    fn phrases_are_untouched() {
        assert_eq!(sanitized(Node::phrase("*foo*")), Node::phrase("*foo*"));
    }

    #[test]
    fn walks_the_whole_tree() {
        let tree = Node::or(
            Node::prohibited(Node::group(Node::word("a*"))),
            Node::and(Node::not(Node::word("~b")), Node::word("c~"), true),
        );
        let expected = Node::or(
            Node::prohibited(Node::group(Node::word("a"))),
            Node::and(Node::not(Node::word("b")), Node::word("c"), true),
        );
        assert_eq!(sanitized(tree), expected);
    }

    #[test]
    fn idempotent() {
        let once = sanitized(Node::and(Node::word("**x~"), Node::word("***"), false));
        assert_eq!(sanitized(once.clone()), once);
    }
}
