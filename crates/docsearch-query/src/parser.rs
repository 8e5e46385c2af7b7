//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent. Parsing
//! never fails: operators without operands, empty groups and unbalanced
//! parentheses are corrected by dropping the offending tokens.
//!
//! # Grammar
//!
//! ```text
//! query     → or_expr
//! or_expr   → and_expr ("OR" and_expr)*
//! and_expr  → implicit ("AND" implicit)*
//! implicit  → unary+
//! unary     → ("NOT" | "!") unary | ("+" | "-") primary | primary
//! primary   → WORD | PHRASE | "(" or_expr ")"
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. `NOT` / `!`, `+`, `-`
//! 2. Adjacency (implicit AND)
//! 3. Explicit `AND`
//! 4. `OR`
//!
//! Runs of operands at one precedence level are joined pairwise, so a chain
//! of `n` operands nests `log2(n)` levels deep. Chains of up to three operands
//! associate to the left.

use std::mem;

use crate::{
    ast::Node,
    lexer::{Token, tokenize},
};

/// Deepest nesting of groups and unary operators the parser descends into.
pub const MAX_DEPTH: usize = 64;

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
    /// Current nesting depth.
    depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parses the whole token stream.
    ///
    /// Stray closing parentheses at the top level are skipped, and whatever
    /// follows them is joined to the tree by adjacency.
    fn parse(mut self) -> Option<Node> {
        let mut operands = Vec::new();

        while self.peek().is_some() {
            operands.extend(self.parse_or_expr());
            if self.check(&Token::GroupClose) {
                self.advance();
            }
        }

        chain(operands, |l, r| Node::and(l, r, false))
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Option<Node> {
        let mut operands: Vec<Node> = self.parse_and_expr().into_iter().collect();

        while self.check(&Token::Or) {
            self.advance(); // consume OR
            operands.extend(self.parse_and_expr());
        }

        chain(operands, Node::or)
    }

    /// Parses: and_expr → implicit ("AND" implicit)*
    fn parse_and_expr(&mut self) -> Option<Node> {
        let mut operands: Vec<Node> = self.parse_implicit().into_iter().collect();

        while self.check(&Token::And) {
            self.advance(); // consume AND
            operands.extend(self.parse_implicit());
        }

        chain(operands, |l, r| Node::and(l, r, true))
    }

    /// Parses: implicit → unary+
    fn parse_implicit(&mut self) -> Option<Node> {
        let mut operands = Vec::new();

        while self.can_start_unary() {
            operands.extend(self.parse_unary());
        }

        chain(operands, |l, r| Node::and(l, r, false))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Word(_)
                    | Token::Phrase(_)
                    | Token::Not
                    | Token::Mandatory
                    | Token::Prohibited
                    | Token::GroupOpen
            )
        )
    }

    /// Parses: unary → ("NOT" | "!") unary | ("+" | "-") primary | primary
    fn parse_unary(&mut self) -> Option<Node> {
        self.skip_dropped_operators();
        let token = self.peek().cloned()?;

        match token {
            Token::Not => {
                self.advance();
                self.nested(|p| p.parse_unary()).map(Node::not)
            }
            Token::Mandatory | Token::Prohibited => {
                self.advance();
                let wrap = if token == Token::Mandatory {
                    Node::mandatory
                } else {
                    Node::prohibited
                };
                self.nested(Self::parse_primary).map(wrap)
            }
            _ => self.parse_primary(),
        }
    }

    /// Skips operators that are overridden by the one after them: `NOT`
    /// before a sign, and a sign before any other operator.
    fn skip_dropped_operators(&mut self) {
        loop {
            let next = self.tokens.get(self.position + 1);
            let dropped = match self.peek() {
                Some(Token::Not) => matches!(next, Some(Token::Mandatory | Token::Prohibited)),
                Some(Token::Mandatory | Token::Prohibited) => matches!(
                    next,
                    Some(Token::Mandatory | Token::Prohibited | Token::Not)
                ),
                _ => false,
            };
            if !dropped {
                return;
            }
            self.advance();
        }
    }

    /// Parses: primary → WORD | PHRASE | "(" or_expr ")"
    ///
    /// Returns `None` without consuming anything if the current token cannot
    /// start a primary expression.
    fn parse_primary(&mut self) -> Option<Node> {
        match self.peek().cloned()? {
            Token::Word(text) => {
                self.advance();
                Some(Node::word(text))
            }
            Token::Phrase(text) => {
                self.advance();
                Some(Node::phrase(text))
            }
            Token::GroupOpen => self.parse_group(),
            _ => None,
        }
    }

    /// Parses a parenthesized group.
    ///
    /// Empty groups vanish, and a group without its closing parenthesis
    /// contributes its contents ungrouped.
    fn parse_group(&mut self) -> Option<Node> {
        self.advance(); // consume (
        let inner = self.nested(Self::parse_or_expr);

        if self.check(&Token::GroupClose) {
            self.advance(); // consume )
            inner.map(Node::group)
        } else {
            inner
        }
    }

    /// Runs `f` one nesting level deeper. Past [`MAX_DEPTH`] the current
    /// token is discarded instead.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Option<Node>) -> Option<Node> {
        if self.depth >= MAX_DEPTH {
            self.advance();
            return None;
        }
        self.depth += 1;
        let node = f(self);
        self.depth -= 1;
        node
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Joins operands with `op`, pairing neighbours until one node is left.
///
/// Operand order is preserved. Returns `None` for an empty run, which drops
/// the operator entirely.
fn chain(mut operands: Vec<Node>, op: impl Fn(Node, Node) -> Node) -> Option<Node> {
    while operands.len() > 1 {
        let mut paired = Vec::with_capacity(operands.len().div_ceil(2));
        let mut rest = operands.into_iter();
        while let Some(left) = rest.next() {
            paired.push(match rest.next() {
                Some(right) => op(left, right),
                None => left,
            });
        }
        operands = paired;
    }
    operands.pop()
}

/// Parses a query string into an AST.
///
/// Returns `None` when the input contains nothing that forms a query.
pub fn parse(input: &str) -> Option<Node> {
    Parser::new(tokenize(input)).parse()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn word(s: &str) -> Node {
        Node::word(s)
    }

    fn phrase(s: &str) -> Node {
        Node::phrase(s)
    }

    fn implicit(l: Node, r: Node) -> Node {
        Node::and(l, r, false)
    }

    fn explicit(l: Node, r: Node) -> Node {
        Node::and(l, r, true)
    }

    #[test]
    fn empty_query() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("()"), None);
        assert_eq!(parse("AND OR"), None);
    }

    #[test]
    fn single_term() {
        assert_eq!(parse("rust"), Some(word("rust")));
        assert_eq!(parse("\"a b\""), Some(phrase("a b")));
    }

    #[test]
    fn adjacency_is_left_associative() {
        assert_eq!(
            parse("a b c"),
            Some(implicit(implicit(word("a"), word("b")), word("c")))
        );
    }

    #[test]
    fn long_chains_pair_neighbours() {
        assert_eq!(
            parse("a b c d"),
            Some(implicit(
                implicit(word("a"), word("b")),
                implicit(word("c"), word("d"))
            ))
        );
        assert_eq!(
            parse("a OR b OR c OR d OR e"),
            Some(Node::or(
                Node::or(
                    Node::or(word("a"), word("b")),
                    Node::or(word("c"), word("d"))
                ),
                word("e")
            ))
        );
    }

    #[test]
    fn sign_runs_collapse_to_the_last_sign() {
        let input = format!("{}a", "+-".repeat(200_000));
        assert_eq!(parse(&input), Some(Node::prohibited(word("a"))));

        let input = format!("{}b", "NOT +".repeat(100_000));
        assert_eq!(parse(&input), Some(Node::mandatory(word("b"))));
    }

    #[test]
    fn explicit_and_is_preserved() {
        assert_eq!(parse("a AND b"), Some(explicit(word("a"), word("b"))));
        assert_eq!(parse("a && b"), Some(explicit(word("a"), word("b"))));
    }

    #[test]
    fn adjacency_binds_tighter_than_and() {
        assert_eq!(
            parse("a b AND c"),
            Some(explicit(implicit(word("a"), word("b")), word("c")))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("a OR b AND c"),
            Some(Node::or(word("a"), explicit(word("b"), word("c"))))
        );
        assert_eq!(
            parse("a b OR c"),
            Some(Node::or(implicit(word("a"), word("b")), word("c")))
        );
    }

    #[test]
    fn not_binds_tightest() {
        assert_eq!(
            parse("NOT a b"),
            Some(implicit(Node::not(word("a")), word("b")))
        );
        assert_eq!(parse("!a"), Some(Node::not(word("a"))));
        assert_eq!(
            parse("NOT NOT a"),
            Some(Node::not(Node::not(word("a"))))
        );
    }

    #[test]
    fn signs() {
        assert_eq!(
            parse("+a -b"),
            Some(implicit(
                Node::mandatory(word("a")),
                Node::prohibited(word("b"))
            ))
        );
        assert_eq!(
            parse("-(a b)"),
            Some(Node::prohibited(Node::group(implicit(word("a"), word("b")))))
        );
    }

    #[test]
    fn sign_before_operator_is_dropped() {
        assert_eq!(parse("+-a"), Some(Node::prohibited(word("a"))));
        assert_eq!(parse("-!a"), Some(Node::not(word("a"))));
        assert_eq!(parse("NOT +a"), Some(Node::mandatory(word("a"))));
    }

    #[test]
    fn dangling_operators_are_dropped() {
        assert_eq!(parse("a AND"), Some(word("a")));
        assert_eq!(parse("OR a"), Some(word("a")));
        assert_eq!(parse("a OR OR b"), Some(Node::or(word("a"), word("b"))));
        assert_eq!(parse("a NOT"), Some(word("a")));
        assert_eq!(parse("a +)"), Some(word("a")));
    }

    #[test]
    fn groups() {
        assert_eq!(
            parse("(a OR b) c"),
            Some(implicit(Node::group(Node::or(word("a"), word("b"))), word("c")))
        );
        assert_eq!(parse("(a) ()"), Some(Node::group(word("a"))));
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(parse("(a b"), Some(implicit(word("a"), word("b"))));
        assert_eq!(parse("a) b"), Some(implicit(word("a"), word("b"))));
        assert_eq!(
            parse("((a) b"),
            Some(implicit(Node::group(word("a")), word("b")))
        );
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let input = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(parse(&input).is_some());

        let input = format!("{}a", "NOT ".repeat(10_000));
        assert!(parse(&input).is_some());
    }

    #[test]
    fn mixed_query() {
        assert_eq!(
            parse("\"foo bar\" NOT baz but -no (yes !nah (deep))"),
            Some(implicit(
                implicit(
                    implicit(phrase("foo bar"), Node::not(word("baz"))),
                    implicit(word("but"), Node::prohibited(word("no")))
                ),
                Node::group(implicit(
                    implicit(word("yes"), Node::not(word("nah"))),
                    Node::group(word("deep"))
                ))
            ))
        );
    }

    #[test]
    fn performance() {
        let query = "(rust OR golang) AND \"error handling\" -deprecated +async NOT legacy";
        let start = Instant::now();
        for _ in 0..1000 {
            let _ = parse(query);
        }
        assert!(start.elapsed().as_secs() < 1);
    }
}
