//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of tokens for the parser. The lexer
//! never fails: characters that cannot start a token are dropped.

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word, with escapes resolved.
    Word(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// `AND` or `&&`.
    And,

    /// `OR` or `||`.
    Or,

    /// `NOT` or `!`.
    Not,

    /// `+` at the start of a term.
    Mandatory,

    /// `-` at the start of a term.
    Prohibited,

    /// Left parenthesis.
    GroupOpen,

    /// Right parenthesis.
    GroupClose,
}

/// Characters a backslash escapes inside a word.
const ESCAPABLE: &[char] = &['\\', '"', '+', '-', '!', '(', ')', ':', '#', '@', ' '];

/// Characters removed from the input before lexing.
const STRIPPED: &[char] = &['\0', '\u{a0}'];

/// Keywords and the tokens they produce. Keywords are case-sensitive.
const KEYWORDS: &[(&str, Token)] = &[
    ("AND", Token::And),
    ("&&", Token::And),
    ("OR", Token::Or),
    ("||", Token::Or),
    ("NOT", Token::Not),
];

/// Tokenizes a query string.
struct Lexer {
    /// Input characters with stripped characters removed.
    chars: Vec<char>,
    /// Index of the next unread character.
    position: usize,
}

impl Lexer {
    /// Creates a new lexer for the given input.
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().filter(|c| !STRIPPED.contains(c)).collect(),
            position: 0,
        }
    }

    /// Tokenizes the entire input.
    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek(0).is_none() {
                break;
            }
            if let Some(token) = self.next_token() {
                tokens.push(token);
            }
        }

        tokens
    }

    /// Reads the token at the current position. Returns `None` when the
    /// characters consumed do not form a token.
    fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.read_keyword() {
            return Some(token);
        }

        let ch = self.peek(0)?;
        self.position += 1;
        match ch {
            '(' => Some(Token::GroupOpen),
            ')' => Some(Token::GroupClose),
            '!' => Some(Token::Not),
            '+' | '-' => {
                // A sign with nothing attached is noise.
                let next = self.peek(0)?;
                if next.is_whitespace() {
                    None
                } else if ch == '+' {
                    Some(Token::Mandatory)
                } else {
                    Some(Token::Prohibited)
                }
            }
            '"' => self.read_phrase(),
            _ => {
                self.position -= 1;
                Some(self.read_word())
            }
        }
    }

    /// Reads a keyword if one starts here and is followed by a delimiter.
    fn read_keyword(&mut self) -> Option<Token> {
        for (keyword, token) in KEYWORDS {
            let len = keyword.chars().count();
            let matches = keyword
                .chars()
                .enumerate()
                .all(|(i, ch)| self.peek(i) == Some(ch));
            if matches && self.peek(len).is_none_or(is_keyword_boundary) {
                self.position += len;
                return Some(token.clone());
            }
        }
        None
    }

    /// Reads a quoted phrase whose opening quote was just consumed.
    ///
    /// An unterminated quote yields no token; lexing resumes right after it.
    fn read_phrase(&mut self) -> Option<Token> {
        let mut content = String::new();
        let mut cursor = self.position;

        while let Some(&ch) = self.chars.get(cursor) {
            match ch {
                '"' => {
                    self.position = cursor + 1;
                    return Some(Token::Phrase(content));
                }
                '\\' if matches!(self.chars.get(cursor + 1), Some('"' | '\\')) => {
                    content.push(self.chars[cursor + 1]);
                    cursor += 2;
                }
                _ => {
                    content.push(ch);
                    cursor += 1;
                }
            }
        }

        None
    }

    /// Reads a bare word up to whitespace, a parenthesis, or a quote.
    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(ch) = self.peek(0) {
            if ch == '\\' {
                match self.peek(1) {
                    Some(next) if ESCAPABLE.contains(&next) => {
                        word.push(next);
                        self.position += 2;
                    }
                    _ => {
                        word.push('\\');
                        self.position += 1;
                    }
                }
                continue;
            }
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                break;
            }
            word.push(ch);
            self.position += 1;
        }

        Token::Word(word)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    /// Returns the character `offset` places ahead without consuming it.
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }
}

/// Whether `ch` may directly follow a keyword.
fn is_keyword_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '"' | '(' | ')' | '+' | '-' | '!')
}

/// Convenience function to tokenize a query string.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
