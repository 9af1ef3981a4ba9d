//! Token definitions for the Rockstar lexer.

use ahash::AHashSet;
use lazy_static::lazy_static;

use crate::span::Span;

/// All token types.
///
/// Rockstar keywords depend on their position in a line, so words stay
/// words here and the parser decides what they mean.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A word as written, case preserved.
    Word(String),
    Number(f64),
    /// `"double quoted"`
    StringLiteral(String),
    /// The rest of a line after `says`/`said`.
    PoeticString(String),
    /// `+ - * /`
    Symbol(char),

    Comma,
    Ampersand,
    Dot,
    Newline,
    Eof,
}

impl TokenKind {
    /// The lowercased word, if this is a word token.
    pub fn word(&self) -> Option<String> {
        match self {
            TokenKind::Word(w) => Some(w.to_lowercase()),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Word(w) => write!(f, "{}", w),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::StringLiteral(s) => write!(f, "\"{}\"", s),
            TokenKind::PoeticString(s) => write!(f, "{}", s),
            TokenKind::Symbol(c) => write!(f, "{}", c),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(position, position, line, column),
        }
    }
}

lazy_static! {
    /// Words that can never start or continue a variable name.
    pub static ref KEYWORDS: AHashSet<&'static str> = [
        // statements
        "say", "says", "said", "shout", "whisper", "scream", "put", "into", "let", "be",
        "build", "up", "knock", "down", "turn", "round", "around", "if", "else", "while",
        "until", "break", "continue", "take", "give", "send", "back", "return", "takes",
        "wants", "taking", "listen", "to", "rock", "push", "roll", "pop", "join", "unite",
        "split", "cut", "shatter", "cast", "burn", "with", "at",
        // operators
        "is", "are", "was", "were", "ain't", "aint", "isn't", "isnt", "aren't", "wasn't",
        "weren't", "not", "and", "or", "nor", "plus", "minus", "without", "times", "of",
        "over", "than", "as", "higher", "greater", "bigger", "stronger", "lower", "less",
        "smaller", "weaker", "high", "great", "big", "strong", "low", "little", "small",
        "weak", "'n'",
        // constants
        "true", "right", "yes", "ok", "false", "wrong", "no", "lies", "nothing", "nowhere",
        "nobody", "gone", "null", "empty", "silent", "silence", "mysterious",
        // articles
        "a", "an", "the", "my", "your", "our",
    ]
    .into_iter()
    .chain(PRONOUNS.iter().copied())
    .collect();

    pub static ref PRONOUNS: AHashSet<&'static str> = [
        "it", "he", "she", "him", "her", "they", "them", "ze", "hir", "zie", "zir", "xe",
        "xem", "ve", "ver",
    ]
    .into_iter()
    .collect();

    /// Articles that start a common variable: `my heart`, `the walls`.
    pub static ref COMMON_PREFIXES: AHashSet<&'static str> =
        ["a", "an", "the", "my", "your", "our"].into_iter().collect();
}

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_lowercase().as_str())
}
