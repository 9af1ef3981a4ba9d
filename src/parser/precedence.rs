//! Operator precedence for Pratt parsing.
//!
//! Rockstar operators are words, some of them several words long
//! (`is as high as`), so recognising one needs a look at the tokens ahead.

use crate::ast::BinaryOp;
use crate::lexer::{Token, TokenKind};

/// Operator precedence levels (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Or = 1,         // or nor
    And = 2,        // and
    Not = 3,        // not
    Equality = 4,   // is, ain't
    Comparison = 5, // is higher than, is as low as
    Term = 6,       // plus with minus without
    Factor = 7,     // times of over
    Call = 8,       // taking, at
    Primary = 9,
}

impl Precedence {
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

/// What an infix position holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Infix {
    Binary(BinaryOp),
    /// `arr at i`
    Index,
    /// `f taking a, b`
    Call,
}

/// An operator found at the current position, and how many tokens it spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfixMatch {
    pub infix: Infix,
    pub precedence: Precedence,
    pub width: usize,
}

impl InfixMatch {
    fn new(infix: Infix, precedence: Precedence, width: usize) -> Self {
        Self {
            infix,
            precedence,
            width,
        }
    }
}

fn word_at(tokens: &[Token], n: usize) -> Option<String> {
    tokens.get(n).and_then(|t| t.kind.word())
}

/// Recognise the operator starting at `tokens[0]`, if any.
pub fn infix_at(tokens: &[Token]) -> Option<InfixMatch> {
    use BinaryOp::*;
    use Precedence as P;

    if let Some(TokenKind::Symbol(c)) = tokens.first().map(|t| &t.kind) {
        let (op, precedence) = match c {
            '+' => (Add, P::Term),
            '-' => (Subtract, P::Term),
            '*' => (Multiply, P::Factor),
            _ => (Divide, P::Factor),
        };
        return Some(InfixMatch::new(Infix::Binary(op), precedence, 1));
    }

    let word = word_at(tokens, 0)?;
    let found = match word.as_str() {
        "or" => InfixMatch::new(Infix::Binary(Or), P::Or, 1),
        "nor" => InfixMatch::new(Infix::Binary(Nor), P::Or, 1),
        "and" => InfixMatch::new(Infix::Binary(And), P::And, 1),
        "is" | "are" | "was" | "were" => return is_operator(tokens),
        "ain't" | "aint" | "isn't" | "isnt" | "aren't" | "wasn't" | "weren't" => {
            InfixMatch::new(Infix::Binary(NotEqual), P::Equality, 1)
        }
        "plus" | "with" => InfixMatch::new(Infix::Binary(Add), P::Term, 1),
        "minus" | "without" => InfixMatch::new(Infix::Binary(Subtract), P::Term, 1),
        "times" | "of" => InfixMatch::new(Infix::Binary(Multiply), P::Factor, 1),
        "over" => InfixMatch::new(Infix::Binary(Divide), P::Factor, 1),
        "at" => InfixMatch::new(Infix::Index, P::Call, 1),
        "taking" => InfixMatch::new(Infix::Call, P::Call, 1),
        _ => return None,
    };
    Some(found)
}

/// Everything that can follow `is`: plain equality, `is not`, and the
/// comparison phrases.
fn is_operator(tokens: &[Token]) -> Option<InfixMatch> {
    use BinaryOp::*;
    use Precedence as P;

    let comparison = |op, width| Some(InfixMatch::new(Infix::Binary(op), P::Comparison, width));
    let next = word_at(tokens, 1);
    match next.as_deref() {
        Some("higher" | "greater" | "bigger" | "stronger")
            if word_at(tokens, 2).as_deref() == Some("than") =>
        {
            comparison(Greater, 3)
        }
        Some("lower" | "less" | "smaller" | "weaker")
            if word_at(tokens, 2).as_deref() == Some("than") =>
        {
            comparison(Less, 3)
        }
        Some("as") => {
            let closing = word_at(tokens, 3).as_deref() == Some("as");
            match word_at(tokens, 2).as_deref() {
                Some("high" | "great" | "big" | "strong") if closing => comparison(GreaterEqual, 4),
                Some("low" | "little" | "small" | "weak") if closing => comparison(LessEqual, 4),
                _ => None,
            }
        }
        Some("not") => Some(InfixMatch::new(Infix::Binary(NotEqual), P::Equality, 2)),
        _ => Some(InfixMatch::new(Infix::Binary(Equal), P::Equality, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn infix(source: &str) -> Option<InfixMatch> {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        infix_at(&tokens)
    }

    #[test]
    fn test_multi_word_comparisons() {
        let found = infix("is as high as X").unwrap();
        assert_eq!(found.infix, Infix::Binary(BinaryOp::GreaterEqual));
        assert_eq!(found.width, 4);

        let found = infix("are weaker than X").unwrap();
        assert_eq!(found.infix, Infix::Binary(BinaryOp::Less));
        assert_eq!(found.precedence, Precedence::Comparison);
    }

    #[test]
    fn test_is_not_and_plain_is() {
        assert_eq!(infix("is not X").unwrap().infix, Infix::Binary(BinaryOp::NotEqual));
        assert_eq!(infix("is X").unwrap().infix, Infix::Binary(BinaryOp::Equal));
        assert_eq!(infix("ain't X").unwrap().precedence, Precedence::Equality);
    }

    #[test]
    fn test_non_operators() {
        assert_eq!(infix("into X"), None);
        assert_eq!(infix("\"text\""), None);
    }
}
