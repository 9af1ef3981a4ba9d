//! Core parser struct and helper methods.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

use super::statements::BlockKind;

pub type ParseResult<T> = Result<T, ParserError>;

/// The parser for Rockstar.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    /// Whether a comma after an arithmetic operand starts a list of extra
    /// operands. Off inside call arguments and `Rock` item lists, where the
    /// comma separates items instead.
    pub(crate) allow_lists: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::eof(end.end, end.line, end.column));
        }
        Self {
            tokens,
            current: 0,
            allow_lists: true,
        }
    }

    /// Parse a complete program.
    pub fn parse(&mut self) -> ParseResult<Program> {
        let statements = self.block(BlockKind::Program)?;
        Ok(Program::new(statements))
    }

    // ===== Token manipulation =====

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let index = (self.current + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    /// The tokens from the current position on.
    pub(crate) fn remaining(&self) -> &[Token] {
        &self.tokens[self.current..]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ===== Words =====

    /// The current token as a lowercased word.
    pub(crate) fn peek_word(&self) -> Option<String> {
        self.peek().kind.word()
    }

    pub(crate) fn peek_word_at(&self, n: usize) -> Option<String> {
        self.peek_nth(n).kind.word()
    }

    pub(crate) fn check_word(&self, word: &str) -> bool {
        self.peek_word().as_deref() == Some(word)
    }

    pub(crate) fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_word(&mut self, word: &str) -> ParseResult<Token> {
        if self.check_word(word) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(format!("'{}'", word)))
        }
    }

    // ===== Lines =====

    /// True when only trailing punctuation is left before the end of the line.
    pub(crate) fn at_line_end(&self) -> bool {
        self.remaining()
            .iter()
            .find(|t| !matches!(t.kind, TokenKind::Comma | TokenKind::Dot))
            .map_or(true, |t| matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
    }

    /// Finish a statement: skip trailing commas and full stops, then consume
    /// the newline.
    pub(crate) fn end_statement(&mut self) -> ParseResult<()> {
        while matches!(self.peek().kind, TokenKind::Comma | TokenKind::Dot) {
            self.advance();
        }
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    /// Whether a list separator (`,`, `&`, `, and`, `'n'`) followed by an
    /// operand starts here.
    pub(crate) fn at_list_separator(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Comma => {
                let after = if self.peek_word_at(1).as_deref() == Some("and") { 2 } else { 1 };
                !matches!(
                    self.peek_nth(after).kind,
                    TokenKind::Newline | TokenKind::Eof | TokenKind::Comma | TokenKind::Dot
                )
            }
            TokenKind::Ampersand => true,
            TokenKind::Word(w) => w.eq_ignore_ascii_case("'n'"),
            _ => false,
        }
    }

    pub(crate) fn consume_list_separator(&mut self) {
        if self.match_token(&TokenKind::Comma) {
            self.match_word("and");
        } else {
            self.advance();
        }
    }

    /// Run `f` with list folding switched on or off, restoring it afterwards.
    pub(crate) fn with_lists<T>(
        &mut self,
        allow: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.allow_lists, allow);
        let result = f(self);
        self.allow_lists = saved;
        result
    }

    // ===== Errors and spans =====

    pub(crate) fn unexpected(&self, expected: impl Into<String>) -> ParserError {
        match self.peek().kind {
            TokenKind::Eof => ParserError::unexpected_eof(self.current_span()),
            ref kind => ParserError::unexpected_token(expected, kind.to_string(), self.current_span()),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }
}
