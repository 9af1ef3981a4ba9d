//! Expression parsing using Pratt precedence, plus variable names.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::token::{is_keyword, COMMON_PREFIXES, PRONOUNS};
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};
use super::precedence::{infix_at, Infix, Precedence};

/// The literal a constant word stands for, if it is one.
pub(crate) fn constant(word: &str) -> Option<ExprKind> {
    let kind = match word {
        "true" | "right" | "yes" | "ok" => ExprKind::Boolean(true),
        "false" | "wrong" | "no" | "lies" => ExprKind::Boolean(false),
        "nothing" | "nowhere" | "nobody" | "gone" | "null" => ExprKind::Nothing,
        "empty" | "silent" | "silence" => ExprKind::String(String::new()),
        "mysterious" => ExprKind::Mysterious,
        _ => return None,
    };
    Some(kind)
}

impl Parser {
    pub(crate) fn expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(Precedence::Or)
    }

    pub(crate) fn parse_precedence(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(found) = infix_at(self.remaining()) {
            if found.precedence < min_precedence {
                break;
            }
            self.current += found.width;
            left = self.parse_infix(left, found.infix, found.precedence)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();

        match &self.peek().kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::new(ExprKind::Number(n), span))
            }
            TokenKind::StringLiteral(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::new(ExprKind::String(s), span))
            }
            TokenKind::Word(_) => self.parse_word_prefix(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_word_prefix(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        let word = self.peek_word().unwrap_or_default();

        if let Some(kind) = constant(&word) {
            self.advance();
            return Ok(Expr::new(kind, span));
        }

        match word.as_str() {
            "not" => {
                self.advance();
                let operand = self.parse_precedence(Precedence::Not)?;
                let span = span.merge(&operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        operator: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            "roll" | "pop" => {
                self.advance();
                let source = self.variable()?;
                Ok(Expr::new(ExprKind::Roll(source), span.merge(&self.previous_span())))
            }
            _ if self.is_variable_start() => {
                let var = self.variable()?;
                Ok(Expr::new(ExprKind::Variable(var), span.merge(&self.previous_span())))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_infix(&mut self, left: Expr, infix: Infix, precedence: Precedence) -> ParseResult<Expr> {
        match infix {
            Infix::Binary(operator) => self.binary_expr(left, operator, precedence),
            Infix::Index => {
                let index = self.with_lists(false, |p| p.parse_precedence(Precedence::Term))?;
                let span = left.span.merge(&index.span);
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(left),
                        index: Box::new(index),
                    },
                    span,
                ))
            }
            Infix::Call => {
                let ExprKind::Variable(callee) = left.kind else {
                    return Err(ParserError::general("Only a function name can be called", left.span));
                };
                let arguments = self.with_lists(false, |p| p.parse_arguments())?;
                let span = arguments
                    .last()
                    .map_or(left.span, |last| left.span.merge(&last.span));
                Ok(Expr::new(ExprKind::Call { callee, arguments }, span))
            }
        }
    }

    fn binary_expr(
        &mut self,
        left: Expr,
        operator: BinaryOp,
        precedence: Precedence,
    ) -> ParseResult<Expr> {
        let right = self.parse_precedence(precedence.next())?;
        let mut extra = Vec::new();
        if operator.is_arithmetic() && self.allow_lists {
            while self.at_list_separator() {
                self.consume_list_separator();
                extra.push(self.parse_precedence(precedence.next())?);
            }
        }
        let last = extra.last().unwrap_or(&right).span;
        let span = left.span.merge(&last);
        Ok(Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                extra,
            },
            span,
        ))
    }

    /// `taking a, b & c`: each argument stops before comparisons.
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut arguments = vec![self.parse_precedence(Precedence::Term)?];
        while self.at_list_separator() {
            self.consume_list_separator();
            arguments.push(self.parse_precedence(Precedence::Term)?);
        }
        Ok(arguments)
    }

    // ===== Variables =====

    /// Whether a variable name (or pronoun) starts at the current token.
    pub(crate) fn is_variable_start(&self) -> bool {
        let Some(word) = self.peek_word() else {
            return false;
        };
        if PRONOUNS.contains(word.as_str()) {
            return true;
        }
        if COMMON_PREFIXES.contains(word.as_str()) {
            return self.peek_word_at(1).is_some();
        }
        !is_keyword(&word)
    }

    /// Parse a variable reference.
    ///
    /// Common variables are an article plus one word (`my heart`), proper
    /// variables a run of capitalised words (`Doctor Feelgood`), simple
    /// variables a single word. Names are lowercased and joined by one space.
    pub(crate) fn variable(&mut self) -> ParseResult<VarRef> {
        if !self.is_variable_start() {
            return Err(self.unexpected("variable"));
        }
        let token = self.advance();
        let TokenKind::Word(spelled) = &token.kind else {
            return Err(ParserError::unexpected_token("variable", token.kind.to_string(), token.span));
        };
        let word = spelled.to_lowercase();

        if PRONOUNS.contains(word.as_str()) {
            return Ok(VarRef::Pronoun(word));
        }
        if COMMON_PREFIXES.contains(word.as_str()) {
            let noun = self.advance().kind.word().unwrap_or_default();
            return Ok(VarRef::Named(format!("{} {}", word, noun)));
        }

        let mut parts = vec![word];
        if spelled.starts_with(char::is_uppercase) {
            while let TokenKind::Word(next) = &self.peek().kind {
                if !next.starts_with(char::is_uppercase) || is_keyword(next) {
                    break;
                }
                parts.push(next.to_lowercase());
                self.advance();
            }
        }
        Ok(VarRef::Named(parts.join(" ")))
    }
}
