//! Statement parsing: one statement per line, blocks closed by blank lines.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};
use super::expressions::constant;
use super::precedence::Precedence;

/// Where a statement list sits, which decides what closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// The whole program. Only the end of input closes it.
    Program,
    /// A function body.
    Function,
    /// The body of an `If`, `Else` or loop.
    Branch,
}

impl Parser {
    /// Parse statements until the block closes.
    ///
    /// A nested block ends at a blank line, at an `Else` (left for the
    /// enclosing `If` to pick up) or at the end of input. The top level only
    /// ends at the end of input.
    ///
    /// A return after other statements in a branch closes that branch and
    /// belongs to the enclosing block: `Give the answer` after a loop body
    /// returns once the loop is done. A return that opens a branch stays in
    /// it as an early exit.
    pub(crate) fn block(&mut self, kind: BlockKind) -> ParseResult<Vec<Stmt>> {
        let nested = kind != BlockKind::Program;
        let mut statements = Vec::new();

        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    if nested {
                        break;
                    }
                    continue;
                }
                _ => {}
            }
            if self.check_word("else") {
                if nested {
                    break;
                }
                return Err(ParserError::general(
                    "'Else' without a matching 'If'",
                    self.current_span(),
                ));
            }
            if kind == BlockKind::Branch && !statements.is_empty() && self.at_return() {
                break;
            }
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    fn at_return(&self) -> bool {
        matches!(
            self.peek_word().as_deref(),
            Some("give" | "send" | "return")
        )
    }

    pub(crate) fn statement(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        let Some(word) = self.peek_word() else {
            return self.expression_statement();
        };

        let kind = match word.as_str() {
            "say" | "shout" | "whisper" | "scream" => {
                self.advance();
                StmtKind::Output(self.expression()?)
            }
            "listen" => self.listen_statement()?,
            "put" => self.put_statement()?,
            "let" => self.let_statement()?,
            "build" => self.increment_statement(true)?,
            "knock" => self.increment_statement(false)?,
            "turn" => self.turn_statement()?,
            "if" => return self.if_statement(),
            "while" | "until" => return self.loop_statement(),
            "break" => {
                self.advance();
                if self.match_word("it") {
                    self.expect_word("down")?;
                }
                StmtKind::Break
            }
            "continue" => {
                self.advance();
                StmtKind::Continue
            }
            "take" => {
                self.advance();
                for word in ["it", "to", "the", "top"] {
                    self.expect_word(word)?;
                }
                StmtKind::Continue
            }
            "give" | "send" | "return" => self.return_statement()?,
            "rock" | "push" => self.rock_statement()?,
            "roll" | "pop" => self.roll_statement()?,
            "join" | "unite" => {
                let (source, target, delimiter) = self.transform_statement()?;
                StmtKind::Join {
                    source,
                    target,
                    delimiter,
                }
            }
            "split" | "cut" | "shatter" => {
                let (source, target, delimiter) = self.transform_statement()?;
                StmtKind::Split {
                    source,
                    target,
                    delimiter,
                }
            }
            "cast" | "burn" => {
                let (source, target, radix) = self.transform_statement()?;
                StmtKind::Cast {
                    source,
                    target,
                    radix,
                }
            }
            _ => return self.variable_statement(),
        };

        let span = span.merge(&self.previous_span());
        self.end_statement()?;
        Ok(Stmt::new(kind, span))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        let span = expr.span;
        self.end_statement()?;
        Ok(Stmt::new(StmtKind::Expression(expr), span))
    }

    /// Lines that start with a variable: assignments, poetic literals and
    /// function declarations. Anything else is an expression statement.
    fn variable_statement(&mut self) -> ParseResult<Stmt> {
        if !self.is_variable_start() {
            return self.expression_statement();
        }
        let start = self.current;
        let span = self.current_span();
        let target = self.variable()?;

        let kind = match self.peek_word().as_deref() {
            Some("is" | "are" | "was" | "were") => {
                self.advance();
                let value = self.assignment_value()?;
                StmtKind::Assign { target, value }
            }
            Some("says" | "said") => {
                self.advance();
                let token = self.advance();
                match token.kind {
                    TokenKind::PoeticString(text) => StmtKind::Assign {
                        target,
                        value: Expr::new(ExprKind::String(text), token.span),
                    },
                    other => {
                        return Err(ParserError::unexpected_token(
                            "poetic string",
                            other.to_string(),
                            token.span,
                        ))
                    }
                }
            }
            Some("takes" | "wants") => return self.function_declaration(target, span),
            _ => {
                self.current = start;
                return self.expression_statement();
            }
        };

        let span = span.merge(&self.previous_span());
        self.end_statement()?;
        Ok(Stmt::new(kind, span))
    }

    /// After `is`: a literal or constant starts an expression, anything else
    /// is a poetic number.
    fn assignment_value(&mut self) -> ParseResult<Expr> {
        let literal = match &self.peek().kind {
            TokenKind::Number(_) | TokenKind::StringLiteral(_) => true,
            TokenKind::Word(w) => constant(&w.to_lowercase()).is_some(),
            _ => false,
        };
        if literal {
            self.expression()
        } else {
            self.poetic_number()
        }
    }

    /// Each word is one digit, its length modulo 10; the first full stop is
    /// the decimal point.
    fn poetic_number(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        let mut digits = String::new();
        let mut seen_point = false;

        while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            match self.advance().kind {
                TokenKind::Word(word) => {
                    let length = word.chars().filter(|c| *c != '\'').count();
                    digits.push_str(&(length % 10).to_string());
                }
                TokenKind::Dot if !seen_point => {
                    seen_point = true;
                    digits.push('.');
                }
                _ => {}
            }
        }

        let digits = digits.trim_end_matches('.');
        let value = if digits.is_empty() {
            0.0
        } else {
            digits
                .parse::<f64>()
                .map_err(|_| ParserError::general(format!("Invalid poetic number '{}'", digits), span))?
        };
        Ok(Expr::new(ExprKind::Number(value), span.merge(&self.previous_span())))
    }

    fn function_declaration(&mut self, name: VarRef, span: crate::span::Span) -> ParseResult<Stmt> {
        self.advance(); // takes / wants
        let VarRef::Named(name) = name else {
            return Err(ParserError::general("A function needs a name, not a pronoun", span));
        };

        let mut params = Vec::new();
        loop {
            let param_span = self.current_span();
            match self.variable()? {
                VarRef::Named(param) => params.push(param),
                VarRef::Pronoun(p) => {
                    return Err(ParserError::general(
                        format!("Pronoun '{}' cannot be a parameter", p),
                        param_span,
                    ))
                }
            }
            if self.match_word("and") {
                continue;
            }
            if self.at_list_separator() {
                self.consume_list_separator();
                continue;
            }
            break;
        }
        let header = span.merge(&self.previous_span());
        self.end_statement()?;

        let body = self.block(BlockKind::Function)?;
        Ok(Stmt::new(
            StmtKind::Function(FunctionDecl {
                name,
                params,
                body,
                span: header,
            }),
            header,
        ))
    }

    fn listen_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        if self.match_word("to") {
            Ok(StmtKind::Input(Some(self.variable()?)))
        } else {
            Ok(StmtKind::Input(None))
        }
    }

    fn put_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let value = self.expression()?;
        self.expect_word("into")?;
        let target = self.assignment_target()?;
        Ok(StmtKind::Assign { target, value })
    }

    fn let_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let target = self.assignment_target()?;
        if self.match_word("at") {
            let index = self.with_lists(false, |p| p.parse_precedence(Precedence::Term))?;
            self.expect_word("be")?;
            let value = self.expression()?;
            return Ok(StmtKind::IndexAssign {
                target,
                index,
                value,
            });
        }
        self.expect_word("be")?;
        let value = self.expression()?;
        Ok(StmtKind::Assign { target, value })
    }

    /// The variable a `Put` or `Let` writes to. Literals are rejected here
    /// rather than reported as a missing variable.
    fn assignment_target(&mut self) -> ParseResult<VarRef> {
        if matches!(
            self.peek().kind,
            TokenKind::Number(_) | TokenKind::StringLiteral(_)
        ) {
            return Err(ParserError::invalid_assignment_target(self.current_span()));
        }
        self.variable()
    }

    /// `Build X up, up` / `Knock X down down`: one step per keyword.
    fn increment_statement(&mut self, up: bool) -> ParseResult<StmtKind> {
        self.advance();
        let target = self.variable()?;
        let step = if up { "up" } else { "down" };

        let mut count: u16 = 0;
        loop {
            if self.match_word(step) {
                count = count.saturating_add(1);
            } else if self.check(&TokenKind::Comma) && self.peek_word_at(1).as_deref() == Some(step) {
                self.advance();
            } else {
                break;
            }
        }
        if count == 0 {
            return Err(self.unexpected(format!("'{}'", step)));
        }

        Ok(if up {
            StmtKind::Increment { target, count }
        } else {
            StmtKind::Decrement { target, count }
        })
    }

    fn turn_statement(&mut self) -> ParseResult<StmtKind> {
        fn mode(word: Option<String>) -> Option<RoundMode> {
            match word.as_deref() {
                Some("up") => Some(RoundMode::Up),
                Some("down") => Some(RoundMode::Down),
                Some("round" | "around") => Some(RoundMode::Nearest),
                _ => None,
            }
        }

        self.advance();
        if let Some(mode) = mode(self.peek_word()) {
            self.advance();
            let target = self.variable()?;
            return Ok(StmtKind::Round { target, mode });
        }
        let target = self.variable()?;
        let mode = mode(self.peek_word()).ok_or_else(|| self.unexpected("'up', 'down' or 'round'"))?;
        self.advance();
        Ok(StmtKind::Round { target, mode })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        self.advance();
        let condition = self.expression()?;
        let span = span.merge(&self.previous_span());
        self.end_statement()?;

        let then_branch = self.block(BlockKind::Branch)?;
        let else_branch = if self.match_word("else") {
            self.match_token(&TokenKind::Newline);
            Some(self.block(BlockKind::Branch)?)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn loop_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.current_span();
        let until = self.advance().kind.word().as_deref() == Some("until");
        let condition = self.expression()?;
        let span = span.merge(&self.previous_span());
        self.end_statement()?;

        let body = self.block(BlockKind::Branch)?;
        let kind = if until {
            StmtKind::Until { condition, body }
        } else {
            StmtKind::While { condition, body }
        };
        Ok(Stmt::new(kind, span))
    }

    /// `Give back X`, `Give X back`, `Send back X`, `Return X`.
    fn return_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        self.match_word("back");
        let value = self.expression()?;
        self.match_word("back");
        Ok(StmtKind::Return(value))
    }

    /// `Rock X`, `Rock X with 1, 2` or `Rock 1, 2 into X`.
    fn rock_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let start = self.current;
        if self.is_variable_start() {
            let target = self.variable()?;
            if self.match_word("with") {
                let items = self.item_list()?;
                return Ok(StmtKind::ArrayPush { target, items });
            }
            if self.at_line_end() {
                return Ok(StmtKind::ArrayPush {
                    target,
                    items: Vec::new(),
                });
            }
            self.current = start;
        }
        let items = self.item_list()?;
        self.expect_word("into")?;
        let target = self.variable()?;
        Ok(StmtKind::ArrayPush { target, items })
    }

    fn item_list(&mut self) -> ParseResult<Vec<Expr>> {
        self.with_lists(false, |p| {
            let mut items = vec![p.expression()?];
            while p.at_list_separator() {
                p.consume_list_separator();
                items.push(p.expression()?);
            }
            Ok(items)
        })
    }

    /// `Roll X [into Y]`
    fn roll_statement(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let source = self.variable()?;
        let target = if self.match_word("into") {
            Some(self.variable()?)
        } else {
            None
        };
        Ok(StmtKind::Pop { source, target })
    }

    /// Shared shape of join, split and cast: `<verb> source [into X] [with Y]`.
    fn transform_statement(&mut self) -> ParseResult<(Expr, Option<VarRef>, Option<Expr>)> {
        self.advance();
        let source = self.parse_precedence(Precedence::Factor)?;
        let target = if self.match_word("into") {
            Some(self.variable()?)
        } else {
            None
        };
        let with = if self.match_word("with") {
            Some(self.with_lists(false, |p| p.expression())?)
        } else {
            None
        };
        Ok((source, target, with))
    }
}
