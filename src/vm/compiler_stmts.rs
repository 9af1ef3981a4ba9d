//! Statement compilation: AST statements to bytecode.

use crate::ast::{Expr, ExprKind, FunctionDecl, Stmt, StmtKind, VarRef};
use crate::error::CompileError;
use crate::span::Span;
use crate::value::Context;

use super::compiler::{CompileResult, Compiler};
use super::opcode::Op;

/// Which of the three in-place transformations a statement performs.
#[derive(Debug, Clone, Copy)]
enum Transform {
    Join,
    Split,
    Cast,
}

impl Compiler {
    /// Compile a statement.
    pub fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        let line = stmt.span.line;
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.compile_expr(expr)?;
                self.emit(Op::Pop, line);
            }
            StmtKind::Assign { target, value } => {
                self.compile_expr(value)?;
                let name = self.store_variable(target, span)?;
                self.pronouns.track(&name);
            }
            StmtKind::IndexAssign {
                target,
                index,
                value,
            } => {
                let name = self.load_for_update(target, span)?;
                self.compile_expr_in(index, Context::Scalar)?;
                self.compile_expr(value)?;
                self.emit(Op::SetIndex, line);
                self.store_named(&name, span)?;
                self.pronouns.track(&name);
            }
            StmtKind::Increment { target, count } => {
                self.compile_update(target, Op::Increment(*count), span)?;
            }
            StmtKind::Decrement { target, count } => {
                self.compile_update(target, Op::Decrement(*count), span)?;
            }
            StmtKind::Round { target, mode } => {
                self.compile_update(target, Op::Round(*mode), span)?;
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_if(condition, then_branch, else_branch.as_deref(), line)?;
            }
            StmtKind::While { condition, body } => {
                self.compile_loop(condition, body, false, line)?;
            }
            StmtKind::Until { condition, body } => {
                self.compile_loop(condition, body, true, line)?;
            }
            StmtKind::Break => self.emit_break(line),
            StmtKind::Continue => self.emit_continue(line)?,
            StmtKind::Function(decl) => {
                self.compile_function_decl(decl)?;
            }
            StmtKind::Return(value) => {
                self.compile_expr(value)?;
                self.emit(Op::Return, line);
            }
            StmtKind::Output(value) => {
                self.compile_expr(value)?;
                self.emit(Op::Print, line);
            }
            StmtKind::Input(target) => {
                self.emit(Op::Input, line);
                match target {
                    Some(target) => {
                        let name = self.store_variable(target, span)?;
                        self.pronouns.track(&name);
                    }
                    None => {
                        self.emit(Op::Pop, line);
                    }
                }
            }
            StmtKind::ArrayPush { target, items } => {
                let name = self.load_for_update(target, span)?;
                for item in items {
                    self.compile_expr(item)?;
                }
                let count = u8::try_from(items.len()).map_err(|_| {
                    CompileError::unsupported_operation("Too many items in one push", span)
                })?;
                self.emit(Op::ArrayPush(count), line);
                self.store_named(&name, span)?;
                self.pronouns.track(&name);
            }
            StmtKind::Pop { source, target } => {
                self.load_variable(source, span)?;
                self.emit(Op::PopFront, line);
                match target {
                    Some(target) => {
                        let name = self.store_variable(target, span)?;
                        self.pronouns.track(&name);
                    }
                    None => {
                        self.emit(Op::Pop, line);
                    }
                }
            }
            StmtKind::Join {
                source,
                target,
                delimiter,
            } => {
                self.compile_transform(Transform::Join, source, target.as_ref(), delimiter.as_ref(), span)?;
            }
            StmtKind::Split {
                source,
                target,
                delimiter,
            } => {
                self.compile_transform(Transform::Split, source, target.as_ref(), delimiter.as_ref(), span)?;
            }
            StmtKind::Cast {
                source,
                target,
                radix,
            } => {
                self.compile_transform(Transform::Cast, source, target.as_ref(), radix.as_ref(), span)?;
            }
        }
        Ok(())
    }

    /// Read a variable, apply `op` and write the result back.
    fn compile_update(&mut self, target: &VarRef, op: Op, span: Span) -> CompileResult<()> {
        self.load_variable(target, span)?;
        self.emit(op, span.line);
        self.store_variable(target, span)?;
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
        line: usize,
    ) -> CompileResult<()> {
        self.compile_expr_in(condition, Context::Boolean)?;
        let then_jump = self.emit_jump(Op::JumpIfFalse(0), line);
        self.compile_block(then_branch)?;

        match else_branch {
            Some(else_branch) => {
                let else_jump = self.emit_jump(Op::Jump(0), line);
                self.patch_jump(then_jump)?;
                self.compile_block(else_branch)?;
                self.patch_jump(else_jump)?;
            }
            None => self.patch_jump(then_jump)?,
        }
        Ok(())
    }

    /// `While` runs while the condition holds, `Until` until it does.
    fn compile_loop(
        &mut self,
        condition: &Expr,
        body: &[Stmt],
        until: bool,
        line: usize,
    ) -> CompileResult<()> {
        let loop_start = self.current_offset();
        self.compile_expr_in(condition, Context::Boolean)?;
        if until {
            self.emit(Op::Not, line);
        }
        let exit_jump = self.emit_jump(Op::JumpIfFalse(0), line);

        self.begin_loop(loop_start);
        self.compile_block(body)?;
        self.emit_loop(loop_start, line)?;
        self.patch_jump(exit_jump)?;
        self.end_loop()
    }

    /// The function's name is bound before its body is compiled, so the
    /// body can call itself. The function value itself is stored when the
    /// enclosing list binds its hoisted functions.
    fn compile_function_decl(&mut self, decl: &FunctionDecl) -> CompileResult<()> {
        let span = decl.span;
        let line = span.line;
        self.scopes.resolve_write(&decl.name, span)?;

        self.start_function(&decl.name, &decl.params, span)?;
        let body = self.compile_statements(&decl.body);
        let last_line = decl.body.last().map_or(line, |s| s.span.line);
        let proto = self.finish_function(last_line);
        body?;

        self.hoist_function(&decl.name, proto, span)
    }

    /// Join, split and cast write back into `into X` when given, otherwise
    /// into the source variable itself.
    fn compile_transform(
        &mut self,
        transform: Transform,
        source: &Expr,
        target: Option<&VarRef>,
        argument: Option<&Expr>,
        span: Span,
    ) -> CompileResult<()> {
        let destination = match (target, &source.kind) {
            (Some(target), _) => target.clone(),
            (None, ExprKind::Variable(var)) => var.clone(),
            (None, _) => {
                return Err(match transform {
                    Transform::Join => CompileError::JoinWithoutVariable(span),
                    Transform::Split => CompileError::CutWithoutVariable(span),
                    Transform::Cast => CompileError::CastIntoNothing(span),
                })
            }
        };

        self.compile_expr(source)?;
        if let Some(argument) = argument {
            self.compile_expr(argument)?;
        }
        let has_argument = argument.is_some();
        let op = match transform {
            Transform::Join => Op::Join(has_argument),
            Transform::Split => Op::Split(has_argument),
            Transform::Cast => Op::Cast(has_argument),
        };
        self.emit(op, span.line);

        let name = self.store_variable(&destination, span)?;
        self.pronouns.track(&name);
        Ok(())
    }
}
