//! Expression compilation: AST expressions to bytecode.

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp, VarRef};
use crate::error::CompileError;
use crate::span::Span;
use crate::value::ops::string_operand_error;
use crate::value::Context;

use super::chunk::Constant;
use super::compiler::{CompileResult, Compiler, ValueClass};
use super::opcode::Op;

impl Compiler {
    /// Compile an expression with no context. The result is left on the
    /// stack; Nothing stays Nothing.
    pub fn compile_expr(&mut self, expr: &Expr) -> CompileResult<ValueClass> {
        let line = expr.span.line;
        match &expr.kind {
            ExprKind::Number(n) => {
                self.emit_constant(Constant::Number(*n), expr.span)?;
                Ok(ValueClass::Number)
            }
            ExprKind::String(s) => {
                self.emit_constant(Constant::String(s.clone()), expr.span)?;
                Ok(ValueClass::String)
            }
            ExprKind::Boolean(b) => {
                self.emit(if *b { Op::True } else { Op::False }, line);
                Ok(ValueClass::Boolean)
            }
            ExprKind::Nothing => {
                self.emit(Op::Nothing, line);
                Ok(ValueClass::Unknown)
            }
            ExprKind::Mysterious => {
                self.emit(Op::Mysterious, line);
                Ok(ValueClass::Unknown)
            }
            ExprKind::Variable(var) => {
                self.load_variable(var, expr.span)?;
                Ok(ValueClass::Unknown)
            }
            ExprKind::Unary {
                operator: UnaryOp::Not,
                operand,
            } => {
                self.compile_expr_in(operand, Context::Boolean)?;
                self.emit(Op::Not, line);
                Ok(ValueClass::Boolean)
            }
            ExprKind::Binary {
                left,
                operator,
                right,
                extra,
            } => self.compile_binary(left, *operator, right, extra, expr.span),
            ExprKind::Call { callee, arguments } => {
                self.compile_call(callee, arguments, expr.span)?;
                Ok(ValueClass::Unknown)
            }
            ExprKind::Index { array, index } => {
                self.compile_expr(array)?;
                self.compile_expr_in(index, Context::Scalar)?;
                self.emit(Op::GetIndex, line);
                Ok(ValueClass::Unknown)
            }
            ExprKind::Roll(source) => {
                self.load_variable(source, expr.span)?;
                self.emit(Op::PopFront, line);
                Ok(ValueClass::Unknown)
            }
        }
    }

    /// Compile an expression for a context, coercing only when the static
    /// class does not already fit.
    pub fn compile_expr_in(&mut self, expr: &Expr, context: Context) -> CompileResult<ValueClass> {
        let line = expr.span.line;
        if matches!(expr.kind, ExprKind::Nothing) {
            if let Some(class) = self.compile_nothing_in(context, expr.span)? {
                return Ok(class);
            }
        }

        let class = self.compile_expr(expr)?;
        if class.satisfies(context) {
            return Ok(class);
        }
        match context {
            Context::Boolean => {
                self.emit(Op::ToBoolean, line);
                Ok(ValueClass::Boolean)
            }
            _ => {
                self.emit(Op::Coerce(context), line);
                Ok(ValueClass::Unknown)
            }
        }
    }

    /// Nothing as a literal folds to `false` or `0` at compile time. Text
    /// and plain contexts fall through to the runtime coercion.
    fn compile_nothing_in(
        &mut self,
        context: Context,
        span: Span,
    ) -> CompileResult<Option<ValueClass>> {
        match context {
            Context::Boolean => {
                self.emit(Op::False, span.line);
                Ok(Some(ValueClass::Boolean))
            }
            Context::Scalar => {
                self.emit_constant(Constant::Number(0.0), span)?;
                Ok(Some(ValueClass::Number))
            }
            Context::Str | Context::Normal => Ok(None),
        }
    }

    fn compile_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        extra: &[Expr],
        span: Span,
    ) -> CompileResult<ValueClass> {
        if op.is_logical() {
            return self.compile_logical(left, op, right, span.line);
        }

        let mut class = self.compile_expr(left)?;
        for operand in std::iter::once(right).chain(extra) {
            let operand_class = self.compile_expr(operand)?;
            class = self.emit_binary(op, class, operand_class, operand.span)?;
        }
        Ok(class)
    }

    /// Emit one step of a (possibly folded) binary operation.
    fn emit_binary(
        &mut self,
        op: BinaryOp,
        left: ValueClass,
        right: ValueClass,
        span: Span,
    ) -> CompileResult<ValueClass> {
        let line = span.line;
        let numbers = left == ValueClass::Number && right == ValueClass::Number;
        let strings = left == ValueClass::String || right == ValueClass::String;

        if strings {
            if let Some(message) = string_operand_error(op) {
                return Err(CompileError::unsupported_operation(message, span));
            }
        }

        let (instruction, class) = match op {
            BinaryOp::Add if numbers => (Op::AddNumbers, ValueClass::Number),
            BinaryOp::Add if strings => (Op::Add, ValueClass::String),
            BinaryOp::Add => (Op::Add, ValueClass::Unknown),
            BinaryOp::Subtract => (Op::Subtract, arithmetic_class(numbers)),
            BinaryOp::Multiply => (Op::Multiply, arithmetic_class(numbers)),
            BinaryOp::Divide => (Op::Divide, arithmetic_class(numbers)),
            BinaryOp::Equal => (Op::Equal, ValueClass::Boolean),
            BinaryOp::NotEqual => (Op::NotEqual, ValueClass::Boolean),
            BinaryOp::Greater => (Op::Greater, ValueClass::Boolean),
            BinaryOp::Less => (Op::Less, ValueClass::Boolean),
            BinaryOp::GreaterEqual => (Op::GreaterEqual, ValueClass::Boolean),
            BinaryOp::LessEqual => (Op::LessEqual, ValueClass::Boolean),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Nor => {
                return Err(CompileError::unsupported_operation(
                    "Logical operators cannot take a list of operands",
                    span,
                ))
            }
        };
        self.emit(instruction, line);
        Ok(class)
    }

    /// `and`, `or` and `nor` evaluate the right side only when needed.
    fn compile_logical(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        line: usize,
    ) -> CompileResult<ValueClass> {
        self.compile_expr_in(left, Context::Boolean)?;
        let jump = match op {
            BinaryOp::And => self.emit_jump(Op::JumpIfFalseNoPop(0), line),
            _ => self.emit_jump(Op::JumpIfTrueNoPop(0), line),
        };
        self.emit(Op::Pop, line);
        self.compile_expr_in(right, Context::Boolean)?;
        self.patch_jump(jump)?;
        if op == BinaryOp::Nor {
            self.emit(Op::Not, line);
        }
        Ok(ValueClass::Boolean)
    }

    fn compile_call(&mut self, callee: &VarRef, arguments: &[Expr], span: Span) -> CompileResult<()> {
        self.load_variable(callee, span)?;
        for argument in arguments {
            self.compile_expr(argument)?;
        }
        let argc = u8::try_from(arguments.len()).map_err(|_| {
            CompileError::unsupported_operation("Too many arguments in one call", span)
        })?;
        self.emit(Op::Call(argc), span.line);
        Ok(())
    }
}

fn arithmetic_class(numbers: bool) -> ValueClass {
    if numbers {
        ValueClass::Number
    } else {
        ValueClass::Unknown
    }
}
