//! AST-to-bytecode compiler.
//!
//! Single-pass compilation: walks the AST once, emitting bytecode into a `Chunk`.
//! Variable resolution happens at compile time. Top-level variables become
//! global arena slots, function variables become frame-relative locals.

use std::rc::Rc;

use tracing::debug;

use crate::ast::{Program, Stmt, StmtKind, VarRef};
use crate::error::CompileError;
use crate::span::Span;
use crate::value::Context;

use super::chunk::{CompiledModule, Constant, FunctionProto};
use super::emitter::Emitter;
use super::opcode::Op;
use super::scope::{PronounTracker, ScopeResolver, Storage, MAIN_UNIT};

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// What the compiler knows statically about the value an expression leaves
/// on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Number,
    String,
    Boolean,
    Unknown,
}

impl ValueClass {
    /// Whether a value of this class needs no coercion for `context`.
    pub fn satisfies(self, context: Context) -> bool {
        match context {
            Context::Normal => true,
            Context::Boolean => self == ValueClass::Boolean,
            Context::Scalar => matches!(self, ValueClass::Number | ValueClass::Boolean),
            Context::Str => self != ValueClass::Unknown,
        }
    }
}

/// The compiler: transforms AST into bytecode.
pub struct Compiler {
    /// The function prototype being built.
    pub proto: FunctionProto,
    /// Every scope of the program, shared by all units.
    pub scopes: ScopeResolver,
    /// Last assigned variable, shared by all units.
    pub pronouns: PronounTracker,
    /// Enclosing compiler while a function body is compiled.
    pub enclosing: Option<Box<Compiler>>,
    /// Innermost loop, for break/continue.
    pub loop_context: Option<LoopContext>,
    /// Statement lists being compiled, innermost last.
    pub blocks: Vec<BlockContext>,
}

/// Bookkeeping for one statement list.
#[derive(Debug, Default)]
pub struct BlockContext {
    /// Breaks and continues outside any loop, patched to the end of the list.
    pub exits: Vec<usize>,
    /// Functions declared directly in the list. They are bound before its
    /// first statement runs, so calls may precede the declaration.
    pub functions: Vec<HoistedFunction>,
}

#[derive(Debug)]
pub struct HoistedFunction {
    pub name: String,
    pub proto: FunctionProto,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LoopContext {
    pub start: usize,
    pub break_patches: Vec<usize>,
    pub enclosing: Option<Box<LoopContext>>,
}

impl Compiler {
    pub fn new(name: String) -> Self {
        Self {
            proto: FunctionProto::new(name),
            scopes: ScopeResolver::new(),
            pronouns: PronounTracker::default(),
            enclosing: None,
            loop_context: None,
            blocks: Vec::new(),
        }
    }

    /// Compile a full program with a fresh resolver and pronoun tracker.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn compile(program: &Program) -> CompileResult<CompiledModule> {
        let mut compiler = Compiler::new(String::new());
        compiler.compile_statements(&program.statements)?;
        let line = program.statements.last().map_or(0, |s| s.span.line);
        compiler.emit(Op::Nothing, line);
        compiler.emit(Op::Return, line);

        let slot_count = compiler.scopes.slot_count(MAIN_UNIT);
        let slot_names = compiler.scopes.slot_names(MAIN_UNIT);
        let proto = compiler.proto;
        debug!(
            ops = proto.chunk.len(),
            constants = proto.chunk.constants.len(),
            slot_count,
            "compiled program"
        );
        Ok(CompiledModule {
            main: Rc::new(proto),
            slot_count,
            slot_names,
        })
    }

    /// Compile a statement list in its own block. Loose breaks inside it
    /// land right after the last statement.
    ///
    /// A list that declares functions is laid out as
    /// `JUMP bind; body...; JUMP end; bind: <store each function>; LOOP body; end:`
    /// so every function of the list is callable from its first statement.
    pub fn compile_statements(&mut self, statements: &[Stmt]) -> CompileResult<()> {
        let line = statements.first().map_or(0, |s| s.span.line);
        let mut hoists = false;
        for stmt in statements {
            if let StmtKind::Function(decl) = &stmt.kind {
                self.scopes.resolve_write(&decl.name, decl.span)?;
                hoists = true;
            }
        }
        let to_bindings = hoists.then(|| self.emit_jump(Op::Jump(0), line));
        let body_start = self.current_offset();

        self.blocks.push(BlockContext::default());
        for stmt in statements {
            self.compile_stmt(stmt)?;
        }
        let block = self.blocks.pop().unwrap_or_default();

        if let Some(to_bindings) = to_bindings {
            let end_line = statements.last().map_or(line, |s| s.span.line);
            let past_bindings = self.emit_jump(Op::Jump(0), end_line);
            self.patch_jump(to_bindings)?;
            for function in block.functions {
                self.emit_constant(Constant::Function(Rc::new(function.proto)), function.span)?;
                self.store_named(&function.name, function.span)?;
            }
            self.emit_loop(body_start, end_line)?;
            self.patch_jump(past_bindings)?;
        }
        for exit in block.exits {
            self.patch_jump(exit)?;
        }
        Ok(())
    }

    /// Compile the body of an `If`, `Else` or loop inside a child scope.
    pub fn compile_block(&mut self, statements: &[Stmt]) -> CompileResult<()> {
        self.scopes.enter_scope();
        let result = self.compile_statements(statements);
        self.scopes.exit_scope();
        result
    }

    // --- Chunk helpers ---

    pub fn emit(&mut self, op: Op, line: usize) -> usize {
        self.proto.chunk.emit(op, line)
    }

    pub fn emit_constant(&mut self, constant: Constant, span: Span) -> CompileResult<()> {
        let idx = self
            .proto
            .chunk
            .add_constant(constant)
            .ok_or(CompileError::TooManyConstants(span))?;
        self.emit(Op::Constant(idx), span.line);
        Ok(())
    }

    pub fn current_offset(&self) -> usize {
        self.proto.chunk.len()
    }

    pub fn emit_jump(&mut self, op: Op, line: usize) -> usize {
        self.emit(op, line)
    }

    pub fn patch_jump(&mut self, offset: usize) -> CompileResult<()> {
        match self.proto.chunk.patch_jump(offset) {
            Some(_) => Ok(()),
            None => Err(CompileError::JumpTooFar {
                line: self.proto.chunk.lines[offset],
            }),
        }
    }

    pub fn emit_loop(&mut self, loop_start: usize, line: usize) -> CompileResult<()> {
        let offset = u16::try_from(self.proto.chunk.len() - loop_start + 1)
            .map_err(|_| CompileError::JumpTooFar { line })?;
        self.emit(Op::Loop(offset), line);
        Ok(())
    }

    /// Queue a compiled function for binding at the top of the current list.
    pub fn hoist_function(
        &mut self,
        name: &str,
        proto: FunctionProto,
        span: Span,
    ) -> CompileResult<()> {
        let function = HoistedFunction {
            name: name.to_string(),
            proto,
            span,
        };
        match self.blocks.last_mut() {
            Some(block) => block.functions.push(function),
            None => {
                self.emit_constant(Constant::Function(Rc::new(function.proto)), span)?;
                self.store_named(name, span)?;
            }
        }
        Ok(())
    }

    // --- Variables ---

    /// The normalised name a reference stands for. Pronouns resolve to the
    /// last assigned variable.
    pub fn variable_name(&self, var: &VarRef, span: Span) -> CompileResult<String> {
        match var {
            VarRef::Named(name) => Ok(name.clone()),
            VarRef::Pronoun(pronoun) => self.pronouns.resolve(pronoun, span),
        }
    }

    /// Push the value of a variable.
    pub fn load_variable(&mut self, var: &VarRef, span: Span) -> CompileResult<()> {
        let name = self.variable_name(var, span)?;
        let slot = self.scopes.resolve_read(&name, span)?;
        let op = match self.scopes.storage(&name, slot, span)? {
            Storage::Global(index) => Op::GetSlot(index),
            Storage::Local(index) => Op::GetLocal(index),
        };
        self.emit(op, span.line);
        Ok(())
    }

    /// Push the value of a variable that is about to be restructured,
    /// binding it first if this is its first use.
    pub fn load_for_update(&mut self, var: &VarRef, span: Span) -> CompileResult<String> {
        let name = self.variable_name(var, span)?;
        let slot = self.scopes.resolve_write(&name, span)?;
        let op = match self.scopes.storage(&name, slot, span)? {
            Storage::Global(index) => Op::GetSlot(index),
            Storage::Local(index) => Op::GetLocal(index),
        };
        self.emit(op, span.line);
        Ok(name)
    }

    /// Store the top of the stack into a variable and pop it. Returns the
    /// resolved name so callers can track it as the pronoun antecedent.
    pub fn store_variable(&mut self, var: &VarRef, span: Span) -> CompileResult<String> {
        let name = self.variable_name(var, span)?;
        self.store_named(&name, span)?;
        Ok(name)
    }

    pub fn store_named(&mut self, name: &str, span: Span) -> CompileResult<()> {
        let slot = self.scopes.resolve_write(name, span)?;
        let op = match self.scopes.storage(name, slot, span)? {
            Storage::Global(index) => Op::SetSlot(index),
            Storage::Local(index) => Op::SetLocal(index),
        };
        self.emit(op, span.line);
        self.emit(Op::Pop, span.line);
        Ok(())
    }

    // --- Function compilation ---

    /// Start compiling a new function: `self` becomes a fresh compiler for
    /// the body and the current one is kept as its enclosing compiler.
    pub fn start_function(&mut self, name: &str, params: &[String], span: Span) -> CompileResult<()> {
        let scopes = std::mem::take(&mut self.scopes);
        let pronouns = std::mem::take(&mut self.pronouns);

        let mut new_compiler = Compiler::new(name.to_string());
        new_compiler.scopes = scopes;
        new_compiler.pronouns = pronouns;
        new_compiler.scopes.enter_function(name);

        let old = std::mem::replace(self, new_compiler);
        self.enclosing = Some(Box::new(old));

        for param in params {
            self.scopes.declare_param(param, span)?;
        }
        self.proto.arity = u8::try_from(params.len()).map_err(|_| {
            CompileError::unsupported_operation(
                format!("Function '{}' takes more than 255 parameters", name),
                span,
            )
        })?;
        Ok(())
    }

    /// Finish compiling the current function, returning the proto and
    /// restoring the enclosing compiler.
    pub fn finish_function(&mut self, line: usize) -> FunctionProto {
        // A function without a return gives back Mysterious
        self.emit(Op::Mysterious, line);
        self.emit(Op::Return, line);

        let unit = self.scopes.current_unit();
        let mut proto = std::mem::replace(&mut self.proto, FunctionProto::new(String::new()));
        proto.local_count = self.scopes.slot_count(unit);
        proto.local_names = self.scopes.slot_names(unit);
        self.scopes.exit_scope();

        let scopes = std::mem::take(&mut self.scopes);
        let pronouns = std::mem::take(&mut self.pronouns);
        if let Some(enclosing) = self.enclosing.take() {
            *self = *enclosing;
        }
        self.scopes = scopes;
        self.pronouns = pronouns;

        debug!(
            name = %proto.name,
            arity = proto.arity,
            locals = proto.local_count,
            ops = proto.chunk.len(),
            "compiled function"
        );
        proto
    }

    // --- Loop context ---

    pub fn begin_loop(&mut self, start: usize) {
        let enclosing = self.loop_context.take().map(Box::new);
        self.loop_context = Some(LoopContext {
            start,
            break_patches: Vec::new(),
            enclosing,
        });
    }

    pub fn end_loop(&mut self) -> CompileResult<()> {
        if let Some(ctx) = self.loop_context.take() {
            for patch in &ctx.break_patches {
                self.patch_jump(*patch)?;
            }
            self.loop_context = ctx.enclosing.map(|b| *b);
        }
        Ok(())
    }

    /// Leave the innermost loop, or the innermost block when there is none.
    pub fn emit_break(&mut self, line: usize) {
        let jump = self.emit_jump(Op::Jump(0), line);
        match self.loop_context.as_mut() {
            Some(ctx) => ctx.break_patches.push(jump),
            None => self.add_block_exit(jump),
        }
    }

    /// Re-test the innermost loop's condition. Outside a loop this leaves
    /// the block, same as a break.
    pub fn emit_continue(&mut self, line: usize) -> CompileResult<()> {
        match self.loop_context.as_ref().map(|ctx| ctx.start) {
            Some(start) => self.emit_loop(start, line)?,
            None => {
                let jump = self.emit_jump(Op::Jump(0), line);
                self.add_block_exit(jump);
            }
        }
        Ok(())
    }

    fn add_block_exit(&mut self, jump: usize) {
        if let Some(block) = self.blocks.last_mut() {
            block.exits.push(jump);
        }
    }
}
