//! Bytecode backend: compiles the AST to bytecode and executes it on a
//! stack-based VM.

pub mod chunk;
pub mod compiler;
pub mod compiler_exprs;
pub mod compiler_stmts;
pub mod disassembler;
pub mod emitter;
pub mod opcode;
pub mod scope;
#[allow(clippy::module_inception)]
pub mod vm;
pub mod vm_calls;

pub use chunk::{CompiledModule, FunctionProto};
pub use compiler::{Compiler, ValueClass};
pub use disassembler::disassemble;
pub use emitter::Emitter;
pub use opcode::Op;
pub use vm::Vm;
