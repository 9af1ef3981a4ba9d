//! Bytecode chunk and function prototype types.

use std::rc::Rc;

use super::opcode::Op;

/// A constant value stored in a chunk's constant pool.
#[derive(Debug, Clone)]
pub enum Constant {
    Number(f64),
    String(String),
    /// A compiled function prototype.
    Function(Rc<FunctionProto>),
}

impl Constant {
    pub(crate) fn same_literal(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Number(a), Constant::Number(b)) => a.to_bits() == b.to_bits(),
            (Constant::String(a), Constant::String(b)) => a == b,
            _ => false,
        }
    }
}

/// A compiled function (or the top-level program).
#[derive(Debug, Clone)]
pub struct FunctionProto {
    /// Function name (empty for the top-level program).
    pub name: String,
    /// Number of parameters.
    pub arity: u8,
    /// Frame slots reserved on call: the callee, the parameters and every
    /// variable first assigned in the body.
    pub local_count: u16,
    /// Names of the locals by slot, for the disassembler.
    pub local_names: Vec<String>,
    /// The bytecode instructions.
    pub chunk: Chunk,
}

impl FunctionProto {
    pub fn new(name: String) -> Self {
        Self {
            name,
            arity: 0,
            local_count: 1,
            local_names: vec![String::new()],
            chunk: Chunk::new(),
        }
    }
}

/// A chunk of bytecode: instructions + constant pool + line info.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The bytecode instructions.
    pub code: Vec<Op>,
    /// Source line numbers, parallel to `code`.
    pub lines: Vec<usize>,
    /// Constant pool.
    pub constants: Vec<Constant>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A compiled program: the top-level unit and the size of its slot arena.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub main: Rc<FunctionProto>,
    /// Number of global slots the VM must allocate.
    pub slot_count: u16,
    /// Names of the global slots by index, for the disassembler.
    pub slot_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::emitter::Emitter;

    #[test]
    fn test_literal_constants_are_shared() {
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Constant::String("hello".into()));
        let b = chunk.add_constant(Constant::Number(5.0));
        let c = chunk.add_constant(Constant::String("hello".into()));
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn test_patch_jump_lands_after_the_body() {
        let mut chunk = Chunk::new();
        let jump = chunk.emit(Op::JumpIfFalse(0), 1);
        chunk.emit(Op::True, 1);
        chunk.emit(Op::Print, 1);
        assert_eq!(chunk.patch_jump(jump), Some(2));
        assert_eq!(chunk.code[jump], Op::JumpIfFalse(2));
    }

    #[test]
    fn test_patch_jump_refuses_distances_past_the_operand() {
        let mut chunk = Chunk::new();
        let jump = chunk.emit(Op::Jump(0), 1);
        for _ in 0..=u16::MAX as usize {
            chunk.emit(Op::Nothing, 1);
        }
        assert_eq!(chunk.patch_jump(jump), None);
        assert_eq!(chunk.code[jump], Op::Jump(0));
    }
}
