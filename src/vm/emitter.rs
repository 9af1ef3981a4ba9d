//! The narrow interface the compiler writes code through.
//!
//! [`Chunk`] is the only backend today. Anything that can record
//! instructions, hold constants and patch forward jumps can stand in for it.

use super::chunk::{Chunk, Constant};
use super::opcode::Op;

pub trait Emitter {
    /// Append an instruction, returning its offset.
    fn emit(&mut self, op: Op, line: usize) -> usize;

    /// Intern a constant. `None` when the pool is full.
    fn add_constant(&mut self, constant: Constant) -> Option<u16>;

    /// Point the forward jump at `offset` to the next instruction,
    /// returning the encoded distance. `None` when it does not fit an operand.
    fn patch_jump(&mut self, offset: usize) -> Option<u16>;

    /// Offset of the next instruction.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emitter for Chunk {
    fn emit(&mut self, op: Op, line: usize) -> usize {
        let offset = self.code.len();
        self.code.push(op);
        self.lines.push(line);
        offset
    }

    /// Number and string literals are shared.
    fn add_constant(&mut self, constant: Constant) -> Option<u16> {
        if let Some(existing) = self.constants.iter().position(|c| c.same_literal(&constant)) {
            return u16::try_from(existing).ok();
        }
        let idx = u16::try_from(self.constants.len()).ok()?;
        self.constants.push(constant);
        Some(idx)
    }

    fn patch_jump(&mut self, offset: usize) -> Option<u16> {
        let jump = u16::try_from(self.code.len() - offset - 1).ok()?;
        match &mut self.code[offset] {
            Op::Jump(target)
            | Op::JumpIfFalse(target)
            | Op::JumpIfFalseNoPop(target)
            | Op::JumpIfTrueNoPop(target) => *target = jump,
            other => debug_assert!(false, "patched non-jump {:?} at {}", other, offset),
        }
        Some(jump)
    }

    fn len(&self) -> usize {
        self.code.len()
    }
}
