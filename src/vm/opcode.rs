//! Bytecode opcodes for the Rockstar VM.

use crate::ast::RoundMode;
use crate::value::Context;

/// A single bytecode instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    // --- Constants & Literals ---
    /// Push a constant from the constant pool onto the stack.
    Constant(u16),
    /// Push Nothing.
    Nothing,
    /// Push Mysterious.
    Mysterious,
    True,
    False,

    // --- Stack manipulation ---
    Pop,

    // --- Variables ---
    /// Read a slot of the program's global arena.
    GetSlot(u16),
    /// Write the top of the stack into a global slot, leaving it on the stack.
    SetSlot(u16),
    /// Read a frame-relative local.
    GetLocal(u16),
    /// Write the top of the stack into a local, leaving it on the stack.
    SetLocal(u16),

    // --- Coercion ---
    /// Coerce the top of the stack for a context.
    Coerce(Context),
    /// Replace the top of the stack with its truth value.
    ToBoolean,

    // --- Arithmetic ---
    Add,
    /// Addition of two values already known to be numbers.
    AddNumbers,
    Subtract,
    Multiply,
    Divide,

    // --- Comparison ---
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // --- Logical ---
    Not,

    // --- Control flow ---
    /// Unconditional forward jump.
    Jump(u16),
    /// Pop the condition and jump forward if it is falsy.
    JumpIfFalse(u16),
    /// Jump forward if the top is falsy, leaving it on the stack.
    JumpIfFalseNoPop(u16),
    /// Jump forward if the top is truthy, leaving it on the stack.
    JumpIfTrueNoPop(u16),
    /// Jump backward.
    Loop(u16),

    // --- Functions ---
    /// Call the value below `n` arguments.
    Call(u8),
    Return,

    // --- Arrays and strings ---
    /// `[target, item1..itemN]` -> the target as an array with the items
    /// appended. A target that is not already an array is replaced by a
    /// fresh one.
    ArrayPush(u8),
    /// `[target, index, value]` -> the target as an array with the element set.
    SetIndex,
    /// `[array, index]` -> element.
    GetIndex,
    /// `[array]` -> its first element, removed.
    PopFront,
    /// `[source, delimiter?]` -> string.
    Join(bool),
    /// `[source, delimiter?]` -> array of strings.
    Split(bool),
    /// `[source, radix?]` -> number or one-character string.
    Cast(bool),

    // --- Statements ---
    Increment(u16),
    Decrement(u16),
    Round(RoundMode),
    /// Pop and print.
    Print,
    /// Push the next input line, or Mysterious when none is left.
    Input,
}
