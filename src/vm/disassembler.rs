//! Bytecode disassembler for debug output.

use super::chunk::{Chunk, CompiledModule, Constant, FunctionProto};
use super::opcode::Op;

/// Disassemble a compiled program and every function it declares.
pub fn disassemble(module: &CompiledModule) -> String {
    let mut out = String::new();
    disassemble_function(&module.main, &module.slot_names, &mut out);
    out
}

fn disassemble_function(proto: &FunctionProto, slot_names: &[String], out: &mut String) {
    let name = if proto.name.is_empty() {
        "<main>"
    } else {
        &proto.name
    };
    out.push_str(&format!(
        "== {} (arity={}, locals={}) ==\n",
        name, proto.arity, proto.local_count
    ));
    let names = Names {
        slots: slot_names,
        locals: &proto.local_names,
    };
    disassemble_chunk(&proto.chunk, &names, out);

    // Recursively disassemble nested functions
    for constant in &proto.chunk.constants {
        if let Constant::Function(nested) = constant {
            out.push('\n');
            disassemble_function(nested, slot_names, out);
        }
    }
}

struct Names<'a> {
    slots: &'a [String],
    locals: &'a [String],
}

fn disassemble_chunk(chunk: &Chunk, names: &Names, out: &mut String) {
    for (offset, op) in chunk.code.iter().enumerate() {
        let line = chunk.lines.get(offset).copied().unwrap_or(0);
        let line_str = if offset > 0 && chunk.lines.get(offset - 1).copied() == Some(line) {
            "   |".to_string()
        } else {
            format!("{:4}", line)
        };
        out.push_str(&format!("{:04} {} ", offset, line_str));
        disassemble_op(op, offset, chunk, names, out);
        out.push('\n');
    }
}

fn disassemble_op(op: &Op, offset: usize, chunk: &Chunk, names: &Names, out: &mut String) {
    let text = match op {
        Op::Constant(idx) => format!(
            "CONSTANT     {:>5} ({})",
            idx,
            format_constant(chunk.constants.get(*idx as usize))
        ),
        Op::Nothing => "NOTHING".to_string(),
        Op::Mysterious => "MYSTERIOUS".to_string(),
        Op::True => "TRUE".to_string(),
        Op::False => "FALSE".to_string(),
        Op::Pop => "POP".to_string(),
        Op::GetSlot(idx) => named("GET_SLOT", *idx, names.slots),
        Op::SetSlot(idx) => named("SET_SLOT", *idx, names.slots),
        Op::GetLocal(idx) => named("GET_LOCAL", *idx, names.locals),
        Op::SetLocal(idx) => named("SET_LOCAL", *idx, names.locals),
        Op::Coerce(context) => format!("COERCE       {:?}", context),
        Op::ToBoolean => "TO_BOOLEAN".to_string(),
        Op::Add => "ADD".to_string(),
        Op::AddNumbers => "ADD_NUMBERS".to_string(),
        Op::Subtract => "SUBTRACT".to_string(),
        Op::Multiply => "MULTIPLY".to_string(),
        Op::Divide => "DIVIDE".to_string(),
        Op::Equal => "EQUAL".to_string(),
        Op::NotEqual => "NOT_EQUAL".to_string(),
        Op::Less => "LESS".to_string(),
        Op::LessEqual => "LESS_EQUAL".to_string(),
        Op::Greater => "GREATER".to_string(),
        Op::GreaterEqual => "GREATER_EQUAL".to_string(),
        Op::Not => "NOT".to_string(),
        Op::Jump(o) => jump("JUMP", offset, *o as isize),
        Op::JumpIfFalse(o) => jump("JUMP_IF_FALSE", offset, *o as isize),
        Op::JumpIfFalseNoPop(o) => jump("JUMP_IF_F_NP", offset, *o as isize),
        Op::JumpIfTrueNoPop(o) => jump("JUMP_IF_T_NP", offset, *o as isize),
        Op::Loop(o) => jump("LOOP", offset, -(*o as isize)),
        Op::Call(argc) => format!("CALL         {:>5}", argc),
        Op::Return => "RETURN".to_string(),
        Op::ArrayPush(count) => format!("ARRAY_PUSH   {:>5}", count),
        Op::SetIndex => "SET_INDEX".to_string(),
        Op::GetIndex => "GET_INDEX".to_string(),
        Op::PopFront => "POP_FRONT".to_string(),
        Op::Join(with) => format!("JOIN         {}", with),
        Op::Split(with) => format!("SPLIT        {}", with),
        Op::Cast(with) => format!("CAST         {}", with),
        Op::Increment(count) => format!("INCREMENT    {:>5}", count),
        Op::Decrement(count) => format!("DECREMENT    {:>5}", count),
        Op::Round(mode) => format!("ROUND        {:?}", mode),
        Op::Print => "PRINT".to_string(),
        Op::Input => "INPUT".to_string(),
    };
    out.push_str(&text);
}

fn named(op: &str, idx: u16, names: &[String]) -> String {
    let name = names.get(idx as usize).map(String::as_str).unwrap_or("?");
    format!("{:<12} {:>5} ({})", op, idx, name)
}

/// Jumps show their absolute target.
fn jump(op: &str, offset: usize, distance: isize) -> String {
    let target = offset as isize + 1 + distance;
    format!("{:<12} {:>5} -> {:04}", op, distance, target)
}

fn format_constant(constant: Option<&Constant>) -> String {
    match constant {
        Some(Constant::Number(n)) => crate::value::format_number(*n),
        Some(Constant::String(s)) => format!("\"{}\"", s),
        Some(Constant::Function(proto)) => format!("<function {}>", proto.name),
        None => "???".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::vm::compiler::Compiler;

    fn disassemble_source(source: &str) -> String {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        disassemble(&Compiler::compile(&program).unwrap())
    }

    #[test]
    fn test_header_and_slot_names() {
        let text = disassemble_source("My heart is 5\nSay my heart");
        assert!(text.starts_with("== <main> (arity=0, locals=1) ==\n"));
        assert!(text.contains("SET_SLOT         0 (my heart)"));
        assert!(text.contains("PRINT"));
    }

    #[test]
    fn test_functions_are_listed_after_main() {
        let text = disassemble_source("Midnight takes your heart\nGive back your heart\n\nSay Midnight taking 1");
        assert!(text.contains("== midnight (arity=1, locals=2) =="));
        assert!(text.contains("GET_LOCAL        1 (your heart)"));
    }

    #[test]
    fn test_function_bindings_run_before_the_body() {
        let text = disassemble_source("Say Echo taking 1\n\nEcho takes x\nGive back x\n");
        let main = text.split("\n\n").next().unwrap_or_default();
        assert!(main.lines().nth(1).is_some_and(|line| line.contains("JUMP")));
        assert!(main.contains("LOOP"));
        assert!(main.contains("SET_SLOT         0 (echo)"));
    }

    #[test]
    fn test_number_literals_skip_coercion() {
        let text = disassemble_source("Let X be 1 with 2, 3");
        assert!(text.contains("ADD_NUMBERS"));
        assert!(!text.contains("COERCE"));
    }

    #[test]
    fn test_nothing_condition_folds_to_false() {
        let text = disassemble_source("If nothing\nSay 1");
        assert!(text.lines().any(|line| line.ends_with(" FALSE")));
        assert!(!text.contains("COERCE"));
        assert!(!text.contains("TO_BOOLEAN"));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let source = "X is 0\nWhile X is lower than 3\nBuild X up\nSay X";
        assert_eq!(disassemble_source(source), disassemble_source(source));
    }
}
