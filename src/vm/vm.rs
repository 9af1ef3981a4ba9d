//! The bytecode virtual machine: stack-based execution engine.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use crate::error::RuntimeError;
use crate::span::Span;
use crate::value::{coerce, ops, RockstarArray, Value};

use super::chunk::{CompiledModule, Constant, FunctionProto};
use super::opcode::Op;

/// A call frame on the VM call stack.
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// The function being executed.
    pub function: Rc<FunctionProto>,
    /// Instruction pointer (index into chunk.code).
    pub ip: usize,
    /// Base index into the value stack for this frame's locals.
    pub stack_base: usize,
}

/// The bytecode VM.
#[derive(Debug, Default)]
pub struct Vm {
    /// Value stack.
    pub stack: Vec<Value>,
    /// Call frame stack.
    pub frames: Vec<CallFrame>,
    /// The global slot arena of the top-level program.
    pub slots: Vec<Value>,
    /// Every line printed, in order.
    pub output: Vec<String>,
    /// Also write printed lines to stdout.
    pub echo: bool,
    /// Lines still to be consumed by `Listen`.
    pub input: VecDeque<String>,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(256),
            frames: Vec::with_capacity(64),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, input: impl IntoIterator<Item = String>) -> Self {
        self.input = input.into_iter().collect();
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Execute a compiled program. Every global slot starts out Mysterious.
    pub fn execute(&mut self, module: &CompiledModule) -> Result<Value, RuntimeError> {
        self.slots = vec![Value::Mysterious; module.slot_count as usize];
        self.stack.clear();
        self.frames.clear();

        let main = module.main.clone();
        self.push(Value::Function(main.clone()));
        self.frames.push(CallFrame {
            function: main,
            ip: 0,
            stack_base: 0,
        });

        let result = self.run();
        debug!(
            lines = self.output.len(),
            ok = result.is_ok(),
            "program finished"
        );
        result
    }

    /// Run the dispatch loop.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        loop {
            let frame_idx = self.frames.len() - 1;
            let frame = &self.frames[frame_idx];
            let ip = frame.ip;
            let chunk = &frame.function.chunk;

            if ip >= chunk.code.len() {
                return Ok(Value::Nothing);
            }

            let op = chunk.code[ip];
            let line = chunk.lines.get(ip).copied().unwrap_or(0);
            let span = Span::new(0, 0, line, 0);

            // Advance IP
            self.frames[frame_idx].ip += 1;

            match op {
                Op::Constant(idx) => {
                    let value = match &self.frames[frame_idx].function.chunk.constants[idx as usize] {
                        Constant::Number(n) => Value::Number(*n),
                        Constant::String(s) => Value::String(s.clone()),
                        Constant::Function(proto) => Value::Function(proto.clone()),
                    };
                    self.push(value);
                }
                Op::Nothing => self.push(Value::Nothing),
                Op::Mysterious => self.push(Value::Mysterious),
                Op::True => self.push(Value::Boolean(true)),
                Op::False => self.push(Value::Boolean(false)),

                Op::Pop => {
                    self.pop();
                }

                // --- Variables ---
                Op::GetSlot(slot) => {
                    let val = self
                        .slots
                        .get(slot as usize)
                        .cloned()
                        .unwrap_or(Value::Mysterious);
                    self.push(val);
                }
                Op::SetSlot(slot) => {
                    let val = self.peek(0).clone();
                    let slot = slot as usize;
                    if slot >= self.slots.len() {
                        self.slots.resize(slot + 1, Value::Mysterious);
                    }
                    self.slots[slot] = val;
                }
                Op::GetLocal(slot) => {
                    let base = self.frames[frame_idx].stack_base;
                    let val = self.stack[base + slot as usize].clone();
                    self.push(val);
                }
                Op::SetLocal(slot) => {
                    let val = self.peek(0).clone();
                    let base = self.frames[frame_idx].stack_base;
                    self.stack[base + slot as usize] = val;
                }

                // --- Coercion ---
                Op::Coerce(context) => {
                    let val = self.pop();
                    self.push(coerce(&val, context));
                }
                Op::ToBoolean => {
                    let val = self.pop();
                    self.push(Value::Boolean(val.is_truthy()));
                }

                // --- Arithmetic ---
                Op::Add => self.binary(span, ops::add)?,
                Op::AddNumbers => {
                    let b = self.pop();
                    let a = self.pop();
                    let result = match (&a, &b) {
                        (Value::Number(x), Value::Number(y)) => Value::Number(x + y),
                        _ => ops::add(&a, &b, span)?,
                    };
                    self.push(result);
                }
                Op::Subtract => self.binary(span, ops::subtract)?,
                Op::Multiply => self.binary(span, ops::multiply)?,
                Op::Divide => self.binary(span, ops::divide)?,

                // --- Comparison ---
                Op::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Boolean(ops::equals(&a, &b)));
                }
                Op::NotEqual => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Boolean(!ops::equals(&a, &b)));
                }
                Op::Less => self.comparison(crate::ast::BinaryOp::Less, span)?,
                Op::LessEqual => self.comparison(crate::ast::BinaryOp::LessEqual, span)?,
                Op::Greater => self.comparison(crate::ast::BinaryOp::Greater, span)?,
                Op::GreaterEqual => self.comparison(crate::ast::BinaryOp::GreaterEqual, span)?,

                Op::Not => {
                    let val = self.pop();
                    self.push(Value::Boolean(!val.is_truthy()));
                }

                // --- Control flow ---
                Op::Jump(offset) => {
                    self.frames[frame_idx].ip += offset as usize;
                }
                Op::JumpIfFalse(offset) => {
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.frames[frame_idx].ip += offset as usize;
                    }
                }
                Op::JumpIfFalseNoPop(offset) => {
                    if !self.peek(0).is_truthy() {
                        self.frames[frame_idx].ip += offset as usize;
                    }
                }
                Op::JumpIfTrueNoPop(offset) => {
                    if self.peek(0).is_truthy() {
                        self.frames[frame_idx].ip += offset as usize;
                    }
                }
                Op::Loop(offset) => {
                    self.frames[frame_idx].ip -= offset as usize;
                }

                // --- Functions ---
                Op::Call(argc) => {
                    self.call_value(argc as usize, span)?;
                }
                Op::Return => {
                    let result = self.pop();
                    let Some(frame) = self.frames.pop() else {
                        return Ok(result);
                    };
                    self.stack.truncate(frame.stack_base);

                    if self.frames.is_empty() {
                        return Ok(result);
                    }
                    self.push(result);
                }

                // --- Arrays and strings ---
                Op::ArrayPush(count) => {
                    let items = self.pop_n(count as usize);
                    let target = self.pop();
                    let array = into_array(target);
                    if let Value::Array(arr) = &array {
                        arr.borrow_mut().add_all(items);
                    }
                    self.push(array);
                }
                Op::SetIndex => {
                    let value = self.pop();
                    let index = self.pop();
                    let target = self.pop();
                    let array = into_array(target);
                    if let Value::Array(arr) = &array {
                        if !arr.borrow_mut().set(&index, value) {
                            return Err(RuntimeError::IndexTooLarge {
                                index: index.to_string(),
                                span,
                            });
                        }
                    }
                    self.push(array);
                }
                Op::GetIndex => {
                    let index = self.pop();
                    let target = self.pop();
                    let element = index_value(&target, &index, span)?;
                    self.push(element);
                }
                Op::PopFront => {
                    let target = self.pop();
                    let element = match &target {
                        Value::Array(arr) => arr.borrow_mut().pop_front(),
                        _ => Value::Mysterious,
                    };
                    self.push(element);
                }
                Op::Join(has_delimiter) => {
                    let delimiter = self.pop_optional(has_delimiter);
                    let source = self.pop();
                    let joined = ops::join(&source, delimiter.as_ref(), span)?;
                    self.push(joined);
                }
                Op::Split(has_delimiter) => {
                    let delimiter = self.pop_optional(has_delimiter);
                    let source = self.pop();
                    self.push(ops::split(&source, delimiter.as_ref()));
                }
                Op::Cast(has_radix) => {
                    let radix = self.pop_optional(has_radix);
                    let source = self.pop();
                    let cast = ops::cast(&source, radix.as_ref(), span)?;
                    self.push(cast);
                }

                // --- Statements ---
                Op::Increment(count) => {
                    let val = self.pop();
                    let counted = ops::increment(&val, count, span)?;
                    self.push(counted);
                }
                Op::Decrement(count) => {
                    let val = self.pop();
                    let counted = ops::decrement(&val, count, span)?;
                    self.push(counted);
                }
                Op::Round(mode) => {
                    let val = self.pop();
                    let rounded = ops::round(&val, mode, span)?;
                    self.push(rounded);
                }
                Op::Print => {
                    let val = self.pop();
                    let text = val.to_string();
                    if self.echo {
                        println!("{}", text);
                    }
                    self.output.push(text);
                }
                Op::Input => {
                    let val = match self.input.pop_front() {
                        Some(line) => Value::String(line),
                        None => Value::Mysterious,
                    };
                    self.push(val);
                }
            }
        }
    }

    // --- Stack operations ---

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or(Value::Mysterious)
    }

    #[inline]
    pub fn peek(&self, distance: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - distance]
    }

    /// Pop `n` values, returned in the order they were pushed.
    fn pop_n(&mut self, n: usize) -> Vec<Value> {
        let start = self.stack.len().saturating_sub(n);
        self.stack.split_off(start)
    }

    fn pop_optional(&mut self, present: bool) -> Option<Value> {
        present.then(|| self.pop())
    }

    // --- Helpers ---

    fn binary(
        &mut self,
        span: Span,
        op: fn(&Value, &Value, Span) -> Result<Value, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let result = op(&a, &b, span)?;
        self.push(result);
        Ok(())
    }

    fn comparison(&mut self, op: crate::ast::BinaryOp, span: Span) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let result = ops::compare(op, &a, &b, span)?;
        self.push(Value::Boolean(result));
        Ok(())
    }
}

/// Reuse an array, or start a fresh one in place of any other value.
fn into_array(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        _ => Value::new_array(RockstarArray::new()),
    }
}

/// `X at i`: array elements by index or key, string characters by position.
fn index_value(target: &Value, index: &Value, span: Span) -> Result<Value, RuntimeError> {
    match target {
        Value::Array(arr) => Ok(arr.borrow().get(index)),
        Value::String(s) => {
            let position = match index {
                Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
                _ => None,
            };
            Ok(position
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Mysterious))
        }
        other => Err(RuntimeError::cannot_index(other.type_name(), span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BonjovaError, CompileError};
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::vm::compiler::Compiler;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> Result<CompiledModule, CompileError> {
        let tokens = Scanner::new(source).scan_tokens().expect("lexer error");
        let program = Parser::new(tokens).parse().expect("parser error");
        Compiler::compile(&program)
    }

    fn run_with_input(source: &str, input: &[&str]) -> Result<Vec<String>, BonjovaError> {
        let module = compile(source)?;
        let mut vm = Vm::new().with_input(input.iter().map(|s| s.to_string()));
        vm.execute(&module)?;
        Ok(vm.output)
    }

    fn run(source: &str) -> Vec<String> {
        run_with_input(source, &[]).expect("program failed")
    }

    #[test]
    fn test_shout_a_string() {
        assert_eq!(run("Shout \"Hello\""), vec!["Hello"]);
    }

    #[test]
    fn test_whole_numbers_print_without_fraction() {
        assert_eq!(run("My thing is 5\nShout my thing"), vec!["5"]);
    }

    #[test]
    fn test_poetic_number_literal() {
        assert_eq!(run("Rockstar is a big bad monster\nShout Rockstar"), vec!["1337"]);
    }

    #[test]
    fn test_countdown_loop() {
        let source = "Tommy was shy\nWhile Tommy ain't 0,\nKnock Tommy down\nSay Tommy";
        assert_eq!(run(source), vec!["2", "1", "0"]);
    }

    #[test]
    fn test_function_call() {
        let source = "Midnight takes your heart\nGive back your heart\n\nIce is \"nice\"\nSay Midnight taking ice";
        assert_eq!(run(source), vec!["nice"]);
    }

    #[test]
    fn test_whitespace_line_closes_function() {
        let source = "Midnight takes your heart\nReturn your heart\n   \t\nIce is \"nice\"\nSay Midnight taking ice";
        assert_eq!(run(source), vec!["nice"]);
    }

    #[test]
    fn test_function_called_before_its_declaration() {
        let source = "Jane is 0\nCarol is \"nice\"\nBob is \"less nice\"\nSay Jane\nSay Midnight taking Carol, Bob\nSay Jane\n\nMidnight takes your heart and your soul\nBuild Jane up\nGive back your heart plus your soul\n";
        assert_eq!(run(source), vec!["0", "niceless nice", "1"]);
    }

    #[test]
    fn test_return_closes_an_open_conditional() {
        let source = "Eddy wants your dedication\nLet the expectations be 6\nLet the goal be 20\nLet the answer be nothing\nIf the expectations are weaker than the goal\nLet the answer be \"hello\",\nElse let the answer be \"!\"\nGive the answer\n\nLet peace be Eddy taking nothing\nShout peace";
        assert_eq!(run(source), vec!["hello"]);
    }

    #[test]
    fn test_return_closes_an_open_loop() {
        let source = "Eddy wants your dedication\nLet the expectations be 6\nLet the goal be 9\nWhile the expectations are weaker than the goal\nBuild the expectations up\nShout the expectations\nGive the expectations\n\nLet peace be Eddy taking nothing\nShout peace";
        assert_eq!(run(source), vec!["7", "8", "9", "9"]);
    }

    #[test]
    fn test_list_fold() {
        assert_eq!(run("Let X be 1 with 2, 3, 4\nSay X"), vec!["10"]);
    }

    #[test]
    fn test_array_length_and_padding() {
        let source = "Rock 1, 2, 3 into arr\nSay arr\nLet arr at 8 be 7\nSay arr\nSay arr at 5\nSay arr at 8";
        assert_eq!(run(source), vec!["3", "9", "", "7"]);
    }

    #[test]
    fn test_huge_array_index_is_refused() {
        let err = run_with_input("Let arr at 4000000000 be 1\nSay arr", &[]).unwrap_err();
        assert!(matches!(
            err,
            BonjovaError::Runtime(RuntimeError::IndexTooLarge { .. })
        ));
    }

    #[test]
    fn test_array_keys_do_not_count_towards_length() {
        let source = "Let the map at \"key\" be 5\nSay the map at \"key\"\nSay the map";
        assert_eq!(run(source), vec!["5", "0"]);
    }

    #[test]
    fn test_roll_takes_the_first_element() {
        let source = "Rock 1, 2 into arr\nRoll arr into first\nSay first\nSay arr\nSay roll arr\nSay roll arr";
        assert_eq!(run(source), vec!["1", "1", "2", "mysterious"]);
    }

    #[test]
    fn test_pronoun_refers_to_last_assignment() {
        assert_eq!(run("X is 5\nSay it"), vec!["5"]);
    }

    #[test]
    fn test_pronoun_without_antecedent() {
        assert!(matches!(
            compile("Say it"),
            Err(CompileError::UnassociatedPronoun { .. })
        ));
    }

    #[test]
    fn test_functions_mutate_outer_variables() {
        let source = "Counter is 0\nBump takes amount\nPut counter plus amount into counter\nGive back counter\n\nBump taking 5\nSay counter";
        assert_eq!(run(source), vec!["5"]);
    }

    #[test]
    fn test_function_variables_stay_inside() {
        let source = "F takes x\nPut x into inner\nGive back inner\n\nF taking 1\nSay inner";
        let err = compile(source).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_parameters_shadow_outer_variables() {
        let source = "X is 1\nEcho takes x\nPut x plus 1 into x\nGive back x\n\nSay Echo taking 10\nSay X";
        assert_eq!(run(source), vec!["11", "1"]);
    }

    #[test]
    fn test_recursion() {
        let source = "Fact takes count\nIf count is 0\nGive back 1\nElse\nGive back count times Fact taking count minus 1\n\n\nSay Fact taking 5";
        assert_eq!(run(source), vec!["120"]);
    }

    #[test]
    fn test_break_and_continue() {
        let source = "X is 0\nWhile X is lower than 10\nBuild X up\nIf X is 3\nContinue\n\nIf X is 5\nBreak\n\nSay X\n\nSay \"done\"";
        assert_eq!(run(source), vec!["1", "2", "4", "done"]);
    }

    #[test]
    fn test_until_loop() {
        let source = "X is 0\nUntil X is 3\nBuild X up\n\nSay X";
        assert_eq!(run(source), vec!["3"]);
    }

    #[test]
    fn test_loose_break_leaves_the_block() {
        assert_eq!(run("If true\nSay 3\nBreak\nSay 4\n\nSay 5"), vec!["3", "5"]);
        assert_eq!(run("Say 1\nContinue\nSay 2"), vec!["1"]);
    }

    #[test]
    fn test_input() {
        let source = "Listen to your heart\nSay your heart\nListen to the night\nSay the night";
        let output = run_with_input(source, &["hello"]).unwrap();
        assert_eq!(output, vec!["hello", "mysterious"]);
    }

    #[test]
    fn test_split_and_join() {
        let source = "My string is \"a,b,c\"\nCut my string into pieces with \",\"\nSay pieces\nJoin pieces into result with \"-\"\nSay result";
        assert_eq!(run(source), vec!["3", "a-b-c"]);
    }

    #[test]
    fn test_cast() {
        let source = "Put \"41\" into num\nCast num\nBuild num up\nSay num\nCast 65 into letter\nSay letter";
        assert_eq!(run(source), vec!["42", "A"]);
    }

    #[test]
    fn test_cast_becomes_the_pronoun_antecedent() {
        let source = "Put \"41\" into num\nX is 0\nCast num\nSay it";
        assert_eq!(run(source), vec!["41"]);
    }

    #[test]
    fn test_cast_needs_a_destination() {
        assert!(matches!(
            compile("Cast \"5\""),
            Err(CompileError::CastIntoNothing(_))
        ));
        assert!(matches!(
            compile("Cut \"a b\" with \" \""),
            Err(CompileError::CutWithoutVariable(_))
        ));
    }

    #[test]
    fn test_rounding() {
        let source = "X is 2.5\nTurn X up\nSay X\nY is 2.4\nTurn Y round\nSay Y";
        assert_eq!(run(source), vec!["3", "2"]);
    }

    #[test]
    fn test_division_is_stable() {
        assert_eq!(run("Say 1 over 3"), vec!["0.3333333"]);
    }

    #[test]
    fn test_nothing_stays_visible_in_concatenation() {
        assert_eq!(run("Say \"x\" plus nothing"), vec!["xnull"]);
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            run("Say true and false\nSay false or yes\nSay false nor lies"),
            vec!["false", "true", "true"]
        );
    }

    #[test]
    fn test_string_subtraction() {
        assert!(matches!(
            compile("Say \"a\" minus 1"),
            Err(CompileError::UnsupportedOperation { .. })
        ));
        let err = run_with_input("X is \"a\"\nSay X minus 1", &[]).unwrap_err();
        assert!(matches!(
            err,
            BonjovaError::Runtime(RuntimeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_mysterious_cannot_be_built_up() {
        let err = run_with_input("My world is mysterious\nBuild my world up\nSay my world", &[]).unwrap_err();
        assert!(matches!(
            err,
            BonjovaError::Runtime(RuntimeError::UnsupportedOperation { .. })
        ));
        assert!(run_with_input("My world is mysterious\nKnock my world down", &[]).is_err());
    }

    #[test]
    fn test_oversized_branch_is_a_compile_error() {
        let source = format!("If true\n{}", "Say 1\n".repeat(33_000));
        assert!(matches!(
            compile(&source),
            Err(CompileError::JumpTooFar { line: 1 })
        ));
    }

    #[test]
    fn test_runaway_recursion() {
        let source = "Forever takes x\nGive back Forever taking x\n\nForever taking 1";
        let err = run_with_input(source, &[]).unwrap_err();
        assert!(matches!(
            err,
            BonjovaError::Runtime(RuntimeError::StackOverflow { .. })
        ));
    }
}
