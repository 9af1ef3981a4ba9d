//! Function call dispatch for the VM.

use std::rc::Rc;

use tracing::trace;

use crate::error::RuntimeError;
use crate::span::Span;
use crate::value::Value;

use super::chunk::FunctionProto;
use super::vm::{CallFrame, Vm};

/// Deepest call nesting before the VM gives up.
pub const MAX_FRAMES: usize = 1024;

impl Vm {
    /// Call a value with the given number of argument slots on the stack.
    /// The callee is below the arguments on the stack.
    pub fn call_value(&mut self, argc: usize, span: Span) -> Result<(), RuntimeError> {
        let callee_idx = self.stack.len() - 1 - argc;
        match &self.stack[callee_idx] {
            Value::Function(function) => {
                let function = function.clone();
                self.call_function(function, argc, span)
            }
            other => Err(RuntimeError::not_callable(other.type_name(), span)),
        }
    }

    /// Push a frame for `function`. Missing arguments are Mysterious, and
    /// every local the body assigns is reserved up front.
    fn call_function(
        &mut self,
        function: Rc<FunctionProto>,
        argc: usize,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let arity = function.arity as usize;
        if argc > arity {
            return Err(RuntimeError::wrong_arity(arity, argc, span));
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::StackOverflow {
                depth: MAX_FRAMES,
                span,
            });
        }

        let stack_base = self.stack.len() - argc - 1; // -1 for the callee slot
        let locals = (function.local_count as usize).max(arity + 1);
        self.stack
            .resize(stack_base + locals, Value::Mysterious);

        trace!(
            function = %function.name,
            argc,
            depth = self.frames.len(),
            "call"
        );
        self.frames.push(CallFrame {
            function,
            ip: 0,
            stack_base,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::chunk::{CompiledModule, Constant};
    use crate::vm::emitter::Emitter;
    use crate::vm::opcode::Op;

    /// A program that calls a one-parameter identity function with the
    /// given number of arguments and prints the result.
    fn call_identity(args: &[f64]) -> Result<Vec<String>, RuntimeError> {
        let mut identity = FunctionProto::new("identity".to_string());
        identity.arity = 1;
        identity.local_count = 2;
        identity.chunk.emit(Op::GetLocal(1), 1);
        identity.chunk.emit(Op::Return, 1);

        let mut main = FunctionProto::new(String::new());
        let function = main
            .chunk
            .add_constant(Constant::Function(Rc::new(identity)))
            .unwrap();
        main.chunk.emit(Op::Constant(function), 1);
        for arg in args {
            let idx = main.chunk.add_constant(Constant::Number(*arg)).unwrap();
            main.chunk.emit(Op::Constant(idx), 1);
        }
        main.chunk.emit(Op::Call(args.len() as u8), 1);
        main.chunk.emit(Op::Print, 1);
        main.chunk.emit(Op::Nothing, 1);
        main.chunk.emit(Op::Return, 1);

        let module = CompiledModule {
            main: Rc::new(main),
            slot_count: 0,
            slot_names: Vec::new(),
        };
        let mut vm = Vm::new();
        vm.execute(&module)?;
        Ok(vm.output)
    }

    #[test]
    fn test_call_passes_arguments() {
        assert_eq!(call_identity(&[7.0]).unwrap(), vec!["7"]);
    }

    #[test]
    fn test_missing_arguments_are_mysterious() {
        assert_eq!(call_identity(&[]).unwrap(), vec!["mysterious"]);
    }

    #[test]
    fn test_too_many_arguments() {
        assert!(matches!(
            call_identity(&[1.0, 2.0]),
            Err(RuntimeError::WrongArity {
                expected: 1,
                got: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_calling_a_number() {
        let mut main = FunctionProto::new(String::new());
        let idx = main.chunk.add_constant(Constant::Number(3.0)).unwrap();
        main.chunk.emit(Op::Constant(idx), 1);
        main.chunk.emit(Op::Call(0), 1);
        main.chunk.emit(Op::Return, 1);
        let module = CompiledModule {
            main: Rc::new(main),
            slot_count: 0,
            slot_names: Vec::new(),
        };
        let err = Vm::new().execute(&module).unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable { .. }));
    }
}
