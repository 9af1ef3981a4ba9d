//! Bonjova: a Rockstar compiler targeting a stack-based bytecode VM.
//!
//! This is the library root that exports all modules.
//!
//! Source text goes through the [`lexer`] and [`parser`] into an [`ast`],
//! the [`vm::Compiler`] resolves variables and pronouns and emits bytecode,
//! and the [`vm::Vm`] runs it against [`value`] semantics.

#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::new_without_default)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod value;
pub mod vm;

use std::path::Path;
use std::sync::Once;

use error::BonjovaError;

/// Options for running a program.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Lines handed to `Listen`, in order.
    pub input: Vec<String>,
    /// Print output lines to stdout as they are produced.
    pub echo: bool,
    /// Print the disassembly to stderr before running.
    pub disassemble: bool,
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=bonjova=debug` or `RUST_LOG=bonjova=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}

/// Lex and parse a program.
pub fn parse(source: &str) -> Result<ast::Program, BonjovaError> {
    let tokens = lexer::Scanner::new(source).scan_tokens()?;
    let program = parser::Parser::new(tokens).parse()?;
    Ok(program)
}

/// Lex, parse and compile a program.
pub fn compile(source: &str) -> Result<vm::CompiledModule, BonjovaError> {
    let program = parse(source)?;
    Ok(vm::Compiler::compile(&program)?)
}

/// Render the bytecode of a program.
pub fn disassemble_source(source: &str) -> Result<String, BonjovaError> {
    let module = compile(source)?;
    Ok(vm::disassemble(&module))
}

/// Run a program without input, returning the printed lines.
pub fn run(source: &str) -> Result<Vec<String>, BonjovaError> {
    run_with_options(source, &RunOptions::default())
}

/// Run a program with full control over execution options, returning the
/// printed lines.
pub fn run_with_options(source: &str, options: &RunOptions) -> Result<Vec<String>, BonjovaError> {
    let module = compile(source)?;

    if options.disassemble {
        eprintln!("{}", vm::disassemble(&module));
        eprintln!("---");
    }

    let mut machine = vm::Vm::new()
        .with_input(options.input.iter().cloned())
        .with_echo(options.echo);
    machine.execute(&module)?;
    Ok(machine.output)
}

/// Run a program from a file.
pub fn run_file(path: &Path, options: &RunOptions) -> Result<Vec<String>, BonjovaError> {
    let source = std::fs::read_to_string(path)?;
    run_with_options(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_returns_output() {
        assert_eq!(run("Say \"hi\"\nSay 1 plus 1").unwrap(), vec!["hi", "2"]);
    }

    #[test]
    fn test_run_with_input() {
        let options = RunOptions {
            input: vec!["rock".to_string(), "roll".to_string()],
            ..RunOptions::default()
        };
        let output = run_with_options(
            "Listen to your heart\nListen to my soul\nSay your heart plus my soul",
            &options,
        ).unwrap();
        assert_eq!(output, vec!["rockroll"]);
    }

    #[test]
    fn test_errors_carry_their_phase() {
        assert!(matches!(run("Say \"open"), Err(BonjovaError::Lexer(_))));
        assert!(matches!(run("Put 1 into"), Err(BonjovaError::Parser(_))));
        assert!(matches!(run("Say it"), Err(BonjovaError::Compile(_))));
        assert!(matches!(run("Say 1 over 0"), Err(BonjovaError::Runtime(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = run_file(Path::new("/nonexistent/song.rock"), &RunOptions::default()).unwrap_err();
        assert!(matches!(err, BonjovaError::Io(_)));
    }
}
