//! Bonjova CLI: compile and run Rockstar programs.

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use colored::Colorize;

use bonjova::error::BonjovaError;
use bonjova::RunOptions;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI command to execute.
enum Command {
    /// Run a program file
    Run { file: String, input: Vec<String> },
    /// Evaluate a string
    Eval { code: String, input: Vec<String> },
    /// Compile without running
    Check { file: String },
    /// Dump the parsed program as JSON
    Ast { file: String },
    Help,
    Version,
}

/// CLI options parsed from arguments.
struct Options {
    command: Command,
    disassemble: bool,
}

fn print_usage() {
    eprintln!("Bonjova {} - Rockstar compiler", VERSION);
    eprintln!();
    eprintln!("Usage: bonjova [options] <program.rock> [input...]");
    eprintln!("       bonjova -e <code> [input...]");
    eprintln!("       bonjova --check <program.rock>");
    eprintln!("       bonjova --ast <program.rock>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <code>        Evaluate code directly");
    eprintln!("  --check          Compile only and report errors");
    eprintln!("  --ast            Print the parsed program as JSON");
    eprintln!("  --disassemble    Print the bytecode to stderr before running");
    eprintln!("  --version, -V    Show the version");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Arguments after the program are fed to `Listen`, one per line.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  bonjova fizzbuzz.rock                 Run a program");
    eprintln!("  bonjova greet.rock Tommy Gina        Run with two input lines");
    eprintln!("  bonjova -e 'Say 1 plus 1'             Evaluate code directly");
    eprintln!("  RUST_LOG=bonjova=debug bonjova x.rock Run with debug tracing");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message.red());
    print_usage();
    process::exit(64);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut disassemble = false;
    let mut command = None;

    let mut i = 0;
    while i < args.len() && command.is_none() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => command = Some(Command::Help),
            "--version" | "-V" => command = Some(Command::Version),
            "--disassemble" => disassemble = true,
            "-e" => {
                i += 1;
                let Some(code) = args.get(i) else {
                    usage_error("-e requires code to evaluate");
                };
                command = Some(Command::Eval {
                    code: code.clone(),
                    input: args[i + 1..].to_vec(),
                });
            }
            "--check" | "--ast" => {
                let is_check = arg == "--check";
                i += 1;
                let Some(file) = args.get(i) else {
                    usage_error(&format!("{} requires a file", arg));
                };
                if i + 1 < args.len() {
                    usage_error(&format!("Unexpected argument: {}", args[i + 1]));
                }
                let file = file.clone();
                command = Some(if is_check {
                    Command::Check { file }
                } else {
                    Command::Ast { file }
                });
            }
            other if other.starts_with('-') => {
                usage_error(&format!("Unknown option: {}", other));
            }
            _ => {
                command = Some(Command::Run {
                    file: arg.clone(),
                    input: args[i + 1..].to_vec(),
                });
            }
        }
        i += 1;
    }

    match command {
        Some(command) => Options {
            command,
            disassemble,
        },
        None => usage_error("No program given"),
    }
}

fn main() {
    bonjova::init_tracing();
    let options = parse_args();

    match &options.command {
        Command::Run { file, input } => run_file(file, input, &options),
        Command::Eval { code, input } => run_eval(code, input, &options),
        Command::Check { file } => run_check(file),
        Command::Ast { file } => run_ast(file),
        Command::Help => print_usage(),
        Command::Version => println!("bonjova {}", VERSION),
    }
}

fn run_options(input: &[String], options: &Options) -> RunOptions {
    RunOptions {
        input: input.to_vec(),
        echo: true,
        disassemble: options.disassemble,
    }
}

fn run_file(file: &str, input: &[String], options: &Options) {
    let result = bonjova::run_file(Path::new(file), &run_options(input, options));
    if let Err(e) = result {
        fail(&e);
    }
}

fn run_eval(code: &str, input: &[String], options: &Options) {
    let result = bonjova::run_with_options(code, &run_options(input, options));
    if let Err(e) = result {
        fail(&e);
    }
}

fn run_check(file: &str) {
    let source = read_source(file);
    match bonjova::compile(&source) {
        Ok(_) => println!("{} {}", "ok".green(), file),
        Err(e) => fail(&e),
    }
}

fn run_ast(file: &str) {
    let source = read_source(file);
    let program = bonjova::parse(&source).unwrap_or_else(|e| fail(&e));
    match serde_json::to_string_pretty(&program) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(70);
        }
    }
}

fn read_source(file: &str) -> String {
    fs::read_to_string(file).unwrap_or_else(|e| fail(&BonjovaError::Io(e)))
}

fn fail(error: &BonjovaError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error.to_string().red());
    process::exit(exit_code(error));
}

fn exit_code(error: &BonjovaError) -> i32 {
    match error {
        BonjovaError::Lexer(_) | BonjovaError::Parser(_) | BonjovaError::Compile(_) => 65,
        BonjovaError::Runtime(_) | BonjovaError::Io(_) => 70,
    }
}
