use std::{
    fs,
    io::{self, Write},
    process,
};

use clap::Parser as ClapParser;
use colored::*;

extern crate frontend;
extern crate runtime;

use frontend::lexer::Lexer;
use frontend::parser::Parser;
use runtime::interpreter::Interpreter;
use runtime::resolver::Resolver;

// Classic sysexits codes: 65 for bad input, 70 for an internal runtime
// failure
const EXIT_STATIC_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;

// --------
//   CLI
// --------

#[derive(ClapParser)]
#[command(version)]
#[command(about = "Tree-walking interpreter for the Lox language")]
struct Cli {
    /// Path to the script to run. Starts an interactive session when
    /// omitted.
    file: Option<String>,

    /// Prints the AST tree before running
    #[arg(short, long)]
    ast_print: bool,
}

enum RunOutcome {
    Success,
    StaticError,
    RuntimeError,
}

/// One full trip through the pipeline. Each stage only runs when every
/// stage before it finished clean, diagnostics go to stderr as they are.
fn interpretation_sequence(code: &str, interpreter: &mut Interpreter, cli: &Cli) -> RunOutcome {
    let mut lexer: Lexer = Default::default();
    lexer.tokenize(code);

    if !lexer.errors.is_empty() {
        for error in &lexer.errors {
            eprintln!("{error}");
        }
        return RunOutcome::StaticError;
    }

    let mut parser: Parser = Default::default();
    parser.build_ast(std::mem::take(&mut lexer.tokens));

    if cli.ast_print {
        println!("{:#?}", parser.ast_nodes);
    }

    if !parser.errors.is_empty() {
        for error in &parser.errors {
            eprintln!("{error}");
        }
        return RunOutcome::StaticError;
    }

    let mut resolver = Resolver::new();
    let locals = match resolver.resolve(&parser.ast_nodes) {
        Ok(locals) => locals,
        Err(e) => {
            eprintln!("{e}");
            return RunOutcome::StaticError;
        }
    };

    for warning in &resolver.warnings {
        println!("{} {}", "Warning:".yellow().bold(), warning);
    }

    interpreter.add_locals(locals);

    match interpreter.interpret(&parser.ast_nodes) {
        Ok(()) => RunOutcome::Success,
        Err(e) => {
            eprintln!("{e}");
            RunOutcome::RuntimeError
        }
    }
}

fn run_file(file_path: &str, cli: &Cli) {
    let source_code = match fs::read_to_string(file_path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error opening script file {}: {e}", file_path.green());
            process::exit(EXIT_STATIC_ERROR);
        }
    };

    let mut interpreter = Interpreter::new();

    match interpretation_sequence(&source_code, &mut interpreter, cli) {
        RunOutcome::Success => {}
        RunOutcome::StaticError => process::exit(EXIT_STATIC_ERROR),
        RunOutcome::RuntimeError => process::exit(EXIT_RUNTIME_ERROR),
    }
}

// REPL. One interpreter for the whole session so definitions carry over
// from line to line, and any error just falls through to the next prompt.
fn repl(cli: &Cli) {
    println!("{} - type 'quit' to exit", "Lox".cyan().bold());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut interpreter = Interpreter::new();
    let mut input = String::new();

    loop {
        input.clear();
        print!("> ");
        stdout.flush().unwrap();

        match stdin.read_line(&mut input) {
            // End of input
            Ok(0) => break,
            Ok(_) => {
                let trimmed_input = input.trim();

                if trimmed_input == "quit" {
                    break;
                }

                if trimmed_input.is_empty() {
                    continue;
                }

                let _ = interpretation_sequence(trimmed_input, &mut interpreter, cli);
            }
            Err(e) => {
                eprintln!("Error reading from terminal: {e}");
                break;
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match &cli.file {
        Some(file_path) => run_file(file_path, &cli),
        None => repl(&cli),
    }
}
