//! A tree-walking interpreter for a small dynamically-typed, C-like
//! scripting language.
//!
//! Pipeline: [`scanner`] (bytes → tokens) → [`parser`] (tokens → statement
//! trees) → [`resolver`] (static scope distances) → [`interpreter`]
//! (execution).  [`run_source`] drives one complete run of the pipeline
//! against a long-lived [`interpreter::Interpreter`], which is how both the
//! file runner and the REPL use this crate.

pub mod ast;
pub mod classes;
pub mod environment;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use error::LoxError;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Run one complete compilation unit against `interpreter`.
///
/// Scanning and parsing each collect every error they can find; any static
/// error (lex, parse, resolve) prevents execution but leaves the
/// interpreter's global state untouched for the next call.  A runtime error
/// aborts the remaining statements of *this* call only.
pub fn run_source(
    interpreter: &mut Interpreter,
    source: &[u8],
) -> std::result::Result<(), Vec<LoxError>> {
    let mut errors: Vec<LoxError> = Vec::new();
    let mut tokens = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    // Parse even in the face of lexical errors so one run surfaces as many
    // diagnostics as possible; execution is gated below.
    let statements = match Parser::new(tokens).parse() {
        Ok(statements) => statements,
        Err(mut parse_errors) => {
            errors.append(&mut parse_errors);
            return Err(errors);
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut resolver = Resolver::new(interpreter);
    if let Err(e) = resolver.resolve(&statements) {
        return Err(vec![e]);
    }

    interpreter
        .interpret(&statements)
        .map_err(|e| vec![e.into()])
}
