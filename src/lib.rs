// B-Minor front-end and interpreter library

pub mod ast;
pub mod checker;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod span;
pub mod stdlib;
pub mod types;

pub use ast::Program;
pub use checker::check;
pub use config::{Config, DEFAULT_MAX_CALL_DEPTH};
pub use error::{Diagnostic, Diagnostics, ErrorFormatter, RuntimeError, Stage, SyntaxError};
pub use interpreter::{Execution, Interpreter, Value};
pub use lexer::{tokenize, LexError, Token};
pub use parser::parse;

use thiserror::Error;

/// Failure before a syntax tree exists
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl From<&FrontendError> for Diagnostic {
    fn from(err: &FrontendError) -> Self {
        match err {
            FrontendError::Lex(e) => e.into(),
            FrontendError::Syntax(e) => e.into(),
        }
    }
}

/// Scan and parse `source`
pub fn parse_source(source: &str) -> Result<Program, FrontendError> {
    let tokens = tokenize(source)?;
    log::debug!("scanned {} tokens", tokens.len());
    Ok(parse(tokens)?)
}

/// Scan, parse and check `source`. Lexical and syntax errors are recorded in
/// `diagnostics` and yield `None`; semantic errors are recorded but the
/// annotated program is still returned.
pub fn compile(source: &str, diagnostics: &mut Diagnostics) -> Option<Program> {
    match parse_source(source) {
        Ok(mut program) => {
            check(&mut program, diagnostics);
            Some(program)
        }
        Err(err) => {
            diagnostics.push((&err).into());
            None
        }
    }
}
