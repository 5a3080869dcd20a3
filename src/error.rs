// Diagnostics, stage errors and error formatting with source code context

use crate::lexer::LexError;
use crate::span::SourceMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a diagnostic originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexical => "lexical",
            Stage::Syntax => "syntax",
            Stage::Semantic => "semantic",
            Stage::Runtime => "runtime",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

/// Caller-owned diagnostic sink threaded through every stage
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, stage: Stage, line: usize, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{} error at line {}: {}", stage, line, message);
        self.items.push(Diagnostic {
            stage,
            line,
            message,
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.items.iter().filter(|d| d.stage == stage).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.items.iter().map(|d| d.message.clone()).collect()
    }
}

impl From<&LexError> for Diagnostic {
    fn from(err: &LexError) -> Self {
        Diagnostic {
            stage: Stage::Lexical,
            line: err.line(),
            message: format!("Lexical error: {}", err),
        }
    }
}

/// Parsing stops at the first of these
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    /// `found` is the rendered offending token, or `EOF`
    #[error("Syntax error at {found}")]
    Unexpected { found: String, line: usize },
    #[error("Syntax error at {found}: nesting exceeds {limit} levels")]
    TooDeep {
        found: String,
        limit: usize,
        line: usize,
    },
}

impl SyntaxError {
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Unexpected { line, .. } | SyntaxError::TooDeep { line, .. } => *line,
        }
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(err: &SyntaxError) -> Self {
        Diagnostic {
            stage: Stage::Syntax,
            line: err.line(),
            message: err.to_string(),
        }
    }
}

/// Failure raised by a native callable
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct CallError(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String, line: usize },
    #[error("in '{op}', operands must be {expected}, got {found}")]
    InvalidOperands {
        op: &'static str,
        expected: &'static str,
        found: String,
        line: usize,
    },
    #[error("division by zero")]
    DivisionByZero { line: usize },
    #[error("integer overflow in '{op}'")]
    IntegerOverflow { op: &'static str, line: usize },
    #[error("'{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
    },
    #[error("'{text}' is not callable")]
    NotCallable { text: String, line: usize },
    #[error("{name}(): {message}")]
    NativeCall {
        name: String,
        message: String,
        line: usize,
    },
    #[error("'{name}' is not an array")]
    NotAnArray { name: String, line: usize },
    #[error("array index must be an integer, got {found}")]
    InvalidIndex { found: String, line: usize },
    #[error("index {index} out of bounds for '{name}' of length {len}")]
    IndexOutOfBounds {
        name: String,
        index: i64,
        len: usize,
        line: usize,
    },
    #[error("invalid array size {size} for '{name}'")]
    InvalidArraySize { name: String, size: String, line: usize },
    #[error("array '{name}' declared with {expected} elements but initialized with {found}")]
    InitializerMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
    },
    #[error("function '{name}' was declared but never defined")]
    MissingBody { name: String, line: usize },
    #[error("maximum call depth of {limit} exceeded")]
    RecursionLimit { limit: usize, line: usize },
    #[error("'{keyword}' outside of a loop")]
    ControlOutsideLoop { keyword: &'static str, line: usize },
    #[error("cannot assign to '{text}'")]
    InvalidTarget { text: String, line: usize },
    #[error("output error: {message}")]
    Output { message: String, line: usize },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::InvalidOperands { line, .. }
            | RuntimeError::DivisionByZero { line }
            | RuntimeError::IntegerOverflow { line, .. }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::NotCallable { line, .. }
            | RuntimeError::NativeCall { line, .. }
            | RuntimeError::NotAnArray { line, .. }
            | RuntimeError::InvalidIndex { line, .. }
            | RuntimeError::IndexOutOfBounds { line, .. }
            | RuntimeError::InvalidArraySize { line, .. }
            | RuntimeError::InitializerMismatch { line, .. }
            | RuntimeError::MissingBody { line, .. }
            | RuntimeError::RecursionLimit { line, .. }
            | RuntimeError::ControlOutsideLoop { line, .. }
            | RuntimeError::InvalidTarget { line, .. }
            | RuntimeError::Output { line, .. } => *line,
        }
    }
}

impl From<&RuntimeError> for Diagnostic {
    fn from(err: &RuntimeError) -> Self {
        Diagnostic {
            stage: Stage::Runtime,
            line: err.line(),
            message: err.to_string(),
        }
    }
}

pub struct ErrorFormatter {
    tracker: SourceMap,
}

impl ErrorFormatter {
    pub fn new(source: &str) -> Self {
        Self {
            tracker: SourceMap::new(source),
        }
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        let line = diagnostic.line;

        output.push_str(&format!(
            "{} error:{}: {}\n",
            diagnostic.stage, line, diagnostic.message
        ));

        for (line_num, line_content) in self.tracker.get_context(line, 2) {
            let line_marker = if line_num == line { ">" } else { " " };
            output.push_str(&format!(" {} {:>4} | {}\n", line_marker, line_num, line_content));
        }

        output
    }

    pub fn format_all(&self, diagnostics: &Diagnostics) -> String {
        diagnostics.iter().map(|d| self.format(d)).collect()
    }
}
