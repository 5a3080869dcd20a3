// Lexer module - tokenizer using logos

use crate::span::SourceMap;
use logos::Logos;
use std::fmt;
use thiserror::Error;

/// Failure reported by a logos callback
#[derive(Debug, Default, Clone, PartialEq)]
pub enum ScanError {
    #[default]
    Illegal,
    InvalidNumber,
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = ScanError)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")] // Skip block comments
pub enum Token {
    // Keywords
    #[token("array")]
    Array,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("char")]
    Char,
    #[token("continue")]
    Continue,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("integer")]
    Integer,
    #[token("print")]
    Print,
    #[token("return")]
    Return,
    #[token("string")]
    String,
    #[token("true")]
    True,
    #[token("void")]
    Void,
    #[token("while")]
    While,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("=")]
    Assign,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // Literals
    #[regex(r"[0-9]+", parse_int)]
    IntLiteral(i64),

    #[regex(r"([0-9]+\.[0-9]+|\.[0-9]+)([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    FloatLiteral(f64),

    #[regex(r"'([^'\\\n]|\\.)'", |lex| {
        let s = lex.slice();
        unescape_char(&s[1..s.len() - 1])
    })]
    CharLiteral(char),

    // Escape sequences stay raw; print expands \n and \t
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLiteral(String),

    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,

    #[regex(r"'([^'\\\n]|\\.)?")]
    UnterminatedChar,

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn parse_int(lex: &mut logos::Lexer<Token>) -> Result<i64, ScanError> {
    lex.slice().parse().map_err(|_| ScanError::InvalidNumber)
}

fn parse_float(lex: &mut logos::Lexer<Token>) -> Result<f64, ScanError> {
    lex.slice().parse().map_err(|_| ScanError::InvalidNumber)
}

fn unescape_char(inner: &str) -> Option<char> {
    let mut chars = inner.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(esc), None) => match esc {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            _ => None,
        },
        (Some(c), None, None) if c != '\\' => Some(c),
        _ => None,
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::IntLiteral(n) => return write!(f, "{}", n),
            Token::FloatLiteral(x) => return write!(f, "{:?}", x),
            Token::CharLiteral(c) => return write!(f, "{:?}", c),
            Token::StringLiteral(s) => return write!(f, "\"{}\"", s),
            Token::Ident(name) => return write!(f, "'{}'", name),
            Token::UnterminatedString => "unterminated string",
            Token::UnterminatedChar => "unterminated char",
            Token::Array => "array",
            Token::Boolean => "boolean",
            Token::Break => "break",
            Token::Char => "char",
            Token::Continue => "continue",
            Token::Do => "do",
            Token::Else => "else",
            Token::False => "false",
            Token::Float => "float",
            Token::For => "for",
            Token::Function => "function",
            Token::If => "if",
            Token::Integer => "integer",
            Token::Print => "print",
            Token::Return => "return",
            Token::String => "string",
            Token::True => "true",
            Token::Void => "void",
            Token::While => "while",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Inc => "++",
            Token::Dec => "--",
            Token::EqEq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Le => "<=",
            Token::Ge => ">=",
            Token::Assign => "=",
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
        };
        write!(f, "'{}'", text)
    }
}

/// A token together with the source line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("illegal character {ch:?}")]
    IllegalCharacter { ch: char, line: usize },
    #[error("unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("malformed character literal")]
    UnterminatedChar { line: usize },
    #[error("invalid numeric literal `{text}`")]
    InvalidNumber { text: String, line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::IllegalCharacter { line, .. }
            | LexError::UnterminatedString { line }
            | LexError::UnterminatedChar { line }
            | LexError::InvalidNumber { line, .. } => *line,
        }
    }
}

/// Scan a whole source text, stopping at the first lexical error
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    let map = SourceMap::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let line = map.line_at(lexer.span().start);
        match result {
            Ok(Token::UnterminatedString) => return Err(LexError::UnterminatedString { line }),
            Ok(Token::UnterminatedChar) => return Err(LexError::UnterminatedChar { line }),
            Ok(token) => tokens.push(SpannedToken { token, line }),
            Err(ScanError::InvalidNumber) => {
                return Err(LexError::InvalidNumber {
                    text: lexer.slice().to_string(),
                    line,
                })
            }
            Err(ScanError::Illegal) => {
                let slice = lexer.slice();
                if slice.starts_with('\'') {
                    return Err(LexError::UnterminatedChar { line });
                }
                let ch = slice.chars().next().unwrap_or('\0');
                return Err(LexError::IllegalCharacter { ch, line });
            }
        }
    }

    log::trace!("scanned {} tokens", tokens.len());
    Ok(tokens)
}
