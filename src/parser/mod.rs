// Parser module - recursive descent parser over the scanned token stream
//
// Statements are classified as closed or open so that an `else` always
// binds to the nearest preceding `if` that has no else yet, also when the
// `if` sits inside a `for`/`while` body.

mod expr;

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{SpannedToken, Token};
use crate::config::{RED_ZONE, STACK_GROWTH};

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Deepest combined nesting of statements and expressions
pub const MAX_NESTING: usize = 256;

/// Parse a complete program. Fails on the first unexpected token.
pub fn parse<I>(tokens: I) -> ParseResult<Program>
where
    I: IntoIterator<Item = SpannedToken>,
{
    let mut parser = Parser::new(tokens.into_iter().collect());
    let program = parser.parse_program()?;
    log::debug!("parsed {} top-level declarations", program.decls.len());
    Ok(program)
}

/// Dangling-statement class of a parsed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Cannot take a following `else`
    Closed,
    /// Ends in an `if` that still has its else slot free
    Open,
}

pub(crate) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level down, failing past `MAX_NESTING`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            let found = match self.error_here() {
                SyntaxError::Unexpected { found, .. } | SyntaxError::TooDeep { found, .. } => found,
            };
            return Err(SyntaxError::TooDeep {
                found,
                limit: MAX_NESTING,
                line: self.line(),
            });
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || parse(self));
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn check(&self, expected: &Token) -> bool {
        let expected = std::mem::discriminant(expected);
        matches!(self.peek(), Some(token) if std::mem::discriminant(token) == expected)
    }

    /// Line of the current token, or of the last token at end of input
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the expected token and return its line
    fn expect(&mut self, expected: Token) -> ParseResult<usize> {
        if self.check(&expected) {
            let line = self.line();
            self.pos += 1;
            Ok(line)
        } else {
            Err(self.error_here())
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, usize)> {
        match self.tokens.get(self.pos) {
            Some(SpannedToken {
                token: Token::Ident(name),
                line,
            }) => {
                let result = (name.clone(), *line);
                self.pos += 1;
                Ok(result)
            }
            _ => Err(self.error_here()),
        }
    }

    fn error_here(&self) -> SyntaxError {
        self.error_at(self.pos)
    }

    fn error_at(&self, pos: usize) -> SyntaxError {
        match self.tokens.get(pos) {
            Some(t) => SyntaxError::Unexpected {
                found: t.token.to_string(),
                line: t.line,
            },
            None => SyntaxError::Unexpected {
                found: "EOF".to_string(),
                line: self.tokens.last().map(|t| t.line).unwrap_or(1),
            },
        }
    }

    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut decls = Vec::new();
        while self.peek().is_some() {
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    // ==========================================================
    // DECLARATIONS
    // ==========================================================

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        let (name, line) = self.expect_ident()?;
        self.expect(Token::Colon)?;

        match self.peek() {
            Some(Token::Function) => self.parse_function_decl(name, line),
            Some(Token::Array) => {
                let (elem, dims) = self.parse_array_type()?;
                let init = if self.eat(&Token::Assign) {
                    self.expect(Token::LBrace)?;
                    let values = self.parse_expr_list(&Token::RBrace)?;
                    self.expect(Token::RBrace)?;
                    Some(values)
                } else {
                    None
                };
                self.expect(Token::Semicolon)?;
                Ok(Decl::Array(ArrayDecl {
                    name,
                    elem,
                    dims,
                    init,
                    line,
                }))
            }
            _ => {
                let ty = self.parse_scalar_type()?;
                let init = if self.eat(&Token::Assign) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(Token::Semicolon)?;
                Ok(Decl::Var(VarDecl {
                    name,
                    ty,
                    init,
                    line,
                }))
            }
        }
    }

    fn parse_function_decl(&mut self, name: String, line: usize) -> ParseResult<Decl> {
        self.expect(Token::Function)?;
        let return_type = self.parse_type()?;
        self.expect(Token::LParen)?;
        let params = self.parse_params()?;
        self.expect(Token::RParen)?;

        let body = if self.eat(&Token::Semicolon) {
            None
        } else {
            self.expect(Token::Assign)?;
            self.expect(Token::LBrace)?;
            let body = self.parse_stmt_list()?;
            self.expect(Token::RBrace)?;
            self.eat(&Token::Semicolon);
            Some(body)
        };

        Ok(Decl::Func(FuncDecl {
            name,
            return_type,
            params,
            body,
            line,
        }))
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let (name, line) = self.expect_ident()?;
        self.expect(Token::Colon)?;
        if self.check(&Token::Array) {
            let (elem, dims) = self.parse_array_type()?;
            Ok(Param::Array {
                name,
                elem,
                dims,
                line,
            })
        } else {
            let ty = self.parse_scalar_type()?;
            Ok(Param::Var {
                name,
                ty: ty.base,
                line,
            })
        }
    }

    // ==========================================================
    // TYPES
    // ==========================================================

    fn parse_type(&mut self) -> ParseResult<TypeNode> {
        if self.check(&Token::Array) {
            let line = self.line();
            let (base, dims) = self.parse_array_type()?;
            Ok(TypeNode { base, dims, line })
        } else {
            self.parse_scalar_type()
        }
    }

    fn parse_scalar_type(&mut self) -> ParseResult<TypeNode> {
        let line = self.line();
        let base = match self.peek() {
            Some(Token::Integer) => BaseType::Integer,
            Some(Token::Float) => BaseType::Float,
            Some(Token::Boolean) => BaseType::Boolean,
            Some(Token::Char) => BaseType::Char,
            Some(Token::String) => BaseType::String,
            Some(Token::Void) => BaseType::Void,
            _ => return Err(self.error_here()),
        };
        self.pos += 1;
        Ok(TypeNode::scalar(base, line))
    }

    /// `array [ size? ] type`, possibly nested
    fn parse_array_type(&mut self) -> ParseResult<(BaseType, Vec<Option<Expr>>)> {
        let mut dims = Vec::new();
        while self.eat(&Token::Array) {
            self.expect(Token::LBracket)?;
            let size = if self.check(&Token::RBracket) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(Token::RBracket)?;
            dims.push(size);
        }
        let elem = self.parse_scalar_type()?;
        Ok((elem.base, dims))
    }

    // ==========================================================
    // STATEMENTS
    // ==========================================================

    /// Statements up to (not including) the closing brace
    fn parse_stmt_list(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error_here());
            }
            let (stmt, _) = self.parse_statement()?;
            stmts.push(stmt);
        }
        Ok(stmts)
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<(Stmt, Shape)> {
        self.nested(|parser| match parser.peek() {
            Some(Token::If) => parser.parse_if(),
            Some(Token::For) => parser.parse_for(),
            Some(Token::While) => parser.parse_while(),
            _ => Ok((parser.parse_simple_statement()?, Shape::Closed)),
        })
    }

    /// Body of an if/else/loop: a braced block is flattened into its statements
    fn parse_branch(&mut self) -> ParseResult<(Vec<Stmt>, Shape)> {
        let (stmt, shape) = self.parse_statement()?;
        let body = match stmt.kind {
            StmtKind::Block(stmts) => stmts,
            _ => vec![stmt],
        };
        Ok((body, shape))
    }

    fn parse_if(&mut self) -> ParseResult<(Stmt, Shape)> {
        let line = self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let (then, then_shape) = self.parse_branch()?;

        if self.eat(&Token::Else) {
            // An open then-branch would already have taken this else
            debug_assert_eq!(then_shape, Shape::Closed);
            let (else_body, else_shape) = self.parse_branch()?;
            let stmt = Stmt {
                kind: StmtKind::If {
                    cond,
                    then,
                    else_: Some(else_body),
                },
                line,
            };
            Ok((stmt, else_shape))
        } else {
            let stmt = Stmt {
                kind: StmtKind::If {
                    cond,
                    then,
                    else_: None,
                },
                line,
            };
            Ok((stmt, Shape::Open))
        }
    }

    fn parse_for(&mut self) -> ParseResult<(Stmt, Shape)> {
        let line = self.expect(Token::For)?;
        self.expect(Token::LParen)?;
        let init = self.parse_opt_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;
        let cond = self.parse_opt_expr(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;
        let step = self.parse_opt_expr(&Token::RParen)?;
        self.expect(Token::RParen)?;
        let (body, shape) = self.parse_branch()?;

        let stmt = Stmt {
            kind: StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            line,
        };
        Ok((stmt, shape))
    }

    fn parse_while(&mut self) -> ParseResult<(Stmt, Shape)> {
        let line = self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let (body, shape) = self.parse_branch()?;
        Ok((
            Stmt {
                kind: StmtKind::While { cond, body },
                line,
            },
            shape,
        ))
    }

    fn parse_simple_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::Return) => {
                self.pos += 1;
                let value = self.parse_opt_expr(&Token::Semicolon)?;
                self.expect(Token::Semicolon)?;
                StmtKind::Return(value)
            }
            Some(Token::Print) => {
                self.pos += 1;
                let values = self.parse_expr_list(&Token::Semicolon)?;
                self.expect(Token::Semicolon)?;
                StmtKind::Print(values)
            }
            Some(Token::Break) => {
                self.pos += 1;
                self.expect(Token::Semicolon)?;
                StmtKind::Break
            }
            Some(Token::Continue) => {
                self.pos += 1;
                self.expect(Token::Semicolon)?;
                StmtKind::Continue
            }
            Some(Token::Do) => {
                self.pos += 1;
                let (body, _) = self.parse_branch()?;
                self.expect(Token::While)?;
                self.expect(Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen)?;
                self.expect(Token::Semicolon)?;
                StmtKind::DoWhile { body, cond }
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                let stmts = self.parse_stmt_list()?;
                self.expect(Token::RBrace)?;
                StmtKind::Block(stmts)
            }
            Some(Token::Ident(_)) if matches!(self.peek_at(1), Some(Token::Colon)) => {
                StmtKind::Decl(self.parse_decl()?)
            }
            Some(_) => {
                let expr = self.parse_expr()?;
                self.expect(Token::Semicolon)?;
                StmtKind::Expr(expr)
            }
            None => return Err(self.error_here()),
        };
        Ok(Stmt { kind, line })
    }
}
