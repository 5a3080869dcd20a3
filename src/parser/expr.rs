// Expression grammar
//
// Precedence, lowest first: assignment (right-assoc), `||`, `&&`,
// `== !=`, `< <= > >=`, `+ -`, `* / %`, prefix `- ! ++ --`,
// postfix `++ --`, primary.

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::lexer::Token;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_assignment)
    }

    /// Optional expression, absent when the next token is `terminator`
    pub(super) fn parse_opt_expr(&mut self, terminator: &Token) -> ParseResult<Option<Expr>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.parse_expr().map(Some)
        }
    }

    /// Comma separated expressions, possibly empty when `terminator` follows
    pub(super) fn parse_expr_list(&mut self, terminator: &Token) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.check(terminator) {
            return Ok(items);
        }
        items.push(self.parse_expr()?);
        while self.eat(&Token::Comma) {
            items.push(self.parse_expr()?);
        }
        Ok(items)
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let mut target = self.parse_or()?;
        if !self.check(&Token::Assign) {
            return Ok(target);
        }
        if !target.mark_store() {
            return Err(self.error_here());
        }
        self.pos += 1;
        let value = self.nested(Self::parse_assignment)?;
        let line = target.line;
        Ok(Expr::new(
            ExprKind::Assignment {
                target: Box::new(target),
                value: Box::new(value),
            },
            line,
        ))
    }

    /// One left-associative binary tier
    fn parse_binary_tier(
        &mut self,
        ops: &[(Token, BinOp)],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut left = operand(self)?;
        'tier: loop {
            for (token, op) in ops {
                if self.check(token) {
                    let line = self.line();
                    self.pos += 1;
                    let right = operand(self)?;
                    left = Expr::new(
                        ExprKind::BinOper {
                            op: *op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        line,
                    );
                    continue 'tier;
                }
            }
            return Ok(left);
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(&[(Token::Or, BinOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(&[(Token::And, BinOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(
            &[(Token::EqEq, BinOp::Eq), (Token::Ne, BinOp::Ne)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(
            &[
                (Token::Lt, BinOp::Lt),
                (Token::Le, BinOp::Le),
                (Token::Gt, BinOp::Gt),
                (Token::Ge, BinOp::Ge),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.parse_binary_tier(
            &[
                (Token::Star, BinOp::Mul),
                (Token::Slash, BinOp::Div),
                (Token::Percent, BinOp::Mod),
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        match self.peek() {
            Some(Token::Minus) | Some(Token::Not) => {
                let op = if self.check(&Token::Minus) {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Not
                };
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::new(
                    ExprKind::UnaryOper {
                        op,
                        operand: Box::new(operand),
                    },
                    line,
                ))
            }
            Some(Token::Inc) | Some(Token::Dec) => {
                let increment = self.check(&Token::Inc);
                self.pos += 1;
                let start = self.pos;
                let mut target = self.parse_primary()?;
                if !target.mark_store() {
                    return Err(self.error_at(start));
                }
                Ok(Self::step_expr(increment, target, true, line))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        if self.check(&Token::Inc) || self.check(&Token::Dec) {
            let increment = self.check(&Token::Inc);
            if !expr.mark_store() {
                return Err(self.error_here());
            }
            self.pos += 1;
            let line = expr.line;
            expr = Self::step_expr(increment, expr, false, line);
        }
        Ok(expr)
    }

    fn step_expr(increment: bool, target: Expr, prefix: bool, line: usize) -> Expr {
        let target = Box::new(target);
        let kind = if increment {
            ExprKind::Increment { target, prefix }
        } else {
            ExprKind::Decrement { target, prefix }
        };
        Expr::new(kind, line)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.pos;
        let Some(spanned) = self.next() else {
            return Err(self.error_here());
        };
        let line = spanned.line;

        let kind = match spanned.token {
            Token::IntLiteral(n) => ExprKind::Integer(n),
            Token::FloatLiteral(x) => ExprKind::Float(x),
            Token::CharLiteral(c) => ExprKind::Char(c),
            Token::StringLiteral(s) => ExprKind::String(s),
            Token::True => ExprKind::Boolean(true),
            Token::False => ExprKind::Boolean(false),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                return Ok(expr);
            }
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_expr_list(&Token::RParen)?;
                    self.expect(Token::RParen)?;
                    ExprKind::FuncCall { name, args }
                } else if self.check(&Token::LBracket) {
                    let mut index = Vec::new();
                    while self.eat(&Token::LBracket) {
                        index.push(self.parse_expr()?);
                        self.expect(Token::RBracket)?;
                    }
                    ExprKind::ArrayLoc {
                        name,
                        index,
                        mode: AccessMode::Load,
                    }
                } else {
                    ExprKind::VarLoc {
                        name,
                        mode: AccessMode::Load,
                    }
                }
            }
            _ => return Err(self.error_at(start)),
        };
        Ok(Expr::new(kind, line))
    }
}
