// AST module - Abstract Syntax Tree node types

use crate::types::Type;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub decls: Vec<Decl>,
}

/// Scalar type names that can appear in a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BaseType {
    Integer,
    Float,
    Boolean,
    Char,
    String,
    Void,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseType::Integer => "integer",
            BaseType::Float => "float",
            BaseType::Boolean => "boolean",
            BaseType::Char => "char",
            BaseType::String => "string",
            BaseType::Void => "void",
        };
        f.write_str(name)
    }
}

/// A declared type. `dims` is empty for scalars; each entry is one
/// `array [ size ]` level, outermost first, with `None` for `array []`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeNode {
    pub base: BaseType,
    pub dims: Vec<Option<Expr>>,
    pub line: usize,
}

impl TypeNode {
    pub fn scalar(base: BaseType, line: usize) -> Self {
        Self {
            base,
            dims: Vec::new(),
            line,
        }
    }

    /// The resolved type this node denotes, ignoring sizes
    pub fn to_type(&self) -> Type {
        Type::array_of(Type::from(self.base), self.dims.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decl {
    Var(VarDecl),
    Array(ArrayDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeNode,
    pub init: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayDecl {
    pub name: String,
    pub elem: BaseType,
    pub dims: Vec<Option<Expr>>,
    pub init: Option<Vec<Expr>>,
    pub line: usize,
}

impl ArrayDecl {
    pub fn to_type(&self) -> Type {
        Type::array_of(Type::from(self.elem), self.dims.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDecl {
    pub name: String,
    pub return_type: TypeNode,
    pub params: Vec<Param>,
    /// `None` for a prototype (`f: function integer ();`)
    pub body: Option<Vec<Stmt>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Param {
    Var {
        name: String,
        ty: BaseType,
        line: usize,
    },
    Array {
        name: String,
        elem: BaseType,
        dims: Vec<Option<Expr>>,
        line: usize,
    },
}

impl Param {
    pub fn name(&self) -> &str {
        match self {
            Param::Var { name, .. } | Param::Array { name, .. } => name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Param::Var { line, .. } | Param::Array { line, .. } => *line,
        }
    }

    pub fn to_type(&self) -> Type {
        match self {
            Param::Var { ty, .. } => Type::from(*ty),
            Param::Array { elem, dims, .. } => Type::array_of(Type::from(*elem), dims.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    Decl(Decl),
    Expr(Expr),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        else_: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
    },
    Return(Option<Expr>),
    Print(Vec<Expr>),
    Block(Vec<Stmt>),
    Break,
    Continue,
}

/// Whether a location is read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    Load,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// An expression node. `ty` is filled in by the checker; literals carry
/// their type from construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    // Literals
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Char(char),
    String(String),

    BinOper {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOper {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Increment {
        target: Box<Expr>,
        prefix: bool,
    },
    Decrement {
        target: Box<Expr>,
        prefix: bool,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    FuncCall {
        name: String,
        args: Vec<Expr>,
    },

    // Locations
    VarLoc {
        name: String,
        mode: AccessMode,
    },
    ArrayLoc {
        name: String,
        index: Vec<Expr>,
        mode: AccessMode,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        let ty = match &kind {
            ExprKind::Integer(_) => Some(Type::Integer),
            ExprKind::Float(_) => Some(Type::Float),
            ExprKind::Boolean(_) => Some(Type::Boolean),
            ExprKind::Char(_) => Some(Type::Char),
            ExprKind::String(_) => Some(Type::String),
            _ => None,
        };
        Self { kind, line, ty }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Integer(_)
                | ExprKind::Float(_)
                | ExprKind::Boolean(_)
                | ExprKind::Char(_)
                | ExprKind::String(_)
        )
    }

    /// Switch a location to store mode; returns false for non-locations
    pub fn mark_store(&mut self) -> bool {
        match &mut self.kind {
            ExprKind::VarLoc { mode, .. } | ExprKind::ArrayLoc { mode, .. } => {
                *mode = AccessMode::Store;
                true
            }
            _ => false,
        }
    }

    /// Short source-like rendering used in diagnostics
    pub fn describe(&self) -> String {
        match &self.kind {
            ExprKind::Integer(n) => n.to_string(),
            ExprKind::Float(x) => format!("{:?}", x),
            ExprKind::Boolean(b) => b.to_string(),
            ExprKind::Char(c) => format!("{:?}", c),
            ExprKind::String(s) => format!("\"{}\"", s),
            ExprKind::BinOper { op, left, right } => {
                format!("{} {} {}", left.describe(), op.symbol(), right.describe())
            }
            ExprKind::UnaryOper { op, operand } => format!("{}{}", op.symbol(), operand.describe()),
            ExprKind::Increment { target, prefix: true } => format!("++{}", target.describe()),
            ExprKind::Increment { target, prefix: false } => format!("{}++", target.describe()),
            ExprKind::Decrement { target, prefix: true } => format!("--{}", target.describe()),
            ExprKind::Decrement { target, prefix: false } => format!("{}--", target.describe()),
            ExprKind::Assignment { target, value } => {
                format!("{} = {}", target.describe(), value.describe())
            }
            ExprKind::FuncCall { name, args } => {
                let args: Vec<String> = args.iter().map(Expr::describe).collect();
                format!("{}({})", name, args.join(", "))
            }
            ExprKind::VarLoc { name, .. } => name.clone(),
            ExprKind::ArrayLoc { name, index, .. } => {
                let mut out = name.clone();
                for idx in index {
                    out.push_str(&format!("[{}]", idx.describe()));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_self_typed() {
        assert_eq!(Expr::new(ExprKind::Integer(1), 1).ty, Some(Type::Integer));
        assert_eq!(Expr::new(ExprKind::Char('a'), 1).ty, Some(Type::Char));
        assert_eq!(
            Expr::new(ExprKind::String("s".to_string()), 1).ty,
            Some(Type::String)
        );
    }

    #[test]
    fn test_non_literals_start_untyped() {
        let load = Expr::new(
            ExprKind::VarLoc {
                name: "x".to_string(),
                mode: AccessMode::Load,
            },
            3,
        );
        assert_eq!(load.ty, None);
        assert_eq!(load.line, 3);
    }

    #[test]
    fn test_mark_store_only_on_locations() {
        let mut loc = Expr::new(
            ExprKind::ArrayLoc {
                name: "a".to_string(),
                index: vec![Expr::new(ExprKind::Integer(0), 1)],
                mode: AccessMode::Load,
            },
            1,
        );
        assert!(loc.mark_store());
        assert!(matches!(
            loc.kind,
            ExprKind::ArrayLoc {
                mode: AccessMode::Store,
                ..
            }
        ));

        let mut lit = Expr::new(ExprKind::Integer(1), 1);
        assert!(!lit.mark_store());
    }

    #[test]
    fn test_describe_call() {
        let call = Expr::new(
            ExprKind::FuncCall {
                name: "f".to_string(),
                args: vec![
                    Expr::new(ExprKind::Integer(1), 1),
                    Expr::new(ExprKind::Boolean(true), 1),
                ],
            },
            1,
        );
        assert_eq!(call.describe(), "f(1, true)");
    }
}
