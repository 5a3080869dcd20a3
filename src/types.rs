// Checker-side type model and operator typing rules

use crate::ast::{BaseType, BinOp, UnaryOp};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    Char,
    String,
    Void,
    Nil,
    /// Accepted by builtin parameters only
    Any,
    /// A string or an array of any element type, for `len`
    Sized,
    Array(Box<Type>),
    Function(Box<Signature>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signature {
    pub ret: Type,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Params {
    Fixed(Vec<Type>),
    Variadic,
}

impl From<BaseType> for Type {
    fn from(base: BaseType) -> Self {
        match base {
            BaseType::Integer => Type::Integer,
            BaseType::Float => Type::Float,
            BaseType::Boolean => Type::Boolean,
            BaseType::Char => Type::Char,
            BaseType::String => Type::String,
            BaseType::Void => Type::Void,
        }
    }
}

impl Type {
    /// Wrap `elem` in `rank` array levels
    pub fn array_of(elem: Type, rank: usize) -> Type {
        (0..rank).fold(elem, |ty, _| Type::Array(Box::new(ty)))
    }

    pub fn function(ret: Type, params: Vec<Type>) -> Type {
        Type::Function(Box::new(Signature {
            ret,
            params: Params::Fixed(params),
        }))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    pub fn rank(&self) -> usize {
        match self {
            Type::Array(inner) => 1 + inner.rank(),
            _ => 0,
        }
    }

    /// Element type after applying `count` index operations
    pub fn index(&self, count: usize) -> Option<&Type> {
        (0..count).try_fold(self, |ty, _| match ty {
            Type::Array(inner) => Some(inner.as_ref()),
            _ => None,
        })
    }

    /// Whether a value of type `self` may be stored where `expected` is declared
    pub fn accepts(&self, expected: &Type) -> bool {
        match (self, expected) {
            (_, Type::Any) | (Type::Any, _) => true,
            (Type::String | Type::Array(_), Type::Sized) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => f.write_str("integer"),
            Type::Float => f.write_str("float"),
            Type::Boolean => f.write_str("boolean"),
            Type::Char => f.write_str("char"),
            Type::String => f.write_str("string"),
            Type::Void => f.write_str("void"),
            Type::Nil => f.write_str("nil"),
            Type::Any => f.write_str("any"),
            Type::Sized => f.write_str("string or array"),
            Type::Array(inner) => write!(f, "array [] {}", inner),
            Type::Function(sig) => {
                write!(f, "function {} (", sig.ret)?;
                match &sig.params {
                    Params::Fixed(params) => {
                        for (i, p) in params.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", p)?;
                        }
                    }
                    Params::Variadic => f.write_str("...")?,
                }
                f.write_str(")")
            }
        }
    }
}

/// Result type of a binary operator, or `None` when the operands do not combine
pub fn check_binop(op: BinOp, left: &Type, right: &Type) -> Option<Type> {
    use Type::*;

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => match (left, right) {
            (Integer, Integer) => Some(Integer),
            (Float, Float) | (Integer, Float) | (Float, Integer) => Some(Float),
            (String, String) if op == BinOp::Add => Some(String),
            _ => None,
        },
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            (left.is_numeric() && right.is_numeric()).then_some(Boolean)
        }
        BinOp::Eq | BinOp::Ne => {
            let comparable = (left.is_numeric() && right.is_numeric())
                || (left == right && !matches!(left, Void | Function(_)));
            comparable.then_some(Boolean)
        }
        BinOp::And | BinOp::Or => (*left == Boolean && *right == Boolean).then_some(Boolean),
    }
}

/// Result type of a unary operator
pub fn check_unaryop(op: UnaryOp, operand: &Type) -> Option<Type> {
    match op {
        UnaryOp::Neg => operand.is_numeric().then(|| operand.clone()),
        UnaryOp::Not => (*operand == Type::Boolean).then_some(Type::Boolean),
    }
}
