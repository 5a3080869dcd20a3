// Builtin callables and constants shared by the checker and the interpreter

use crate::error::CallError;
use crate::interpreter::{Interpreter, Value};
use crate::types::{Params, Signature, Type};
use std::fmt;

/// Native entry point: `(interpreter, arguments) -> value`
pub type NativeFn =
    for<'a> fn(&mut Interpreter<'a>, Vec<Value<'a>>) -> Result<Value<'a>, CallError>;

/// Parameter list of a builtin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Fixed(&'static [Type]),
    /// Accepts any number of arguments of any type
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(params) => params.len() == count,
            Arity::Variadic => true,
        }
    }

    /// Declared parameter count; zero for variadics
    pub fn param_count(self) -> usize {
        match self {
            Arity::Fixed(params) => params.len(),
            Arity::Variadic => 0,
        }
    }
}

pub struct Native {
    pub name: &'static str,
    pub arity: Arity,
    pub ret: Type,
    pub call: NativeFn,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Native")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("ret", &self.ret)
            .finish()
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Native {
    /// Checker-side view of this callable
    pub fn signature(&self) -> Signature {
        let params = match self.arity {
            Arity::Fixed(params) => Params::Fixed(params.to_vec()),
            Arity::Variadic => Params::Variadic,
        };
        Signature {
            ret: self.ret.clone(),
            params,
        }
    }
}

const SIZED: &[Type] = &[Type::Sized];

pub const NATIVES: &[Native] = &[
    Native {
        name: "print",
        arity: Arity::Variadic,
        ret: Type::Void,
        call: native_print,
    },
    Native {
        name: "input",
        arity: Arity::Fixed(&[]),
        ret: Type::String,
        call: native_input,
    },
    Native {
        name: "len",
        arity: Arity::Fixed(SIZED),
        ret: Type::Integer,
        call: native_len,
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Bool(bool),
    Nil,
}

impl Constant {
    pub fn ty(self) -> Type {
        match self {
            Constant::Bool(_) => Type::Boolean,
            Constant::Nil => Type::Nil,
        }
    }

    pub fn value<'a>(self) -> Value<'a> {
        match self {
            Constant::Bool(b) => Value::Boolean(b),
            Constant::Nil => Value::Nil,
        }
    }
}

pub const CONSTANTS: &[(&str, Constant)] = &[
    ("true", Constant::Bool(true)),
    ("false", Constant::Bool(false)),
    ("nil", Constant::Nil),
];

fn native_print<'a>(
    interp: &mut Interpreter<'a>,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, CallError> {
    for arg in &args {
        interp
            .write_output(&arg.to_string())
            .map_err(|e| CallError(e.to_string()))?;
    }
    Ok(Value::Nil)
}

fn native_input<'a>(
    interp: &mut Interpreter<'a>,
    _args: Vec<Value<'a>>,
) -> Result<Value<'a>, CallError> {
    interp
        .read_line()
        .map(Value::String)
        .map_err(|e| CallError(e.to_string()))
}

fn native_len<'a>(
    _interp: &mut Interpreter<'a>,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, CallError> {
    let count = match args.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.borrow().len(),
        _ => {
            return Err(CallError(
                "len() only applies to strings and arrays".to_string(),
            ))
        }
    };
    i64::try_from(count)
        .map(Value::Integer)
        .map_err(|_| CallError("length does not fit in an integer".to_string()))
}
