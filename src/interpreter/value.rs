// Runtime values

use crate::ast::{BaseType, FuncDecl};
use crate::scope::ScopeId;
use crate::stdlib::Native;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable array storage. Arrays have reference semantics: passing
/// one to a function lets the callee update the caller's elements.
pub type ArrayRef<'a> = Rc<RefCell<Vec<Value<'a>>>>;

/// A user function together with the frame it was declared in
#[derive(Debug, Clone, Copy)]
pub struct Closure<'a> {
    pub decl: &'a FuncDecl,
    pub env: ScopeId,
}

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Nil,
    Array(ArrayRef<'a>),
    Function(Closure<'a>),
    Native(&'static Native),
}

impl<'a> Value<'a> {
    /// Zero value of a scalar type
    pub fn default_for(base: BaseType) -> Value<'a> {
        match base {
            BaseType::Integer => Value::Integer(0),
            BaseType::Float => Value::Float(0.0),
            BaseType::Boolean => Value::Boolean(false),
            BaseType::Char => Value::Char('\0'),
            BaseType::String => Value::String(String::new()),
            BaseType::Void => Value::Nil,
        }
    }

    /// Nested array with the given sizes, outermost first, filled with zero values
    pub fn new_array(sizes: &[usize], base: BaseType) -> Value<'a> {
        match sizes.split_first() {
            None => Value::default_for(base),
            Some((&len, rest)) => {
                let items = (0..len).map(|_| Value::new_array(rest, base)).collect();
                Value::array(items)
            }
        }
    }

    pub fn array(items: Vec<Value<'a>>) -> Value<'a> {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Copy with fresh storage at every array level
    pub fn deep_copy(&self) -> Value<'a> {
        match self {
            Value::Array(items) => {
                Value::array(items.borrow().iter().map(Value::deep_copy).collect())
            }
            other => other.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Nil => "nil",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Native(_) => "builtin",
        }
    }

    /// Only `false` and `nil` are false
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Nil)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => {
                std::ptr::eq(a.decl, b.decl) && a.env == b.env
            }
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => f.write_str(s),
            Value::Nil => f.write_str("nil"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Function(closure) => write!(f, "<function {}>", closure.decl.name),
            Value::Native(native) => write!(f, "<builtin {}>", native.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(Value::default_for(BaseType::Integer), Value::Integer(0));
        assert_eq!(Value::default_for(BaseType::Float), Value::Float(0.0));
        assert_eq!(Value::default_for(BaseType::Char), Value::Char('\0'));
        assert_eq!(
            Value::default_for(BaseType::String),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_nested_array_shape() {
        let grid = Value::new_array(&[2, 3], BaseType::Boolean);
        match &grid {
            Value::Array(rows) => {
                let rows = rows.borrow();
                assert_eq!(rows.len(), 2);
                assert!(matches!(&rows[1], Value::Array(cols) if cols.borrow().len() == 3));
            }
            other => panic!("Expected array, got {:?}", other),
        }
        assert_eq!(grid.to_string(), "[[false, false, false], [false, false, false]]");
    }

    #[test]
    fn test_deep_copy_detaches_rows() {
        let grid = Value::new_array(&[2, 2], BaseType::Integer);
        let copy = grid.deep_copy();
        if let Value::Array(rows) = &copy {
            if let Value::Array(row) = &rows.borrow()[0] {
                row.borrow_mut()[0] = Value::Integer(7);
            }
        }
        assert_eq!(copy.to_string(), "[[7, 0], [0, 0]]");
        assert_eq!(grid.to_string(), "[[0, 0], [0, 0]]");
    }

    #[test]
    fn test_float_display_keeps_fraction() {
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
    }
}
