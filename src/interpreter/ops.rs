// Operator semantics on runtime values

use super::value::Value;
use crate::ast::{BinOp, UnaryOp};
use crate::error::RuntimeError;
use std::cmp::Ordering;

enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(op: BinOp, left: &Value, right: &Value, line: usize) -> Result<Numbers, RuntimeError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Numbers::Ints(*a, *b)),
        (Value::Integer(a), Value::Float(b)) => Ok(Numbers::Floats(*a as f64, *b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Numbers::Floats(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Numbers::Floats(*a, *b)),
        _ => Err(RuntimeError::InvalidOperands {
            op: op.symbol(),
            expected: "numbers",
            found: format!("{} and {}", left.type_name(), right.type_name()),
            line,
        }),
    }
}

/// Quotient rounded toward negative infinity
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor
pub fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r + b
    } else {
        r
    }
}

/// Evaluate a non-short-circuit binary operator
pub fn binary<'a>(
    op: BinOp,
    left: Value<'a>,
    right: Value<'a>,
    line: usize,
) -> Result<Value<'a>, RuntimeError> {
    let overflow = || RuntimeError::IntegerOverflow {
        op: op.symbol(),
        line,
    };

    match op {
        BinOp::Add => {
            if let (Value::String(a), Value::String(b)) = (&left, &right) {
                return Ok(Value::String(format!("{}{}", a, b)));
            }
            match numbers(op, &left, &right, line)? {
                Numbers::Ints(a, b) => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
                Numbers::Floats(a, b) => Ok(Value::Float(a + b)),
            }
        }
        BinOp::Sub => match numbers(op, &left, &right, line)? {
            Numbers::Ints(a, b) => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
            Numbers::Floats(a, b) => Ok(Value::Float(a - b)),
        },
        BinOp::Mul => match numbers(op, &left, &right, line)? {
            Numbers::Ints(a, b) => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
            Numbers::Floats(a, b) => Ok(Value::Float(a * b)),
        },
        BinOp::Div => match numbers(op, &left, &right, line)? {
            Numbers::Ints(_, 0) => Err(RuntimeError::DivisionByZero { line }),
            Numbers::Ints(a, b) => floor_div(a, b).map(Value::Integer).ok_or_else(overflow),
            Numbers::Floats(_, b) if b == 0.0 => Err(RuntimeError::DivisionByZero { line }),
            Numbers::Floats(a, b) => Ok(Value::Float(a / b)),
        },
        BinOp::Mod => match numbers(op, &left, &right, line)? {
            Numbers::Ints(_, 0) => Err(RuntimeError::DivisionByZero { line }),
            Numbers::Ints(a, b) => floor_mod(a, b).map(Value::Integer).ok_or_else(overflow),
            Numbers::Floats(_, b) if b == 0.0 => Err(RuntimeError::DivisionByZero { line }),
            Numbers::Floats(a, b) => Ok(Value::Float(float_mod(a, b))),
        },
        BinOp::Eq => Ok(Value::Boolean(equals(&left, &right))),
        BinOp::Ne => Ok(Value::Boolean(!equals(&left, &right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match numbers(op, &left, &right, line)? {
                Numbers::Ints(a, b) => Some(a.cmp(&b)),
                Numbers::Floats(a, b) => a.partial_cmp(&b),
            };
            let result = match (op, ordering) {
                (_, None) => false,
                (BinOp::Lt, Some(o)) => o == Ordering::Less,
                (BinOp::Le, Some(o)) => o != Ordering::Greater,
                (BinOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }
        // Short-circuit forms are handled by the evaluator; this is the
        // strict fallback when both operands are already known.
        BinOp::And => Ok(if left.is_truthy() { right } else { left }),
        BinOp::Or => Ok(if left.is_truthy() { left } else { right }),
    }
}

/// Equality across any pair; integers and floats compare numerically
pub fn equals<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            *a as f64 == *b
        }
        _ => left == right,
    }
}

pub fn unary<'a>(op: UnaryOp, operand: Value<'a>, line: usize) -> Result<Value<'a>, RuntimeError> {
    match op {
        UnaryOp::Neg => match operand {
            Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or(
                RuntimeError::IntegerOverflow {
                    op: op.symbol(),
                    line,
                },
            ),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(RuntimeError::InvalidOperands {
                op: op.symbol(),
                expected: "a number",
                found: other.type_name().to_string(),
                line,
            }),
        },
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
    }
}

/// `++`/`--` step applied to a numeric value
pub fn step<'a>(value: Value<'a>, delta: i64, line: usize) -> Result<Value<'a>, RuntimeError> {
    let op = if delta > 0 { "++" } else { "--" };
    match value {
        Value::Integer(n) => n
            .checked_add(delta)
            .map(Value::Integer)
            .ok_or(RuntimeError::IntegerOverflow { op, line }),
        Value::Float(x) => Ok(Value::Float(x + delta as f64)),
        other => Err(RuntimeError::InvalidOperands {
            op,
            expected: "a number",
            found: other.type_name().to_string(),
            line,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value<'static> {
        Value::Integer(n)
    }

    #[test]
    fn test_integer_division_floors() {
        assert_eq!(binary(BinOp::Div, int(7), int(2), 1).unwrap(), int(3));
        assert_eq!(binary(BinOp::Div, int(-7), int(2), 1).unwrap(), int(-4));
        assert_eq!(binary(BinOp::Div, int(7), int(-2), 1).unwrap(), int(-4));
        assert_eq!(binary(BinOp::Div, int(-8), int(2), 1).unwrap(), int(-4));
    }

    #[test]
    fn test_mixed_division_is_float() {
        assert_eq!(
            binary(BinOp::Div, int(7), Value::Float(2.0), 1).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(binary(BinOp::Mod, int(-7), int(2), 1).unwrap(), int(1));
        assert_eq!(binary(BinOp::Mod, int(7), int(-2), 1).unwrap(), int(-1));
        assert_eq!(binary(BinOp::Mod, int(7), int(2), 1).unwrap(), int(1));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinOp::Div, int(1), int(0), 4),
            Err(RuntimeError::DivisionByZero { line: 4 })
        );
        assert!(binary(BinOp::Mod, Value::Float(1.0), Value::Float(0.0), 4).is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            binary(BinOp::Add, int(i64::MAX), int(1), 2),
            Err(RuntimeError::IntegerOverflow { op: "+", line: 2 })
        ));
        assert!(binary(BinOp::Div, int(i64::MIN), int(-1), 2).is_err());
        assert!(unary(UnaryOp::Neg, int(i64::MIN), 2).is_err());
    }

    #[test]
    fn test_string_concatenation() {
        let joined = binary(
            BinOp::Add,
            Value::String("ab".to_string()),
            Value::String("cd".to_string()),
            1,
        )
        .unwrap();
        assert_eq!(joined, Value::String("abcd".to_string()));
    }

    #[test]
    fn test_invalid_operands() {
        let err = binary(BinOp::Sub, Value::String("a".to_string()), int(1), 9).unwrap_err();
        assert_eq!(
            err.to_string(),
            "in '-', operands must be numbers, got string and integer"
        );
        assert_eq!(err.line(), 9);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            binary(BinOp::Lt, int(1), Value::Float(1.5), 1).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(binary(BinOp::Ge, int(2), int(2), 1).unwrap(), Value::Boolean(true));
        assert_eq!(
            binary(BinOp::Eq, int(2), Value::Float(2.0), 1).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            binary(BinOp::Ne, Value::Char('a'), Value::Char('b'), 1).unwrap(),
            Value::Boolean(true)
        );
        assert!(binary(BinOp::Lt, Value::Boolean(true), int(1), 1).is_err());
    }

    #[test]
    fn test_equals_compares_arrays_by_content() {
        let a = Value::array(vec![int(1), Value::Float(2.0)]);
        let b = Value::array(vec![int(1), Value::Float(2.0)]);
        assert!(equals(&a, &b));
        assert!(equals(&int(3), &Value::Float(3.0)));
        assert!(!equals(&Value::String("1".to_string()), &int(1)));
    }

    #[test]
    fn test_not_uses_truthiness() {
        assert_eq!(unary(UnaryOp::Not, int(0), 1).unwrap(), Value::Boolean(false));
        assert_eq!(unary(UnaryOp::Not, Value::Nil, 1).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_step() {
        assert_eq!(step(int(4), 1, 1).unwrap(), int(5));
        assert_eq!(step(Value::Float(1.5), -1, 1).unwrap(), Value::Float(0.5));
        assert!(step(Value::Boolean(true), 1, 1).is_err());
    }
}
