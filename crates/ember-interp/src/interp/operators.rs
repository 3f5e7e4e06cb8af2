// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Arithmetic and comparison on values.

use std::cmp::Ordering;

use ember_ast::{BinOp, UnaryOp};

use crate::value::Value;

use super::RuntimeError;

enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Value) -> Option<Num> {
    match v {
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Bool(b) => Some(Num::Int(*b as i64)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn unsupported(op: &str, l: &Value, r: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        l.type_name(),
        r.type_name()
    ))
}

fn overflow() -> RuntimeError {
    RuntimeError::Overflow
}

/// Arithmetic on two numbers: `int_op` when both are ints, `float_op`
/// otherwise.
fn numeric(
    op: BinOp,
    l: &Value,
    r: &Value,
    int_op: impl Fn(i64, i64) -> Result<Value, RuntimeError>,
    float_op: impl Fn(f64, f64) -> Result<Value, RuntimeError>,
) -> Result<Value, RuntimeError> {
    match (as_num(l), as_num(r)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => int_op(a, b),
        (Some(a), Some(b)) => float_op(to_f64(a), to_f64(b)),
        _ => Err(unsupported(op.symbol(), l, r)),
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

pub(crate) fn add(l: &Value, r: &Value) -> Result<Value, RuntimeError> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(&format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => numeric(
            BinOp::Add,
            l,
            r,
            |a, b| a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            |a, b| Ok(Value::Float(a + b)),
        ),
    }
}

/// Evaluate a non-short-circuit binary operator.
pub(crate) fn binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => add(l, r),
        BinOp::Sub => numeric(
            op,
            l,
            r,
            |a, b| a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            |a, b| Ok(Value::Float(a - b)),
        ),
        BinOp::Mul => match (l, r) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::str(&s.repeat((*n).max(0) as usize)))
            }
            _ => numeric(
                op,
                l,
                r,
                |a, b| a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
                |a, b| Ok(Value::Float(a * b)),
            ),
        },
        BinOp::Div => numeric(
            op,
            l,
            r,
            |a, b| if b == 0 { Err(RuntimeError::DivisionByZero) } else { Ok(Value::Float(a as f64 / b as f64)) },
            |a, b| if b == 0.0 { Err(RuntimeError::DivisionByZero) } else { Ok(Value::Float(a / b)) },
        ),
        BinOp::FloorDiv => numeric(
            op,
            l,
            r,
            |a, b| {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let q = a.checked_div(b).ok_or_else(overflow)?;
                let q = if (a % b != 0) && ((a < 0) != (b < 0)) { q - 1 } else { q };
                Ok(Value::Int(q))
            },
            |a, b| if b == 0.0 { Err(RuntimeError::DivisionByZero) } else { Ok(Value::Float((a / b).floor())) },
        ),
        BinOp::Mod => numeric(
            op,
            l,
            r,
            |a, b| {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let m = a.checked_rem(b).ok_or_else(overflow)?;
                Ok(Value::Int(if m != 0 && ((m < 0) != (b < 0)) { m + b } else { m }))
            },
            |a, b| {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let m = a % b;
                Ok(Value::Float(if m != 0.0 && ((m < 0.0) != (b < 0.0)) { m + b } else { m }))
            },
        ),
        BinOp::Eq => Ok(Value::Bool(equals(l, r))),
        BinOp::Ne => Ok(Value::Bool(!equals(l, r))),
        BinOp::Lt => Ok(Value::Bool(compare_op(op, l, r)? == Ordering::Less)),
        BinOp::Le => Ok(Value::Bool(compare_op(op, l, r)? != Ordering::Greater)),
        BinOp::Gt => Ok(Value::Bool(compare_op(op, l, r)? == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(compare_op(op, l, r)? != Ordering::Less)),
        BinOp::And | BinOp::Or => Err(RuntimeError::TypeError(format!(
            "'{}' is evaluated lazily and has no eager form",
            op.symbol()
        ))),
    }
}

pub(crate) fn unary(op: UnaryOp, v: &Value) -> Result<Value, RuntimeError> {
    match (op, v) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-(*b as i64))),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(RuntimeError::TypeError(format!(
            "bad operand type for unary -: '{}'",
            other.type_name()
        ))),
    }
}

pub(crate) fn equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::None, Value::None) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        (
            Value::Range { start: a, stop: b, step: c },
            Value::Range { start: x, stop: y, step: z },
        ) => (a, b, c) == (x, y, z),
        (Value::Function(a), Value::Function(b)) => std::rc::Rc::ptr_eq(a, b),
        (Value::Generator(a), Value::Generator(b)) => std::rc::Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => match (as_num(l), as_num(r)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => to_f64(a) == to_f64(b),
            _ => false,
        },
    }
}

/// Total order used by `<` and friends and by `min`/`max`.
pub(crate) fn compare(l: &Value, r: &Value) -> Result<Ordering, RuntimeError> {
    compare_op(BinOp::Lt, l, r)
}

fn compare_op(op: BinOp, l: &Value, r: &Value) -> Result<Ordering, RuntimeError> {
    let not_supported = || {
        RuntimeError::TypeError(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            l.type_name(),
            r.type_name()
        ))
    };
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => compare_seq(op, &a.borrow(), &b.borrow()),
        (Value::Tuple(a), Value::Tuple(b)) => compare_seq(op, a, b),
        _ => match (as_num(l), as_num(r)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
            (Some(a), Some(b)) => to_f64(a).partial_cmp(&to_f64(b)).ok_or_else(not_supported),
            _ => Err(not_supported()),
        },
    }
}

fn compare_seq(op: BinOp, a: &[Value], b: &[Value]) -> Result<Ordering, RuntimeError> {
    for (x, y) in a.iter().zip(b.iter()) {
        if !equals(x, y) {
            return compare_op(op, x, y);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_and_modulo_round_toward_negative_infinity() {
        let div = |a, b| binary(BinOp::FloorDiv, &Value::Int(a), &Value::Int(b)).unwrap().to_string();
        let rem = |a, b| binary(BinOp::Mod, &Value::Int(a), &Value::Int(b)).unwrap().to_string();
        assert_eq!(div(7, 2), "3");
        assert_eq!(div(-7, 2), "-4");
        assert_eq!(rem(-7, 2), "1");
        assert_eq!(rem(7, -2), "-1");
    }

    #[test]
    fn division_by_zero() {
        let err = binary(BinOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero));
    }

    #[test]
    fn mixed_comparisons() {
        assert!(equals(&Value::Int(1), &Value::Float(1.0)));
        assert!(equals(&Value::Bool(true), &Value::Int(1)));
        assert_eq!(compare(&Value::str("a"), &Value::str("b")).unwrap(), Ordering::Less);
        let err = compare(&Value::str("a"), &Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "'<' not supported between instances of 'str' and 'int'");
    }

    #[test]
    fn string_and_list_concatenation() {
        assert_eq!(add(&Value::str("ab"), &Value::str("c")).unwrap().to_string(), "abc");
        let joined = add(&Value::list(vec![Value::Int(1)]), &Value::list(vec![Value::Int(2)])).unwrap();
        assert_eq!(joined.to_string(), "[1, 2]");
        assert!(add(&Value::str("a"), &Value::Int(1)).is_err());
    }
}
