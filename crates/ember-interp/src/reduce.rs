// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Reductions behind the accumulator builtins.
//!
//! The builtin call path (`sum(gen)`) and the intrinsified path
//! (`Comprehension` + `ComprehensionAppend`) both go through these three
//! functions, so the two agree on results, errors and early exit.

use std::cmp::Ordering;

use ember_ast::AccumulatorKind;

use crate::interp::operators;
use crate::interp::RuntimeError;
use crate::value::Value;

/// Whether a reduction wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Starting accumulator. `None` for `min`/`max`, which have no identity.
pub fn identity(kind: AccumulatorKind) -> Option<Value> {
    match kind {
        AccumulatorKind::Sum => Some(Value::Int(0)),
        AccumulatorKind::List | AccumulatorKind::Tuple => Some(Value::list(Vec::new())),
        AccumulatorKind::Any => Some(Value::Bool(false)),
        AccumulatorKind::All => Some(Value::Bool(true)),
        AccumulatorKind::Min | AccumulatorKind::Max => None,
    }
}

/// Fold one item into the accumulator.
pub fn step(kind: AccumulatorKind, acc: Option<Value>, item: Value) -> Result<(Value, Flow), RuntimeError> {
    match kind {
        AccumulatorKind::Sum => {
            let acc = acc.unwrap_or(Value::Int(0));
            Ok((operators::add(&acc, &item)?, Flow::Continue))
        }
        AccumulatorKind::List | AccumulatorKind::Tuple => match acc {
            Some(Value::List(items)) => {
                items.borrow_mut().push(item);
                Ok((Value::List(items), Flow::Continue))
            }
            None => Ok((Value::list(vec![item]), Flow::Continue)),
            Some(other) => Err(RuntimeError::TypeError(format!(
                "{} accumulator holds {}",
                kind.builtin_name(),
                other.type_name()
            ))),
        },
        AccumulatorKind::Any => {
            if item.is_truthy() {
                Ok((Value::Bool(true), Flow::Stop))
            } else {
                Ok((Value::Bool(false), Flow::Continue))
            }
        }
        AccumulatorKind::All => {
            if item.is_truthy() {
                Ok((Value::Bool(true), Flow::Continue))
            } else {
                Ok((Value::Bool(false), Flow::Stop))
            }
        }
        AccumulatorKind::Min | AccumulatorKind::Max => {
            let Some(best) = acc else { return Ok((item, Flow::Continue)) };
            let wanted = if kind == AccumulatorKind::Min { Ordering::Less } else { Ordering::Greater };
            let next = if operators::compare(&item, &best)? == wanted { item } else { best };
            Ok((next, Flow::Continue))
        }
    }
}

/// Final value of the reduction.
pub fn finish(kind: AccumulatorKind, acc: Option<Value>) -> Result<Value, RuntimeError> {
    match (kind, acc) {
        (AccumulatorKind::Min | AccumulatorKind::Max, None) => Err(RuntimeError::ValueError(format!(
            "{}() arg is an empty sequence",
            kind.builtin_name()
        ))),
        (AccumulatorKind::Tuple, Some(Value::List(items))) => {
            let items = items.borrow().clone();
            Ok(Value::tuple(items))
        }
        (_, Some(value)) => Ok(value),
        (_, None) => identity(kind).ok_or_else(|| {
            RuntimeError::TypeError(format!("{} accumulator is unbound", kind.builtin_name()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(kind: AccumulatorKind, items: Vec<Value>) -> Result<(Value, usize), RuntimeError> {
        let mut acc = identity(kind);
        let mut consumed = 0;
        for item in items {
            consumed += 1;
            let (next, flow) = step(kind, acc.take(), item)?;
            acc = Some(next);
            if flow == Flow::Stop {
                break;
            }
        }
        Ok((finish(kind, acc)?, consumed))
    }

    fn ints(ns: &[i64]) -> Vec<Value> {
        ns.iter().map(|&n| Value::Int(n)).collect()
    }

    #[test]
    fn sum_mixes_ints_and_floats() {
        let (v, _) = fold(AccumulatorKind::Sum, vec![Value::Int(1), Value::Float(0.5)]).unwrap();
        assert_eq!(v.to_string(), "1.5");
        let (v, _) = fold(AccumulatorKind::Sum, vec![]).unwrap();
        assert_eq!(v.to_string(), "0");
    }

    #[test]
    fn any_all_stop_on_deciding_item() {
        let (v, n) = fold(AccumulatorKind::Any, ints(&[0, 0, 3, 4])).unwrap();
        assert_eq!((v.to_string(), n), ("True".to_string(), 3));
        let (v, n) = fold(AccumulatorKind::All, ints(&[1, 0, 2])).unwrap();
        assert_eq!((v.to_string(), n), ("False".to_string(), 2));
        let (v, _) = fold(AccumulatorKind::All, vec![]).unwrap();
        assert_eq!(v.to_string(), "True");
    }

    #[test]
    fn min_max_keep_first_extreme_and_reject_empty() {
        let (v, _) = fold(AccumulatorKind::Max, ints(&[3, 9, 2, 9])).unwrap();
        assert_eq!(v.to_string(), "9");
        let (v, _) = fold(AccumulatorKind::Min, ints(&[3, 9, 2, 9])).unwrap();
        assert_eq!(v.to_string(), "2");
        let err = fold(AccumulatorKind::Min, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "min() arg is an empty sequence");
    }

    #[test]
    fn tuple_finishes_as_tuple() {
        let (v, _) = fold(AccumulatorKind::Tuple, ints(&[1, 2])).unwrap();
        assert_eq!(v.to_string(), "(1, 2)");
        let (v, _) = fold(AccumulatorKind::List, ints(&[1, 2])).unwrap();
        assert_eq!(v.to_string(), "[1, 2]");
    }
}
