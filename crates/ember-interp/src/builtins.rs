// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builtin functions.

use indexmap::IndexMap;

use ember_intrinsify::registry;

use crate::interp::{Interpreter, RuntimeError};
use crate::value::{range_len, Builtin, Value};

/// The builtin namespace, consulted after the module scope.
pub(crate) fn namespace() -> IndexMap<String, Value> {
    let mut names: IndexMap<String, Value> = [Builtin::Print, Builtin::Range, Builtin::Len, Builtin::Abs, Builtin::Str]
        .into_iter()
        .map(|b| (b.name().to_string(), Value::Builtin(b)))
        .collect();
    for descriptor in registry::descriptors() {
        names.insert(descriptor.name.to_string(), Value::Builtin(Builtin::Reduce(descriptor.kind)));
    }
    names
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::ArityMismatch { name: name.to_string(), expected, got: args.len() })
    }
}

fn int_arg(name: &str, v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(RuntimeError::TypeError(format!(
            "{}() expects an integer, got {}",
            name,
            other.type_name()
        ))),
    }
}

impl Interpreter {
    pub(crate) fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let name = builtin.name();
        match builtin {
            Builtin::Print => {
                let line = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
                self.write_output(&line);
                self.write_output_ln();
                Ok(Value::None)
            }
            Builtin::Range => {
                let (start, stop, step) = match args.as_slice() {
                    [stop] => (0, int_arg(name, stop)?, 1),
                    [start, stop] => (int_arg(name, start)?, int_arg(name, stop)?, 1),
                    [start, stop, step] => (int_arg(name, start)?, int_arg(name, stop)?, int_arg(name, step)?),
                    _ => {
                        return Err(RuntimeError::TypeError(format!(
                            "range() expects 1 to 3 arguments, got {}",
                            args.len()
                        )))
                    }
                };
                if step == 0 {
                    return Err(RuntimeError::ValueError("range() arg 3 must not be zero".into()));
                }
                Ok(Value::Range { start, stop, step })
            }
            Builtin::Len => {
                expect_args(name, &args, 1)?;
                let len = match &args[0] {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.borrow().len(),
                    Value::Tuple(items) => items.len(),
                    Value::Range { start, stop, step } => range_len(*start, *stop, *step),
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "object of type '{}' has no len()",
                            other.type_name()
                        )))
                    }
                };
                i64::try_from(len).map(Value::Int).map_err(|_| RuntimeError::Overflow)
            }
            Builtin::Abs => {
                expect_args(name, &args, 1)?;
                match &args[0] {
                    Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(RuntimeError::Overflow),
                    Value::Bool(b) => Ok(Value::Int(*b as i64)),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => Err(RuntimeError::TypeError(format!(
                        "bad operand type for abs(): '{}'",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Str => match args.as_slice() {
                [] => Ok(Value::str("")),
                [v] => Ok(Value::str(&v.to_string())),
                _ => Err(RuntimeError::ArityMismatch { name: name.to_string(), expected: 1, got: args.len() }),
            },
            Builtin::Reduce(kind) => match kind {
                // min(a, b, ...) reduces over its arguments.
                ember_ast::AccumulatorKind::Min | ember_ast::AccumulatorKind::Max if args.len() > 1 => {
                    self.fold(kind, Value::tuple(args))
                }
                _ => {
                    expect_args(name, &args, 1)?;
                    let iterable = args.into_iter().next().unwrap_or(Value::None);
                    self.fold(kind, iterable)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_holds_every_registered_builtin() {
        let names = namespace();
        for descriptor in registry::descriptors() {
            assert!(matches!(names.get(descriptor.name), Some(Value::Builtin(Builtin::Reduce(k))) if *k == descriptor.kind));
        }
        assert!(names.contains_key("print"));
        assert!(!names.contains_key("sorted"));
    }

    #[test]
    fn len_of_ranges_at_the_integer_limits() {
        let mut interp = Interpreter::new(ember_ast::Tree::new());
        let full = Value::Range { start: i64::MIN, stop: i64::MAX, step: 1 };
        assert!(matches!(interp.call_builtin(Builtin::Len, vec![full]), Err(RuntimeError::Overflow)));
        let half = Value::Range { start: 0, stop: i64::MAX, step: 1 };
        assert!(matches!(interp.call_builtin(Builtin::Len, vec![half]), Ok(Value::Int(i64::MAX))));
        let two = Value::Range { start: i64::MAX, stop: i64::MIN, step: i64::MIN };
        assert!(matches!(interp.call_builtin(Builtin::Len, vec![two]), Ok(Value::Int(2))));
    }
}
