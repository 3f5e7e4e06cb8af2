// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime values.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ember_ast::{AccumulatorKind, NodeId};

use crate::frame::FrameRef;

/// A runtime value in the interpreter.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Mutable, shared list
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Range { start: i64, stop: i64, step: i64 },
    /// A `def` bound to the frame it was defined in
    Function(Rc<Closure>),
    Builtin(Builtin),
    Generator(Rc<GeneratorObject>),
}

/// A function value: its root node plus the defining frame, which
/// `ReadLevel` walks up through.
#[derive(Debug)]
pub struct Closure {
    pub root: NodeId,
    pub name: String,
    pub parent: FrameRef,
}

/// Native functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Range,
    Len,
    Abs,
    Str,
    Reduce(AccumulatorKind),
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Str => "str",
            Builtin::Reduce(kind) => kind.builtin_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Created,
    Running,
    Finished,
}

/// A generator object: a `Generator` root with its prepared frame.
///
/// Generators are one-shot. Iterating a finished generator produces nothing.
#[derive(Debug)]
pub struct GeneratorObject {
    pub root: NodeId,
    pub name: String,
    pub frame: FrameRef,
    pub state: Cell<GeneratorState>,
}

impl GeneratorObject {
    pub fn new(root: NodeId, name: String, frame: FrameRef) -> Self {
        Self { root, name, frame, state: Cell::new(GeneratorState::Created) }
    }
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function",
            Value::Generator(_) => "generator",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
            Value::Function(_) | Value::Builtin(_) | Value::Generator(_) => true,
        }
    }

    /// Quoted form used inside containers.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// Number of items a range produces, saturating at `usize::MAX`.
pub fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && start > stop {
        (start - stop - 1) / -step + 1
    } else {
        0
    };
    usize::try_from(len).unwrap_or(usize::MAX)
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        String::from(if f > 0.0 { "inf" } else { "-inf" })
    } else {
        format!("{}", f)
    }
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "[{}]", join_repr(&items.borrow())),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::Range { start, stop, step: 1 } => write!(f, "range({}, {})", start, stop),
            Value::Range { start, stop, step } => write!(f, "range({}, {}, {})", start, stop, step),
            Value::Function(c) => write!(f, "<function {}>", c.name),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
            Value::Generator(g) => write!(f, "<generator object {}>", g.name),
        }
    }
}
