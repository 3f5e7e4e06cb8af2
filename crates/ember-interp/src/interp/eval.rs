// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node evaluation.

use std::rc::Rc;

use ember_ast::{BinOp, NodeId, NodeKind};

use crate::frame::{Frame, FrameRef};
use crate::value::{Closure, GeneratorObject, Value};

use super::{operators, Interpreter, RuntimeError};

impl Interpreter {
    /// Evaluate any node. Statements produce `None`.
    pub(crate) fn eval(&mut self, id: NodeId, frame: &FrameRef) -> Result<Value, RuntimeError> {
        let result = self.eval_kind(id, frame);
        if let Err(e) = &result {
            let span = self.tree.span(id);
            // Synthesized nodes carry no span; the nearest real ancestor reports.
            if self.error_span.is_none() && !e.is_control() && !span.is_dummy() {
                self.error_span = Some(span);
            }
        }
        result
    }

    fn eval_kind(&mut self, id: NodeId, frame: &FrameRef) -> Result<Value, RuntimeError> {
        let kind = self.tree.kind(id).clone();
        match kind {
            NodeKind::Module { .. } | NodeKind::Function { .. } | NodeKind::Generator { .. } => {
                Err(RuntimeError::TypeError(format!("{} root cannot be evaluated in place", kind.name())))
            }

            // Statements
            NodeKind::Block(stmts) => self.exec_block(&stmts, frame),
            NodeKind::If { cond, then_branch, else_branch } => {
                self.exec_if(cond, then_branch, else_branch, frame)
            }
            NodeKind::While { cond, body } => self.exec_while(cond, body, frame),
            NodeKind::For { target, iter, body } => self.exec_for(target, iter, body, frame),
            NodeKind::Break => Err(RuntimeError::Break),
            NodeKind::Continue => Err(RuntimeError::Continue),
            NodeKind::Return(value) => {
                if let Some(value) = value {
                    self.eval(value, frame)?;
                }
                Err(RuntimeError::Return)
            }

            // Literals
            NodeKind::Int(n) => Ok(Value::Int(n)),
            NodeKind::Float(f) => Ok(Value::Float(f)),
            NodeKind::Str(s) => Ok(Value::str(&s)),
            NodeKind::Bool(b) => Ok(Value::Bool(b)),
            NodeKind::NoneLit => Ok(Value::None),
            NodeKind::ListLit(items) => Ok(Value::list(self.eval_all(&items, frame)?)),
            NodeKind::TupleLit(items) => Ok(Value::tuple(self.eval_all(&items, frame)?)),

            // Variables
            NodeKind::ReadLocal { slot } => self.read_slot(frame, slot),
            NodeKind::ReadLevel { slot, level } => {
                let target = Frame::ancestor(frame, level).ok_or_else(|| {
                    RuntimeError::TypeError(format!("no frame {} levels up for '{}'", level, self.slot_name(slot)))
                })?;
                self.read_slot(&target, slot)
            }
            NodeKind::ReadGlobal { name } => self.read_global(&name),
            NodeKind::WriteLocal { slot, rhs } => {
                let value = self.eval(rhs, frame)?;
                frame.borrow_mut().set(slot, value.clone());
                Ok(value)
            }

            // Expressions
            NodeKind::Binary { op: BinOp::And, left, right } => {
                let l = self.eval(left, frame)?;
                if l.is_truthy() { self.eval(right, frame) } else { Ok(l) }
            }
            NodeKind::Binary { op: BinOp::Or, left, right } => {
                let l = self.eval(left, frame)?;
                if l.is_truthy() { Ok(l) } else { self.eval(right, frame) }
            }
            NodeKind::Binary { op, left, right } => {
                let l = self.eval(left, frame)?;
                let r = self.eval(right, frame)?;
                operators::binary(op, &l, &r)
            }
            NodeKind::Unary { op, operand } => {
                let v = self.eval(operand, frame)?;
                operators::unary(op, &v)
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                index_value(&object, &index)
            }
            NodeKind::Call { callee, args } => self.eval_call(id, callee, &args, frame),

            NodeKind::FunctionDef { root } => {
                let name = match self.tree.kind(root) {
                    NodeKind::Function { name, .. } | NodeKind::Generator { name, .. } => name.clone(),
                    other => other.name().to_string(),
                };
                Ok(Value::Function(Rc::new(Closure { root, name, parent: Rc::clone(frame) })))
            }
            NodeKind::Yield { value } => self.exec_yield(value, frame),
            NodeKind::GeneratorExpression { root, .. } => {
                let NodeKind::Generator { name, scope, .. } = self.tree.kind(root) else {
                    return Err(RuntimeError::TypeError("generator expression without a generator body".into()));
                };
                let gen_frame = Frame::new(*scope, self.tree.scope(*scope).len(), Some(Rc::clone(frame)));
                Ok(Value::Generator(Rc::new(GeneratorObject::new(root, name.clone(), gen_frame))))
            }
            NodeKind::Comprehension { kind, slot, body } => self.eval_comprehension(kind, slot, body, frame),
            NodeKind::ComprehensionAppend { kind, slot, value } => self.eval_append(kind, slot, value, frame),
        }
    }

    pub(super) fn eval_all(&mut self, ids: &[NodeId], frame: &FrameRef) -> Result<Vec<Value>, RuntimeError> {
        ids.iter().map(|id| self.eval(*id, frame)).collect()
    }
}

fn normalize_index(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let Value::Int(i) = *index else {
        return Err(RuntimeError::TypeError(format!("indices must be integers, not {}", index.type_name())));
    };
    let adjusted = if i < 0 { i128::from(i) + len as i128 } else { i128::from(i) };
    if adjusted < 0 || adjusted >= len as i128 {
        return Err(RuntimeError::IndexOutOfBounds { index: i, len });
    }
    Ok(adjusted as usize)
}

fn index_value(object: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            Ok(items[normalize_index(index, items.len())?].clone())
        }
        Value::Tuple(items) => Ok(items[normalize_index(index, items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let c = chars[normalize_index(index, chars.len())?];
            Ok(Value::str(&c.to_string()))
        }
        Value::Range { start, stop, step } => {
            let len = crate::value::range_len(*start, *stop, *step);
            let offset = normalize_index(index, len)? as i128;
            i64::try_from(i128::from(*start) + i128::from(*step) * offset)
                .map(Value::Int)
                .map_err(|_| RuntimeError::Overflow)
        }
        other => Err(RuntimeError::TypeError(format!("'{}' object is not subscriptable", other.type_name()))),
    }
}
