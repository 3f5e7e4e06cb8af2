// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Function calling.

use std::rc::Rc;

use ember_ast::slots::RETURN_VALUE_SLOT;
use ember_ast::{NodeId, NodeKind};
use ember_intrinsify::eligibility;

use crate::frame::{Frame, FrameRef};
use crate::value::{Closure, Value};

use super::{Interpreter, RuntimeError, MAX_CALL_DEPTH};

impl Interpreter {
    pub(super) fn eval_call(
        &mut self,
        id: NodeId,
        callee: NodeId,
        args: &[NodeId],
        frame: &FrameRef,
    ) -> Result<Value, RuntimeError> {
        if let Some(wrapper) = self.maybe_intrinsify(id) {
            return self.eval(wrapper, frame);
        }
        let callee = self.eval(callee, frame)?;
        let args = self.eval_all(args, frame)?;
        self.call_value(callee, args)
    }

    /// Let the adaptive engine look at a registered-builtin call site.
    /// Returns the node that now stands where the call was.
    fn maybe_intrinsify(&mut self, call: NodeId) -> Option<NodeId> {
        let engine = self.engine.as_mut()?;
        eligibility::builtin_name(&self.tree, call)?;
        engine.on_call(&mut self.tree, call)
    }

    pub(crate) fn call_value(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(closure) => self.call_function(&closure, args),
            Value::Builtin(builtin) => self.call_builtin(builtin, args),
            other => Err(RuntimeError::TypeError(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let (scope, params, body, is_generator) = match self.tree.kind(closure.root) {
            NodeKind::Function { scope, params, body, .. } => (*scope, params.clone(), *body, false),
            NodeKind::Generator { scope, params, body, .. } => (*scope, params.clone(), *body, true),
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "'{}' is bound to a {} node",
                    closure.name,
                    other.name()
                )))
            }
        };
        if args.len() != params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: closure.name.clone(),
                expected: params.len(),
                got: args.len(),
            });
        }

        let frame = Frame::new(scope, self.tree.scope(scope).len(), Some(Rc::clone(&closure.parent)));
        for (slot, arg) in params.iter().zip(args) {
            frame.borrow_mut().set(*slot, arg);
        }
        if is_generator {
            return Ok(self.new_generator(closure.root, closure.name.clone(), frame));
        }

        self.enter_call()?;
        let result = self.eval(body, &frame);
        self.exit_call();

        match result {
            Ok(_) | Err(RuntimeError::Return) => {
                let ret = self.tree.scope(scope).find(RETURN_VALUE_SLOT);
                Ok(ret.and_then(|slot| frame.borrow().get(slot)).unwrap_or(Value::None))
            }
            Err(e) => Err(e),
        }
    }

    pub(super) fn enter_call(&mut self) -> Result<(), RuntimeError> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded(MAX_CALL_DEPTH));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(super) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}
