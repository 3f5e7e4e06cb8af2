// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use std::rc::Rc;

use ember_ast::{NodeId, SlotId};

use crate::frame::FrameRef;
use crate::value::Value;

use super::{Consumer, Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn exec_block(&mut self, stmts: &[NodeId], frame: &FrameRef) -> Result<Value, RuntimeError> {
        for &stmt in stmts {
            self.eval(stmt, frame)?;
        }
        Ok(Value::None)
    }

    pub(super) fn exec_if(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        frame: &FrameRef,
    ) -> Result<Value, RuntimeError> {
        if self.eval(cond, frame)?.is_truthy() {
            self.eval(then_branch, frame)?;
        } else if let Some(else_branch) = else_branch {
            self.eval(else_branch, frame)?;
        }
        Ok(Value::None)
    }

    pub(super) fn exec_while(&mut self, cond: NodeId, body: NodeId, frame: &FrameRef) -> Result<Value, RuntimeError> {
        while self.eval(cond, frame)?.is_truthy() {
            match self.eval(body, frame) {
                Ok(_) | Err(RuntimeError::Continue) => {}
                Err(RuntimeError::Break) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(Value::None)
    }

    /// `for` hands its body to the iteration driver as a consumer, so lists,
    /// ranges and generators all go through one path.
    pub(super) fn exec_for(
        &mut self,
        target: SlotId,
        iter: NodeId,
        body: NodeId,
        frame: &FrameRef,
    ) -> Result<Value, RuntimeError> {
        let iterable = self.eval(iter, frame)?;
        self.drive(iterable, Consumer::Loop { target, body, frame: Rc::clone(frame) })?;
        Ok(Value::None)
    }
}
