// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Iteration, generators and the intrinsified comprehension nodes.
//!
//! Generators are push-driven: the driver runs the generator body to
//! completion, and each `yield` feeds its value to the consumer on top of
//! `Interpreter::consumers`. A consumer is either a `for` body or a
//! reduction. While a consumer runs it is popped, so a `yield` inside a
//! consumer's code reaches the consumer of the generator that code belongs
//! to.
//!
//! Signals from a consumer (`return` out of a `for` body, an early stop)
//! cross the generator body wrapped in `Unwind`, so the generator's own
//! loops and its own `return` handling never see them.

use std::rc::Rc;

use ember_ast::{AccumulatorKind, NodeId, NodeKind, SlotId};

use crate::frame::FrameRef;
use crate::reduce::{self, Flow};
use crate::value::{range_len, GeneratorObject, GeneratorState, Value};

use super::{Interpreter, RuntimeError};

/// Receiver of iterated values.
#[derive(Debug)]
pub(crate) enum Consumer {
    /// A `for` body: bind `target` in `frame`, run `body`.
    Loop { target: SlotId, body: NodeId, frame: FrameRef },
    /// A builtin reduction in progress.
    Fold { kind: AccumulatorKind, acc: Option<Value> },
}

impl Interpreter {
    /// Feed every item of `iterable` to `consumer` until it stops or the
    /// items run out. Returns the consumer for its final state.
    pub(crate) fn drive(&mut self, iterable: Value, mut consumer: Consumer) -> Result<Consumer, RuntimeError> {
        match iterable {
            Value::List(items) => {
                // Re-borrow each step: the body may push to the list.
                let mut i = 0;
                loop {
                    let item = match items.borrow().get(i) {
                        Some(item) => item.clone(),
                        None => break,
                    };
                    i += 1;
                    if self.feed(&mut consumer, item)? == Flow::Stop {
                        break;
                    }
                }
            }
            Value::Tuple(items) => {
                for item in items.iter() {
                    if self.feed(&mut consumer, item.clone())? == Flow::Stop {
                        break;
                    }
                }
            }
            Value::Str(s) => {
                for c in s.chars() {
                    if self.feed(&mut consumer, Value::str(&c.to_string()))? == Flow::Stop {
                        break;
                    }
                }
            }
            Value::Range { start, stop, step } => {
                let mut current = start;
                for _ in 0..range_len(start, stop, step) {
                    if self.feed(&mut consumer, Value::Int(current))? == Flow::Stop {
                        break;
                    }
                    current = current.wrapping_add(step);
                }
            }
            Value::Generator(generator) => return self.run_generator(&generator, consumer),
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
        }
        Ok(consumer)
    }

    /// Reduce `iterable` the way the accumulator builtin does.
    pub(crate) fn fold(&mut self, kind: AccumulatorKind, iterable: Value) -> Result<Value, RuntimeError> {
        let consumer = self.drive(iterable, Consumer::Fold { kind, acc: reduce::identity(kind) })?;
        match consumer {
            Consumer::Fold { acc, .. } => reduce::finish(kind, acc),
            Consumer::Loop { .. } => Err(RuntimeError::TypeError("reduction lost its accumulator".into())),
        }
    }

    fn feed(&mut self, consumer: &mut Consumer, item: Value) -> Result<Flow, RuntimeError> {
        match consumer {
            Consumer::Loop { target, body, frame } => {
                frame.borrow_mut().set(*target, item);
                match self.eval(*body, frame) {
                    Ok(_) | Err(RuntimeError::Continue) => Ok(Flow::Continue),
                    Err(RuntimeError::Break) => Ok(Flow::Stop),
                    Err(e) => Err(e),
                }
            }
            Consumer::Fold { kind, acc } => {
                let (next, flow) = reduce::step(*kind, acc.take(), item)?;
                *acc = Some(next);
                Ok(flow)
            }
        }
    }

    fn run_generator(&mut self, generator: &GeneratorObject, consumer: Consumer) -> Result<Consumer, RuntimeError> {
        match generator.state.get() {
            GeneratorState::Finished => return Ok(consumer),
            GeneratorState::Running => return Err(RuntimeError::GeneratorRunning(generator.name.clone())),
            GeneratorState::Created => {}
        }
        let NodeKind::Generator { body, .. } = *self.tree.kind(generator.root) else {
            return Err(RuntimeError::TypeError(format!("'{}' has no generator body", generator.name)));
        };

        generator.state.set(GeneratorState::Running);
        self.consumers.push(consumer);
        let result = self.enter_call().and_then(|()| {
            let result = self.eval(body, &generator.frame);
            self.exit_call();
            result
        });
        generator.state.set(GeneratorState::Finished);
        let consumer = self
            .consumers
            .pop()
            .ok_or_else(|| RuntimeError::TypeError("generator consumer stack underflow".into()))?;

        match result {
            Ok(_) | Err(RuntimeError::Return) | Err(RuntimeError::StopGenerator) => Ok(consumer),
            Err(RuntimeError::Unwind(inner)) => Err(*inner),
            Err(e) => Err(e),
        }
    }

    pub(super) fn exec_yield(&mut self, value: NodeId, frame: &FrameRef) -> Result<Value, RuntimeError> {
        let item = self.eval(value, frame)?;
        let Some(mut consumer) = self.consumers.pop() else {
            return Err(RuntimeError::TypeError("'yield' outside a running generator".into()));
        };
        let flow = self.feed(&mut consumer, item);
        self.consumers.push(consumer);
        match flow {
            Ok(Flow::Continue) => Ok(Value::None),
            Ok(Flow::Stop) => Err(RuntimeError::StopGenerator),
            Err(e) if e.is_control() => Err(RuntimeError::Unwind(Box::new(e))),
            Err(e) => Err(e),
        }
    }

    /// The wrapper an intrinsified call turns into: seed the accumulator,
    /// run the loop, finish.
    pub(super) fn eval_comprehension(
        &mut self,
        kind: AccumulatorKind,
        slot: SlotId,
        body: NodeId,
        frame: &FrameRef,
    ) -> Result<Value, RuntimeError> {
        match reduce::identity(kind) {
            Some(seed) => frame.borrow_mut().set(slot, seed),
            None => frame.borrow_mut().clear(slot),
        }
        match self.eval(body, frame) {
            Ok(_) => {}
            Err(RuntimeError::StopComprehension(stopped)) if stopped == slot => {}
            Err(e) => return Err(e),
        }
        let acc = frame.borrow_mut().take(slot);
        reduce::finish(kind, acc)
    }

    pub(super) fn eval_append(
        &mut self,
        kind: AccumulatorKind,
        slot: SlotId,
        value: NodeId,
        frame: &FrameRef,
    ) -> Result<Value, RuntimeError> {
        let item = self.eval(value, frame)?;
        let acc = frame.borrow_mut().take(slot);
        let (next, flow) = reduce::step(kind, acc, item)?;
        frame.borrow_mut().set(slot, next);
        match flow {
            Flow::Continue => Ok(Value::None),
            Flow::Stop => Err(RuntimeError::StopComprehension(slot)),
        }
    }

    /// A generator object for a call of a generator `def`.
    pub(super) fn new_generator(&self, root: NodeId, name: String, frame: FrameRef) -> Value {
        Value::Generator(Rc::new(GeneratorObject::new(root, name, frame)))
    }
}
