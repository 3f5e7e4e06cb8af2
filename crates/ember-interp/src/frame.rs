// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Activation frames.
//!
//! One frame per activation of a scope, indexed by slot index. Frames grow
//! on write: intrinsification can append slots to a scope while activations
//! of it are live.

use std::cell::RefCell;
use std::rc::Rc;

use ember_ast::{ScopeId, SlotId};

use crate::value::Value;

pub type FrameRef = Rc<RefCell<Frame>>;

#[derive(Debug)]
pub struct Frame {
    scope: ScopeId,
    slots: Vec<Option<Value>>,
    /// Frame of the lexically enclosing scope.
    parent: Option<FrameRef>,
}

impl Frame {
    pub fn new(scope: ScopeId, size: usize, parent: Option<FrameRef>) -> FrameRef {
        Rc::new(RefCell::new(Self { scope, slots: vec![None; size], parent }))
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn get(&self, slot: SlotId) -> Option<Value> {
        debug_assert_eq!(slot.scope, self.scope, "slot {} read from wrong frame", slot);
        self.slots.get(slot.index as usize).cloned().flatten()
    }

    pub fn set(&mut self, slot: SlotId, value: Value) {
        debug_assert_eq!(slot.scope, self.scope, "slot {} written to wrong frame", slot);
        let index = slot.index as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(value);
    }

    pub fn take(&mut self, slot: SlotId) -> Option<Value> {
        self.slots.get_mut(slot.index as usize).and_then(Option::take)
    }

    pub fn clear(&mut self, slot: SlotId) {
        if let Some(entry) = self.slots.get_mut(slot.index as usize) {
            *entry = None;
        }
    }

    /// The frame `level` links up the lexical chain.
    pub fn ancestor(frame: &FrameRef, level: u32) -> Option<FrameRef> {
        let mut current = Rc::clone(frame);
        for _ in 0..level {
            let parent = current.borrow().parent.clone()?;
            current = parent;
        }
        Some(current)
    }
}
