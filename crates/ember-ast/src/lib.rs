// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Executable tree types for the Ember language.
//!
//! The parser builds this tree directly; the interpreter walks it and the
//! intrinsifier rewrites it in place. Nodes live in an arena owned by
//! [`Tree`] and refer to each other by [`NodeId`].

pub mod span;
pub mod token;
pub mod slots;
pub mod node;
pub mod tree;
mod dump;

pub use span::{LineMap, Span};
pub use slots::{SlotId, SlotTable};
pub use node::{AccumulatorKind, BinOp, Node, NodeKind, NodeRole, UnaryOp};
pub use tree::{Tree, TreeError};

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a slot table (one per lexical scope) in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
