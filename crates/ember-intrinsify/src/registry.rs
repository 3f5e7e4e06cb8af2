// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Fixed table of intrinsifiable builtins.
//!
//! Populated at compile time and never mutated, so lookups need no locking.

use ember_ast::{AccumulatorKind, NodeId, NodeKind, SlotId, Span, Tree};

/// How one builtin is rewritten.
#[derive(Debug)]
pub struct TransformDescriptor {
    pub name: &'static str,
    pub kind: AccumulatorKind,
}

impl TransformDescriptor {
    /// Node that folds `value` into the accumulator `slot`. Adopts `value`.
    pub fn create_append(&self, tree: &mut Tree, slot: SlotId, value: NodeId) -> NodeId {
        tree.alloc(NodeKind::ComprehensionAppend { kind: self.kind, slot, value }, Span::DUMMY)
    }

    /// Wrapper that initialises `slot`, runs `body` and yields the result.
    /// Adopts `body`.
    pub fn create_comprehension(&self, tree: &mut Tree, slot: SlotId, body: NodeId) -> NodeId {
        tree.alloc(NodeKind::Comprehension { kind: self.kind, slot, body }, Span::DUMMY)
    }
}

static REGISTRY: [TransformDescriptor; 7] = [
    TransformDescriptor { name: "sum", kind: AccumulatorKind::Sum },
    TransformDescriptor { name: "list", kind: AccumulatorKind::List },
    TransformDescriptor { name: "tuple", kind: AccumulatorKind::Tuple },
    TransformDescriptor { name: "any", kind: AccumulatorKind::Any },
    TransformDescriptor { name: "all", kind: AccumulatorKind::All },
    TransformDescriptor { name: "min", kind: AccumulatorKind::Min },
    TransformDescriptor { name: "max", kind: AccumulatorKind::Max },
];

pub fn lookup(name: &str) -> Option<&'static TransformDescriptor> {
    REGISTRY.iter().find(|d| d.name == name)
}

pub fn is_registered(name: &str) -> bool {
    lookup(name).is_some()
}

pub fn descriptors() -> &'static [TransformDescriptor] {
    &REGISTRY
}
