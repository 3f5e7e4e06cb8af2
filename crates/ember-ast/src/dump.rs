// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Indented text rendering of a tree, for `ember dump` and tests.

use std::fmt::Write;

use crate::{NodeId, NodeKind, SlotId, Tree};

impl Tree {
    /// Render the subtree under `id`, one node per line.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, id, 0);
        out
    }

    fn dump_into(&self, out: &mut String, id: NodeId, depth: usize) {
        let _ = write!(out, "{:indent$}{}", "", self.kind(id).name(), indent = depth * 2);
        match self.kind(id) {
            NodeKind::Module { scope, .. } => {
                let _ = write!(out, " {}", self.scope(*scope).label);
            }
            NodeKind::Function { name, params, .. } | NodeKind::Generator { name, params, .. } => {
                let params: Vec<String> = params.iter().map(|p| self.slot_label(*p)).collect();
                let _ = write!(out, " {}({})", name, params.join(", "));
            }
            NodeKind::For { target, .. } => {
                let _ = write!(out, " {}", self.slot_label(*target));
            }
            NodeKind::Int(v) => {
                let _ = write!(out, " {}", v);
            }
            NodeKind::Float(v) => {
                let _ = write!(out, " {}", v);
            }
            NodeKind::Str(s) => {
                let _ = write!(out, " {:?}", s);
            }
            NodeKind::Bool(b) => {
                let _ = write!(out, " {}", if *b { "True" } else { "False" });
            }
            NodeKind::ReadLocal { slot } | NodeKind::WriteLocal { slot, .. } => {
                let _ = write!(out, " {}", self.slot_label(*slot));
            }
            NodeKind::ReadLevel { slot, level } => {
                let _ = write!(out, " {} level={}", self.slot_label(*slot), level);
            }
            NodeKind::ReadGlobal { name } => {
                let _ = write!(out, " {}", name);
            }
            NodeKind::Binary { op, .. } => {
                let _ = write!(out, " {}", op.symbol());
            }
            NodeKind::GeneratorExpression { optimized, .. } if *optimized => {
                out.push_str(" optimized");
            }
            NodeKind::Comprehension { kind, slot, .. }
            | NodeKind::ComprehensionAppend { kind, slot, .. } => {
                let _ = write!(out, " {} {}", kind.builtin_name(), self.slot_label(*slot));
            }
            _ => {}
        }
        out.push('\n');

        for child in self.kind(id).children() {
            self.dump_into(out, child, depth + 1);
        }
    }

    fn slot_label(&self, slot: SlotId) -> String {
        let name = self.scope(slot.scope).name_of(slot).unwrap_or("?");
        format!("{}@{}", name, slot)
    }
}
