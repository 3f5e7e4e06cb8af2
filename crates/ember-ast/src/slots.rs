// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-scope slot tables.
//!
//! A slot is one storage location in a scope's activation frame. Read and
//! write nodes bind to a [`SlotId`], never to a name, so two tables can each
//! hold an `x` without interfering. Tables are append-only: a slot, once
//! created, keeps its index for the life of the tree.

use indexmap::IndexSet;

use crate::ScopeId;

/// Implicit slot every function and generator scope reserves at index 0.
/// `return` stores into it; the function root reads it back.
pub const RETURN_VALUE_SLOT: &str = "<return_value>";

/// Identity of a slot: the owning table plus its position in that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    pub scope: ScopeId,
    pub index: u32,
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}.{}", self.scope.0, self.index)
    }
}

/// Name → slot mapping for one lexical scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    scope: ScopeId,
    /// Human-readable owner, e.g. `<module>`, a function name or `<genexpr>`.
    pub label: String,
    names: IndexSet<String>,
}

impl SlotTable {
    pub fn new(scope: ScopeId, label: impl Into<String>) -> Self {
        Self { scope, label: label.into(), names: IndexSet::new() }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn find(&self, name: &str) -> Option<SlotId> {
        self.names.get_index_of(name).map(|i| self.slot_at(i))
    }

    pub fn find_or_add(&mut self, name: &str) -> SlotId {
        if let Some(slot) = self.find(name) {
            return slot;
        }
        let (index, _) = self.names.insert_full(name.to_string());
        self.slot_at(index)
    }

    /// Add a slot that must not exist yet. Returns `None` on a duplicate name.
    pub fn add_fresh(&mut self, name: &str) -> Option<SlotId> {
        let (index, inserted) = self.names.insert_full(name.to_string());
        inserted.then(|| self.slot_at(index))
    }

    /// Name of a slot owned by this table.
    pub fn name_of(&self, slot: SlotId) -> Option<&str> {
        if slot.scope != self.scope {
            return None;
        }
        self.names.get_index(slot.index as usize).map(String::as_str)
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        slot.scope == self.scope && (slot.index as usize) < self.names.len()
    }

    /// Slots in creation order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, SlotId)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), self.slot_at(i)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn slot_at(&self, index: usize) -> SlotId {
        SlotId { scope: self.scope, index: index as u32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_or_add_is_stable() {
        let mut table = SlotTable::new(ScopeId(3), "f");
        let x = table.find_or_add("x");
        let y = table.find_or_add("y");
        assert_eq!(table.find_or_add("x"), x);
        assert_eq!(x, SlotId { scope: ScopeId(3), index: 0 });
        assert_eq!(y.index, 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn add_fresh_rejects_duplicates() {
        let mut table = SlotTable::new(ScopeId(0), "<module>");
        assert!(table.add_fresh("acc").is_some());
        assert!(table.add_fresh("acc").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn same_name_in_two_tables_is_two_slots() {
        let mut a = SlotTable::new(ScopeId(0), "a");
        let mut b = SlotTable::new(ScopeId(1), "b");
        let xa = a.find_or_add("x");
        let xb = b.find_or_add("x");
        assert_ne!(xa, xb);
        assert_eq!(a.name_of(xb), None);
        assert_eq!(b.name_of(xb), Some("x"));
        assert!(!a.contains(xb));
    }

    #[test]
    fn slots_iterate_in_creation_order() {
        let mut table = SlotTable::new(ScopeId(0), "g");
        table.find_or_add("<return_value>");
        table.find_or_add("x");
        table.find_or_add("y");
        let names: Vec<&str> = table.slots().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["<return_value>", "x", "y"]);
    }
}
