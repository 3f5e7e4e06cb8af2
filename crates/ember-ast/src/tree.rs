// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Arena-backed executable tree.
//!
//! Nodes are appended and never freed. Replacing a node swaps one child id
//! in the parent, so an execution still holding the old id finishes on the
//! old subtree while new executions see the replacement. Build the whole
//! replacement subtree first, then call [`Tree::replace`] once.

use crate::{Node, NodeId, NodeKind, NodeRole, ScopeId, SlotTable, Span};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} is not linked into the tree")]
    Detached(NodeId),

    #[error("node {parent} does not hold {child} in any child slot")]
    ChildNotFound { parent: NodeId, child: NodeId },

    #[error("node {node} has parent {found:?}, but is held by {expected}")]
    BrokenParentLink { node: NodeId, expected: NodeId, found: Option<NodeId> },

    #[error("root node {0} has a parent")]
    RootHasParent(NodeId),
}

/// The executable tree: node arena, slot tables, and the root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    scopes: Vec<SlotTable>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub fn add_scope(&mut self, label: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(SlotTable::new(id, label));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &SlotTable {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut SlotTable {
        &mut self.scopes[id.index()]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Append a node and adopt its children.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node { kind, span, parent: None });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.nodes[root.index()].parent = None;
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Mutable access to a node's kind.
    ///
    /// Child ids must not be changed through this reference; the children's
    /// parent links would go stale. Use [`Tree::replace`] to swap children.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn role(&self, id: NodeId) -> NodeRole {
        self.kind(id).role()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Substitute `new` for `old` in `old`'s parent slot.
    ///
    /// `new` inherits `old`'s span if it has none of its own. `old` is left
    /// in the arena, unlinked.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        match self.parent(old) {
            Some(parent) => {
                let mut found = false;
                for slot in self.nodes[parent.index()].kind.children_mut() {
                    if *slot == old {
                        *slot = new;
                        found = true;
                    }
                }
                if !found {
                    return Err(TreeError::ChildNotFound { parent, child: old });
                }
                self.nodes[new.index()].parent = Some(parent);
            }
            None if self.root == Some(old) => {
                self.root = Some(new);
                self.nodes[new.index()].parent = None;
            }
            None => return Err(TreeError::Detached(old)),
        }

        if self.nodes[new.index()].span.is_dummy() {
            self.nodes[new.index()].span = self.nodes[old.index()].span;
        }
        self.nodes[old.index()].parent = None;
        Ok(())
    }

    /// Copy the subtree under `id` into fresh nodes. The copy is detached.
    /// Slot tables are shared, not copied.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let mut kind = self.kind(id).clone();
        for child in kind.children_mut() {
            *child = self.deep_copy(*child);
        }
        let span = self.span(id);
        self.alloc(kind, span)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// `id` and everything below it, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let children = self.kind(next).children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// First node under `id` (pre-order, inclusive) matching `pred`.
    pub fn find_first(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|n| pred(self.kind(*n)))
    }

    /// Every node under `id` (pre-order, inclusive) matching `pred`.
    pub fn find_all(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.descendants(id).into_iter().filter(|n| pred(self.kind(*n))).collect()
    }

    /// Nearest enclosing scope root of `id` (excluding `id` itself).
    pub fn enclosing_root(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.role(*a) != NodeRole::Other)
    }

    /// Whether `id` is reachable from the root through child slots.
    pub fn is_linked(&self, id: NodeId) -> bool {
        let top = self.ancestors(id).last().unwrap_or(id);
        self.root == Some(top)
    }

    /// Check that every node reachable from the root has the parent that
    /// actually holds it.
    pub fn verify_parent_links(&self) -> Result<(), TreeError> {
        let Some(root) = self.root else { return Ok(()) };
        if self.parent(root).is_some() {
            return Err(TreeError::RootHasParent(root));
        }
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for child in self.kind(node).children() {
                let found = self.parent(child);
                if found != Some(node) {
                    return Err(TreeError::BrokenParentLink { node: child, expected: node, found });
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

/// Iterator over a node's ancestors.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinOp;

    /// module { x = 1 + 2 }
    fn small_tree() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let scope = tree.add_scope("<module>");
        let x = tree.scope_mut(scope).find_or_add("x");
        let one = tree.alloc(NodeKind::Int(1), Span::new(4, 5));
        let two = tree.alloc(NodeKind::Int(2), Span::new(8, 9));
        let add = tree.alloc(NodeKind::Binary { op: BinOp::Add, left: one, right: two }, Span::new(4, 9));
        let write = tree.alloc(NodeKind::WriteLocal { slot: x, rhs: add }, Span::new(0, 9));
        let block = tree.alloc(NodeKind::Block(vec![write]), Span::new(0, 9));
        let module = tree.alloc(NodeKind::Module { scope, body: block }, Span::new(0, 9));
        tree.set_root(module);
        (tree, add, two)
    }

    #[test]
    fn alloc_sets_parent_links() {
        let (tree, add, two) = small_tree();
        assert_eq!(tree.parent(two), Some(add));
        assert!(tree.verify_parent_links().is_ok());
        assert!(tree.is_linked(two));
    }

    #[test]
    fn replace_swaps_slot_and_keeps_span() {
        let (mut tree, add, two) = small_tree();
        let three = tree.alloc(NodeKind::Int(3), Span::DUMMY);
        tree.replace(two, three).unwrap();

        match tree.kind(add) {
            NodeKind::Binary { right, .. } => assert_eq!(*right, three),
            other => panic!("expected Binary, got {:?}", other),
        }
        assert_eq!(tree.span(three), Span::new(8, 9));
        assert_eq!(tree.parent(three), Some(add));
        assert_eq!(tree.parent(two), None);
        assert!(!tree.is_linked(two));
        assert!(tree.verify_parent_links().is_ok());
    }

    #[test]
    fn replace_detached_node_fails() {
        let (mut tree, _, two) = small_tree();
        let three = tree.alloc(NodeKind::Int(3), Span::DUMMY);
        let four = tree.alloc(NodeKind::Int(4), Span::DUMMY);
        tree.replace(two, three).unwrap();
        assert_eq!(tree.replace(two, four), Err(TreeError::Detached(two)));
    }

    #[test]
    fn deep_copy_is_detached_and_independent() {
        let (mut tree, add, _) = small_tree();
        let copy = tree.deep_copy(add);
        assert_ne!(copy, add);
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.descendants(copy).len(), 3);
        assert!(tree.descendants(copy).iter().all(|n| !tree.descendants(add).contains(n)));
        // Copy's children point back at the copy.
        for child in tree.kind(copy).children() {
            assert_eq!(tree.parent(child), Some(copy));
        }
        assert!(tree.verify_parent_links().is_ok());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (tree, add, two) = small_tree();
        let chain: Vec<NodeId> = tree.ancestors(two).collect();
        assert_eq!(chain[0], add);
        assert_eq!(chain.last().copied(), tree.root());
        assert_eq!(tree.enclosing_root(two), tree.root());
    }

    #[test]
    fn verify_detects_broken_link() {
        let (mut tree, add, two) = small_tree();
        let stray = tree.alloc(NodeKind::Int(9), Span::DUMMY);
        // Point the slot at `stray` without going through `replace`.
        if let NodeKind::Binary { right, .. } = tree.kind_mut(add) {
            *right = stray;
        }
        assert_eq!(
            tree.verify_parent_links(),
            Err(TreeError::BrokenParentLink { node: stray, expected: add, found: None })
        );
        let _ = two;
    }
}
