// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope-merge rewrite.
//!
//! Turns
//!
//! ```text
//! Call(sum, [GeneratorExpression { Generator { For x in it { Yield(WriteLocal(v, e)) } } }])
//! ```
//!
//! into
//!
//! ```text
//! Comprehension(sum, acc) { For x' in it' { ComprehensionAppend(sum, acc, e') } }
//! ```
//!
//! where primes mark nodes rebound to slots of the enclosing scope. All edits
//! happen on a detached copy of the loop. The linked tree changes in exactly
//! one place: the final swap of the call node for the wrapper.

use std::collections::BTreeMap;

use ember_ast::slots::RETURN_VALUE_SLOT;
use ember_ast::{NodeId, NodeKind, NodeRole, ScopeId, SlotId, Tree};

use crate::registry::TransformDescriptor;
use crate::IntrinsifyError;

/// The parts of a well-formed generator expression.
struct GeneratorShape {
    private: ScopeId,
    enclosing: ScopeId,
    loop_node: NodeId,
}

/// Rewrite `call`, whose sole argument is `genexp`. Returns the wrapper node.
pub(crate) fn rewrite(
    tree: &mut Tree,
    call: NodeId,
    genexp: NodeId,
    descriptor: &TransformDescriptor,
) -> Result<NodeId, IntrinsifyError> {
    let shape = inspect(tree, genexp)?;

    let acc_name = format!("<{}_comp_val{}>", descriptor.name, genexp.0);
    if tree.scope(shape.enclosing).find(&acc_name).is_some() {
        return Err(IntrinsifyError::AccumulatorSlotTaken { name: acc_name });
    }

    let body = tree.deep_copy(shape.loop_node);
    let migrated = migrate_slots(tree, &shape, genexp);
    redirect(tree, body, &migrated, &shape);

    let acc = tree
        .scope_mut(shape.enclosing)
        .add_fresh(&acc_name)
        .ok_or(IntrinsifyError::AccumulatorSlotTaken { name: acc_name })?;

    let point = suspension_points(tree, body)
        .first()
        .copied()
        .ok_or_else(|| malformed(genexp, "copied loop lost its yield"))?;
    let NodeKind::Yield { value } = *tree.kind(point) else {
        return Err(malformed(genexp, "suspension point is not a yield"));
    };
    let NodeKind::WriteLocal { rhs, .. } = *tree.kind(value) else {
        return Err(malformed(genexp, "yield does not wrap a local write"));
    };
    let append = descriptor.create_append(tree, acc, rhs);
    tree.replace(point, append)?;

    let wrapper = descriptor.create_comprehension(tree, acc, body);
    tree.replace(call, wrapper)?;

    if let NodeKind::GeneratorExpression { optimized, .. } = tree.kind_mut(genexp) {
        *optimized = true;
    }
    Ok(wrapper)
}

fn malformed(generator: NodeId, reason: &'static str) -> IntrinsifyError {
    IntrinsifyError::MalformedGenerator { generator, reason }
}

/// Validate the generator's structure without touching the tree.
fn inspect(tree: &Tree, genexp: NodeId) -> Result<GeneratorShape, IntrinsifyError> {
    let NodeKind::GeneratorExpression { root, enclosing, .. } = *tree.kind(genexp) else {
        return Err(malformed(genexp, "not a generator expression"));
    };
    let NodeKind::Generator { scope: private, body, .. } = *tree.kind(root) else {
        return Err(malformed(genexp, "root is not a generator body"));
    };
    if !matches!(tree.kind(body), NodeKind::For { .. }) {
        return Err(malformed(genexp, "generator body is not a for loop"));
    }

    let [point] = suspension_points(tree, body)[..] else {
        return Err(malformed(genexp, "expected exactly one yield"));
    };
    let NodeKind::Yield { value } = *tree.kind(point) else {
        unreachable!("suspension_points returns yields");
    };
    match tree.kind(value) {
        NodeKind::WriteLocal { slot, .. } if slot.scope == private => {}
        _ => return Err(malformed(genexp, "yield does not wrap a local write")),
    }

    Ok(GeneratorShape { private, enclosing, loop_node: body })
}

/// `Yield` nodes in the frame of `id`. Nested generator and function bodies
/// have their own suspension points and are skipped.
fn suspension_points(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
        if matches!(tree.kind(node), NodeKind::Yield { .. }) {
            out.push(node);
        }
        for child in tree.kind(node).children().into_iter().rev() {
            if tree.role(child) == NodeRole::Other {
                stack.push(child);
            }
        }
    }
    out
}

/// Give every private slot except the return-value slot a home in the
/// enclosing table. Returns private slot → enclosing slot.
///
/// A name the enclosing table already holds gets a `$g<id>` suffix instead of
/// sharing the slot. Module slots are visible by name to every function, so
/// at module level every migrated name is suffixed.
fn migrate_slots(tree: &mut Tree, shape: &GeneratorShape, genexp: NodeId) -> BTreeMap<SlotId, SlotId> {
    let private: Vec<(String, SlotId)> = tree
        .scope(shape.private)
        .slots()
        .filter(|(name, _)| *name != RETURN_VALUE_SLOT)
        .map(|(name, slot)| (name.to_string(), slot))
        .collect();
    let module_level = tree
        .root()
        .and_then(|root| tree.kind(root).owned_scope())
        .is_some_and(|scope| scope == shape.enclosing);

    let mut migrated = BTreeMap::new();
    let table = tree.scope_mut(shape.enclosing);
    for (name, slot) in private {
        let target = if module_level || table.find(&name).is_some() {
            let renamed = format!("{}$g{}", name, genexp.0);
            tracing::debug!(slot = %name, renamed = %renamed, "renaming migrated slot");
            table.find_or_add(&renamed)
        } else {
            table.find_or_add(&name)
        };
        migrated.insert(slot, target);
    }
    migrated
}

/// Rebind reads and writes in the detached loop copy.
///
/// `depth` counts generator frames between a node and the loop. At depth 0
/// the node now runs in the enclosing frame: private slots are swapped for
/// their migrated counterparts and every free read drops one level. Inside a
/// nested generator at depth `d`, a read `d` levels up used to reach the
/// private frame and now reaches the enclosing one at the same distance; a
/// read further out loses one level.
fn redirect(tree: &mut Tree, body: NodeId, migrated: &BTreeMap<SlotId, SlotId>, shape: &GeneratorShape) {
    let mut stack = vec![(body, 0u32)];
    while let Some((id, depth)) = stack.pop() {
        let mut replacement = None;
        match tree.kind_mut(id) {
            NodeKind::ReadLocal { slot }
            | NodeKind::WriteLocal { slot, .. }
            | NodeKind::For { target: slot, .. }
            | NodeKind::Comprehension { slot, .. }
            | NodeKind::ComprehensionAppend { slot, .. }
                if depth == 0 =>
            {
                if let Some(new) = migrated.get(slot) {
                    *slot = *new;
                }
            }
            NodeKind::ReadLevel { slot, level } if depth == 0 => {
                if *level <= 1 {
                    replacement = Some(NodeKind::ReadLocal { slot: *slot });
                } else {
                    *level -= 1;
                }
            }
            NodeKind::ReadLevel { slot, level } => {
                if *level == depth {
                    if let Some(new) = migrated.get(slot) {
                        *slot = *new;
                    }
                } else if *level > depth {
                    *level -= 1;
                }
            }
            NodeKind::GeneratorExpression { enclosing, .. } if *enclosing == shape.private => {
                *enclosing = shape.enclosing;
            }
            _ => {}
        }
        if let Some(kind) = replacement {
            *tree.kind_mut(id) = kind;
        }

        let child_depth = match tree.role(id) {
            NodeRole::GeneratorRoot | NodeRole::FunctionRoot => depth + 1,
            _ => depth,
        };
        for child in tree.kind(id).children() {
            stack.push((child, child_depth));
        }
    }
}
