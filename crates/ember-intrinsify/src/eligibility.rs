// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Call-site eligibility.
//!
//! Pure inspection of the tree: an ancestor walk to classify the caller,
//! then a registry lookup and an argument-shape check.

use ember_ast::{NodeId, NodeKind, NodeRole, Tree};

use crate::registry::{self, TransformDescriptor};

/// A call site the rewrite can handle.
#[derive(Debug, Clone, Copy)]
pub struct Eligible {
    pub descriptor: &'static TransformDescriptor,
    /// The `GeneratorExpression` argument.
    pub generator: NodeId,
}

/// Why a call site is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// The call runs inside a generator body; inlining there would change
    /// re-entry behavior across suspensions.
    CallerIsGenerator,
    /// The call is not reachable from any scope root.
    Detached,
    /// The node is not a call of a global name.
    NotABuiltinCall,
    /// Not exactly one argument, or the argument is not a generator
    /// expression.
    ArgumentShape,
}

impl std::fmt::Display for Ineligible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Ineligible::CallerIsGenerator => "call is inside a generator body",
            Ineligible::Detached => "call is not linked into the tree",
            Ineligible::NotABuiltinCall => "not a call to a global name",
            Ineligible::ArgumentShape => "argument is not a single generator expression",
        };
        f.write_str(text)
    }
}

/// Classify `call`.
///
/// # Panics
///
/// If the callee is a global name with no registry entry. The engine only
/// hands over calls of registered names.
pub fn check(tree: &Tree, call: NodeId) -> Result<Eligible, Ineligible> {
    match tree.enclosing_root(call).map(|root| tree.role(root)) {
        Some(NodeRole::GeneratorRoot) => return Err(Ineligible::CallerIsGenerator),
        Some(NodeRole::FunctionRoot | NodeRole::ModuleRoot) => {}
        Some(NodeRole::Other) | None => return Err(Ineligible::Detached),
    }

    let NodeKind::Call { callee, args } = tree.kind(call) else {
        return Err(Ineligible::NotABuiltinCall);
    };
    let NodeKind::ReadGlobal { name } = tree.kind(*callee) else {
        return Err(Ineligible::NotABuiltinCall);
    };
    let descriptor = registry::lookup(name)
        .unwrap_or_else(|| panic!("intrinsifier invoked on call to unregistered builtin '{}'", name));

    match args.as_slice() {
        [arg] if matches!(tree.kind(*arg), NodeKind::GeneratorExpression { .. }) => {
            Ok(Eligible { descriptor, generator: *arg })
        }
        _ => Err(Ineligible::ArgumentShape),
    }
}

/// The sole `GeneratorExpression` argument of `call`, if it has that shape.
pub fn sole_generator_argument(tree: &Tree, call: NodeId) -> Option<NodeId> {
    match tree.kind(call) {
        NodeKind::Call { args, .. } => match args.as_slice() {
            [arg] if matches!(tree.kind(*arg), NodeKind::GeneratorExpression { .. }) => Some(*arg),
            _ => None,
        },
        _ => None,
    }
}

/// Registered builtin name called at `call`, if any.
pub fn builtin_name(tree: &Tree, call: NodeId) -> Option<&'static str> {
    let NodeKind::Call { callee, .. } = tree.kind(call) else { return None };
    let NodeKind::ReadGlobal { name } = tree.kind(*callee) else { return None };
    registry::lookup(name).map(|d| d.name)
}

/// Linked call sites of registered builtins under `root`, in pre-order.
pub fn candidate_calls(tree: &Tree, root: NodeId) -> Vec<NodeId> {
    tree.descendants(root)
        .into_iter()
        .filter(|&id| builtin_name(tree, id).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{call_to, parse_ok};

    #[test]
    fn sum_of_genexp_is_eligible() {
        let tree = parse_ok("def f(n) { return sum(x * 2 for x in range(n)) }\n");
        let call = call_to(&tree, "sum");
        let eligible = check(&tree, call).unwrap();
        assert_eq!(eligible.descriptor.name, "sum");
        assert!(matches!(tree.kind(eligible.generator), NodeKind::GeneratorExpression { .. }));
    }

    #[test]
    fn module_level_call_is_eligible() {
        let tree = parse_ok("total = max(i % 3 for i in range(10))\n");
        assert!(check(&tree, call_to(&tree, "max")).is_ok());
    }

    #[test]
    fn argument_shape() {
        let tree = parse_ok("xs = [1, 2]\na = sum(xs)\n");
        assert_eq!(check(&tree, call_to(&tree, "sum")).unwrap_err(), Ineligible::ArgumentShape);

        let tree = parse_ok("a = min(3, 4)\n");
        assert_eq!(check(&tree, call_to(&tree, "min")).unwrap_err(), Ineligible::ArgumentShape);

        let tree = parse_ok("a = list()\n");
        assert_eq!(check(&tree, call_to(&tree, "list")).unwrap_err(), Ineligible::ArgumentShape);
    }

    #[test]
    fn generator_function_caller_is_excluded() {
        let tree = parse_ok("def g(xss) {\n  for xs in xss { yield sum(x for x in xs) }\n}\n");
        assert_eq!(
            check(&tree, call_to(&tree, "sum")).unwrap_err(),
            Ineligible::CallerIsGenerator
        );
    }

    #[test]
    fn call_inside_genexp_body_is_excluded() {
        let tree = parse_ok("r = list(sum(y for y in x) for x in [[1], [2]])\n");
        assert_eq!(
            check(&tree, call_to(&tree, "sum")).unwrap_err(),
            Ineligible::CallerIsGenerator
        );
        assert!(check(&tree, call_to(&tree, "list")).is_ok());
    }

    #[test]
    fn unlinked_call_is_detached() {
        let mut tree = parse_ok("a = 1\n");
        let callee = tree.alloc(NodeKind::ReadGlobal { name: "sum".into() }, ember_ast::Span::DUMMY);
        let call = tree.alloc(NodeKind::Call { callee, args: Vec::new() }, ember_ast::Span::DUMMY);
        assert_eq!(check(&tree, call).unwrap_err(), Ineligible::Detached);
    }

    #[test]
    fn non_global_callee() {
        let tree = parse_ok("def f(g) { return g(x for x in [1]) }\n");
        let call = tree
            .find_first(tree.root().unwrap(), |k| matches!(k, NodeKind::Call { .. }))
            .unwrap();
        assert_eq!(check(&tree, call).unwrap_err(), Ineligible::NotABuiltinCall);
    }

    #[test]
    #[should_panic(expected = "unregistered builtin 'sorted'")]
    fn registry_miss_panics() {
        let tree = parse_ok("s = sorted(x for x in [3, 1])\n");
        let call = tree
            .find_first(tree.root().unwrap(), |k| matches!(k, NodeKind::Call { .. }))
            .unwrap();
        let _ = check(&tree, call);
    }

    #[test]
    fn candidates_are_registered_calls_only() {
        let tree = parse_ok("a = sum(x for x in [1])\nprint(a)\nb = any(y > 0 for y in [a])\n");
        let names: Vec<&str> = candidate_calls(&tree, tree.root().unwrap())
            .into_iter()
            .filter_map(|c| builtin_name(&tree, c))
            .collect();
        assert_eq!(names, vec!["sum", "any"]);
    }
}
