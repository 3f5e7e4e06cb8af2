// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The builtin-call intrinsification pass.

use ember_ast::{NodeId, NodeKind, Tree};

use crate::eligibility::{self, Ineligible};
use crate::rewrite::rewrite;
use crate::{IntrinsifyError, IntrinsifyOptions, SpeculationGuard, TraceSink};

/// What one `synthesize` call did. Informational; the tree and the
/// generator's `optimized` marker are the real outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transformed {
        /// The `Comprehension` node now linked where the call was.
        wrapper: NodeId,
        generator: NodeId,
        builtin: &'static str,
    },
    Ineligible(Ineligible),
    /// The argument was transformed before. Nothing changed.
    AlreadyOptimized,
    /// A speculation guard no longer holds. Nothing changed.
    GuardInvalidated,
}

/// One pass instance, bound to a single call site.
pub struct BuiltinIntrinsifier {
    global_scope_unchanged: SpeculationGuard,
    builtin_module_unchanged: SpeculationGuard,
    call: NodeId,
    sink: TraceSink,
}

impl BuiltinIntrinsifier {
    /// # Panics
    ///
    /// If `options.intrinsify_builtin_calls` is off. Building the pass at all
    /// in that state is a bug in the caller.
    pub fn new(
        options: &IntrinsifyOptions,
        global_scope_unchanged: SpeculationGuard,
        builtin_module_unchanged: SpeculationGuard,
        call: NodeId,
    ) -> Self {
        assert!(
            options.intrinsify_builtin_calls,
            "builtin intrinsifier constructed while intrinsify_builtin_calls is disabled"
        );
        let sink = if options.trace { TraceSink::Stdout } else { TraceSink::Silent };
        Self { global_scope_unchanged, builtin_module_unchanged, call, sink }
    }

    pub fn with_sink(mut self, sink: TraceSink) -> Self {
        self.sink = sink;
        self
    }

    /// Check the call site and, if it qualifies, rewrite it in place.
    pub fn synthesize(&mut self, tree: &mut Tree) -> Result<Outcome, IntrinsifyError> {
        for guard in [&self.global_scope_unchanged, &self.builtin_module_unchanged] {
            if !guard.is_valid() {
                tracing::debug!(call = %self.call, guard = guard.name(), "guard invalidated, skipping");
                return Ok(Outcome::GuardInvalidated);
            }
        }

        if let Some(genexp) = eligibility::sole_generator_argument(tree, self.call) {
            if matches!(tree.kind(genexp), NodeKind::GeneratorExpression { optimized: true, .. }) {
                return Ok(Outcome::AlreadyOptimized);
            }
        }

        let eligible = match eligibility::check(tree, self.call) {
            Ok(eligible) => eligible,
            Err(reason) => {
                tracing::debug!(call = %self.call, %reason, "call site not intrinsified");
                return Ok(Outcome::Ineligible(reason));
            }
        };
        let name = eligible.descriptor.name;

        let wrapper = match rewrite(tree, self.call, eligible.generator, eligible.descriptor) {
            Ok(wrapper) => wrapper,
            Err(err) => {
                tracing::warn!(call = %self.call, builtin = name, error = %err, "intrinsification failed");
                return Err(err);
            }
        };

        self.sink.emit(&format!(
            "transform genexpr{} with call to '{}' to {} comprehension",
            eligible.generator, name, name
        ));
        tracing::info!(
            call = %self.call,
            generator = %eligible.generator,
            wrapper = %wrapper,
            builtin = name,
            "intrinsified builtin call"
        );

        Ok(Outcome::Transformed { wrapper, generator: eligible.generator, builtin: name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{call_to, parse_ok};
    use ember_ast::Span;

    struct Harness {
        options: IntrinsifyOptions,
        global: SpeculationGuard,
        builtins: SpeculationGuard,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                options: IntrinsifyOptions::default(),
                global: SpeculationGuard::new("global_scope_unchanged"),
                builtins: SpeculationGuard::new("builtin_module_unchanged"),
            }
        }

        fn pass(&self, call: NodeId) -> (BuiltinIntrinsifier, std::sync::Arc<std::sync::Mutex<String>>) {
            let (sink, buf) = TraceSink::buffer();
            let pass = BuiltinIntrinsifier::new(&self.options, self.global.clone(), self.builtins.clone(), call)
                .with_sink(sink);
            (pass, buf)
        }
    }

    #[test]
    fn transforms_and_reports() {
        let mut tree = parse_ok("def f(n) { return sum(x * 2 for x in range(n)) }\n");
        let call = call_to(&tree, "sum");
        let h = Harness::new();
        let (mut pass, buf) = h.pass(call);

        let outcome = pass.synthesize(&mut tree).unwrap();
        let Outcome::Transformed { wrapper, generator, builtin } = outcome else {
            panic!("unexpected {:?}", outcome);
        };
        assert_eq!(builtin, "sum");
        assert!(tree.is_linked(wrapper));
        assert!(!tree.is_linked(call));
        assert!(matches!(tree.kind(generator), NodeKind::GeneratorExpression { optimized: true, .. }));
        assert_eq!(
            *buf.lock().unwrap(),
            format!("transform genexpr{} with call to 'sum' to sum comprehension\n", generator)
        );
        tree.verify_parent_links().unwrap();
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut tree = parse_ok("def f(xs) { return list(x for x in xs) }\n");
        let call = call_to(&tree, "list");
        let h = Harness::new();

        let (mut first, _) = h.pass(call);
        assert!(matches!(first.synthesize(&mut tree).unwrap(), Outcome::Transformed { .. }));
        let after_first = tree.clone();

        let (mut second, buf) = h.pass(call);
        assert_eq!(second.synthesize(&mut tree).unwrap(), Outcome::AlreadyOptimized);
        assert_eq!(first.synthesize(&mut tree).unwrap(), Outcome::AlreadyOptimized);
        assert_eq!(tree, after_first);
        assert!(buf.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_guard_blocks_rewrite() {
        let mut tree = parse_ok("def f(xs) { return max(x for x in xs) }\n");
        let call = call_to(&tree, "max");
        let snapshot = tree.clone();

        let h = Harness::new();
        h.builtins.invalidate();
        let (mut pass, buf) = h.pass(call);
        assert_eq!(pass.synthesize(&mut tree).unwrap(), Outcome::GuardInvalidated);
        assert_eq!(tree, snapshot);
        assert!(buf.lock().unwrap().is_empty());

        let h = Harness::new();
        h.global.invalidate();
        let (mut pass, _) = h.pass(call);
        assert_eq!(pass.synthesize(&mut tree).unwrap(), Outcome::GuardInvalidated);
        assert_eq!(tree, snapshot);
    }

    #[test]
    fn ineligible_sites_are_left_alone() {
        let mut tree = parse_ok("def g(xss) {\n  for xs in xss { yield any(x for x in xs) }\n}\n");
        let call = call_to(&tree, "any");
        let snapshot = tree.clone();
        let (mut pass, buf) = Harness::new().pass(call);
        assert_eq!(
            pass.synthesize(&mut tree).unwrap(),
            Outcome::Ineligible(Ineligible::CallerIsGenerator)
        );
        assert_eq!(tree, snapshot);
        assert!(buf.lock().unwrap().is_empty());
    }

    #[test]
    fn argument_shape_mismatch_leaves_tree_alone() {
        for (src, builtin) in [("xs = [1, 2]\na = sum(xs)\n", "sum"), ("a = min(3, 4)\n", "min")] {
            let mut tree = parse_ok(src);
            let call = call_to(&tree, builtin);
            let snapshot = tree.clone();
            let (mut pass, buf) = Harness::new().pass(call);
            assert_eq!(
                pass.synthesize(&mut tree).unwrap(),
                Outcome::Ineligible(Ineligible::ArgumentShape)
            );
            assert_eq!(tree, snapshot);
            assert!(buf.lock().unwrap().is_empty());
        }
    }

    #[test]
    fn module_level_call() {
        let mut tree = parse_ok("m = min(i % 4 for i in range(10))\n");
        let call = call_to(&tree, "min");
        let (mut pass, _) = Harness::new().pass(call);
        assert!(matches!(pass.synthesize(&mut tree).unwrap(), Outcome::Transformed { builtin: "min", .. }));
        tree.verify_parent_links().unwrap();
    }

    #[test]
    fn malformed_generator_is_an_error() {
        let mut tree = parse_ok("def f(xs) { return tuple(x for x in xs) }\n");
        let call = call_to(&tree, "tuple");
        let yield_node = tree.find_first(call, |k| matches!(k, NodeKind::Yield { .. })).unwrap();
        let NodeKind::Yield { value } = *tree.kind(yield_node) else { unreachable!() };
        let bare = tree.alloc(NodeKind::NoneLit, Span::DUMMY);
        tree.replace(value, bare).unwrap();
        let snapshot = tree.clone();

        let (mut pass, buf) = Harness::new().pass(call);
        let err = pass.synthesize(&mut tree).unwrap_err();
        assert!(matches!(err, IntrinsifyError::MalformedGenerator { .. }));
        assert_eq!(tree, snapshot);
        assert!(buf.lock().unwrap().is_empty());
    }

    #[test]
    #[should_panic(expected = "intrinsify_builtin_calls is disabled")]
    fn constructing_while_disabled_panics() {
        let options = IntrinsifyOptions { intrinsify_builtin_calls: false, ..IntrinsifyOptions::default() };
        let _ = BuiltinIntrinsifier::new(
            &options,
            SpeculationGuard::new("global_scope_unchanged"),
            SpeculationGuard::new("builtin_module_unchanged"),
            NodeId(0),
        );
    }
}
