// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Adaptive engine: decides when to intrinsify a call site.
//!
//! Counts executions of each call whose callee is a registered builtin name.
//! When a site reaches the hot threshold the engine builds one
//! [`BuiltinIntrinsifier`] for it and runs it against the live tree. Each
//! site gets exactly one attempt, whatever the outcome.

use std::collections::{HashMap, HashSet};

use ember_ast::{NodeId, ScopeId, Tree};
use ember_intrinsify::{eligibility, registry, BuiltinIntrinsifier, IntrinsifyOptions, Outcome, SpeculationGuard, TraceSink};

pub struct AdaptiveEngine {
    options: IntrinsifyOptions,
    global_scope_unchanged: SpeculationGuard,
    builtin_module_unchanged: SpeculationGuard,
    sink: TraceSink,
    counts: HashMap<NodeId, u32>,
    attempted: HashSet<NodeId>,
    transformed: usize,
}

impl AdaptiveEngine {
    pub fn new(options: IntrinsifyOptions) -> Self {
        let sink = if options.trace { TraceSink::Stdout } else { TraceSink::Silent };
        Self {
            options,
            global_scope_unchanged: SpeculationGuard::new("global_scope_unchanged"),
            builtin_module_unchanged: SpeculationGuard::new("builtin_module_unchanged"),
            sink,
            counts: HashMap::new(),
            attempted: HashSet::new(),
            transformed: 0,
        }
    }

    pub fn set_sink(&mut self, sink: TraceSink) {
        self.sink = sink;
    }

    pub fn global_scope_unchanged(&self) -> &SpeculationGuard {
        &self.global_scope_unchanged
    }

    pub fn builtin_module_unchanged(&self) -> &SpeculationGuard {
        &self.builtin_module_unchanged
    }

    /// Number of call sites rewritten so far.
    pub fn transformed(&self) -> usize {
        self.transformed
    }

    /// Invalidate `global_scope_unchanged` if the module binds a name that
    /// shadows a registered builtin.
    pub fn check_module_bindings(&self, tree: &Tree, module: ScopeId) {
        if let Some((name, _)) = tree.scope(module).slots().find(|(name, _)| registry::is_registered(name)) {
            tracing::debug!(name, "module shadows an intrinsifiable builtin");
            self.global_scope_unchanged.invalidate();
        }
    }

    /// Record one execution of `call`. Returns the replacement node when
    /// this execution made the site hot and the rewrite succeeded.
    pub fn on_call(&mut self, tree: &mut Tree, call: NodeId) -> Option<NodeId> {
        if self.attempted.contains(&call) {
            return None;
        }
        let count = self.counts.entry(call).or_insert(0);
        *count += 1;
        if *count < self.options.hot_call_threshold {
            return None;
        }
        tracing::debug!(call = %call, count = *count, "call site is hot");
        match self.attempt(tree, call) {
            Some(Outcome::Transformed { wrapper, .. }) => Some(wrapper),
            _ => None,
        }
    }

    /// Attempt every candidate call site up front, outermost first. Calls
    /// exposed by a rewrite (a nested generator expression's call, now in
    /// plain code) are picked up on the next sweep.
    pub fn intrinsify_all(&mut self, tree: &mut Tree) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        let Some(root) = tree.root() else { return outcomes };
        if let Some(module) = tree.kind(root).owned_scope() {
            self.check_module_bindings(tree, module);
        }
        loop {
            let pending: Vec<NodeId> = eligibility::candidate_calls(tree, root)
                .into_iter()
                .filter(|call| !self.attempted.contains(call))
                .collect();
            if pending.is_empty() {
                break;
            }
            for call in pending {
                if !tree.is_linked(call) {
                    continue;
                }
                if let Some(outcome) = self.attempt(tree, call) {
                    outcomes.push(outcome);
                }
            }
        }
        outcomes
    }

    fn attempt(&mut self, tree: &mut Tree, call: NodeId) -> Option<Outcome> {
        self.attempted.insert(call);
        let mut pass = BuiltinIntrinsifier::new(
            &self.options,
            self.global_scope_unchanged.clone(),
            self.builtin_module_unchanged.clone(),
            call,
        )
        .with_sink(self.sink.clone());
        match pass.synthesize(tree) {
            Ok(outcome) => {
                if matches!(outcome, Outcome::Transformed { .. }) {
                    self.transformed += 1;
                }
                Some(outcome)
            }
            // Already reported by the pass; the call keeps running unoptimized.
            Err(_) => None,
        }
    }
}
