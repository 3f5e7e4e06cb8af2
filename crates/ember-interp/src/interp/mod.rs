// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interpreter implementation.
//!
//! A tree walker over the arena in [`Tree`]. The interpreter owns the tree so
//! that the adaptive engine can rewrite call sites while the program runs;
//! every evaluation step clones the node's kind first, so an activation that
//! is already inside a subtree finishes on the nodes it started with.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use ember_ast::{NodeKind, ScopeId, SlotId, Span, Tree};
use ember_intrinsify::{IntrinsifyOptions, Outcome, TraceSink};

mod call;
mod eval;
mod exec;
mod generator;
pub(crate) mod operators;

use crate::adaptive::AdaptiveEngine;
use crate::builtins;
use crate::frame::{Frame, FrameRef};
use crate::value::Value;

pub(crate) use generator::Consumer;

/// Deepest nesting of function calls before the program is stopped.
const MAX_CALL_DEPTH: usize = 200;

/// The tree-walk interpreter.
pub struct Interpreter {
    tree: Tree,
    module_scope: Option<ScopeId>,
    module_frame: Option<FrameRef>,
    /// Names resolved after the module scope misses.
    builtins: IndexMap<String, Value>,
    engine: Option<AdaptiveEngine>,
    /// Innermost consumer last. A `yield` hands its value to the top entry.
    consumers: Vec<Consumer>,
    call_depth: usize,
    /// Span of the innermost node that raised the current error.
    error_span: Option<Span>,
    /// Optional output buffer for capturing stdout (used in tests).
    output_buffer: Option<Arc<Mutex<String>>>,
}

impl Interpreter {
    /// An interpreter that never intrinsifies.
    pub fn new(tree: Tree) -> Self {
        let module_scope = tree.root().and_then(|root| tree.kind(root).owned_scope());
        Self {
            tree,
            module_scope,
            module_frame: None,
            builtins: builtins::namespace(),
            engine: None,
            consumers: Vec::new(),
            call_depth: 0,
            error_span: None,
            output_buffer: None,
        }
    }

    /// An interpreter with an adaptive engine, if `options` enable it.
    pub fn with_options(tree: Tree, options: &IntrinsifyOptions) -> Self {
        let mut interp = Self::new(tree);
        if options.intrinsify_builtin_calls {
            interp.engine = Some(AdaptiveEngine::new(options.clone()));
        }
        interp
    }

    /// Capture `print` output instead of writing to stdout.
    pub fn capture_output(&mut self) -> Arc<Mutex<String>> {
        let buffer = Arc::new(Mutex::new(String::new()));
        self.output_buffer = Some(Arc::clone(&buffer));
        buffer
    }

    /// Redirect the transformation report lines.
    pub fn set_trace_sink(&mut self, sink: TraceSink) {
        if let Some(engine) = &mut self.engine {
            engine.set_sink(sink);
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn engine(&self) -> Option<&AdaptiveEngine> {
        self.engine.as_ref()
    }

    /// Run the pass on every candidate call site up front.
    pub fn intrinsify_all(&mut self) -> Vec<Outcome> {
        match &mut self.engine {
            Some(engine) => engine.intrinsify_all(&mut self.tree),
            None => Vec::new(),
        }
    }

    /// Replace a builtin with another value. Invalidates the engine's
    /// `builtin_module_unchanged` guard.
    pub fn rebind_builtin(&mut self, name: &str, value: Value) {
        self.builtins.insert(name.to_string(), value);
        if let Some(engine) = &self.engine {
            engine.builtin_module_unchanged().invalidate();
        }
    }

    /// Execute the module.
    pub fn run(&mut self) -> Result<(), RuntimeDiagnostic> {
        let (Some(root), Some(scope)) = (self.tree.root(), self.module_scope) else {
            return Ok(());
        };
        if let Some(engine) = &self.engine {
            engine.check_module_bindings(&self.tree, scope);
        }

        let frame = Frame::new(scope, self.tree.scope(scope).len(), None);
        self.module_frame = Some(Rc::clone(&frame));
        self.error_span = None;

        let NodeKind::Module { body, .. } = *self.tree.kind(root) else {
            return Ok(());
        };
        match self.eval(body, &frame) {
            Ok(_) => Ok(()),
            Err(error) => {
                let span = self.error_span.take().unwrap_or(Span::DUMMY);
                Err(RuntimeDiagnostic::new(error.into_user_error(), span))
            }
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub(crate) fn write_output(&self, s: &str) {
        if let Some(buf) = &self.output_buffer {
            if let Ok(mut buf) = buf.lock() {
                buf.push_str(s);
            }
        } else {
            print!("{}", s);
        }
    }

    pub(crate) fn write_output_ln(&self) {
        self.write_output("\n");
    }

    // =========================================================================
    // Slots
    // =========================================================================

    fn slot_name(&self, slot: SlotId) -> String {
        self.tree
            .scope(slot.scope)
            .name_of(slot)
            .map(String::from)
            .unwrap_or_else(|| slot.to_string())
    }

    fn read_slot(&self, frame: &FrameRef, slot: SlotId) -> Result<Value, RuntimeError> {
        frame
            .borrow()
            .get(slot)
            .ok_or_else(|| RuntimeError::UnboundLocal(self.slot_name(slot)))
    }

    fn read_global(&self, name: &str) -> Result<Value, RuntimeError> {
        if let (Some(scope), Some(frame)) = (self.module_scope, &self.module_frame) {
            if let Some(slot) = self.tree.scope(scope).find(name) {
                if let Some(value) = frame.borrow().get(slot) {
                    return Ok(value);
                }
            }
        }
        self.builtins
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }
}

/// Runtime errors, plus the control-flow signals that travel the same
/// `Result` channel.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("local variable '{0}' referenced before assignment")]
    UnboundLocal(String),

    #[error("{0}")]
    TypeError(String),

    #[error("{0}")]
    ValueError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("{name}() takes {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch { name: String, expected: usize, got: usize },

    #[error("index {index} out of range (length is {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error("generator '{0}' is already running")]
    GeneratorRunning(String),

    // Control flow (not actual errors)
    #[error("return")]
    Return,

    #[error("break")]
    Break,

    #[error("continue")]
    Continue,

    /// The generator's consumer wants no more values.
    #[error("generator stopped by its consumer")]
    StopGenerator,

    /// An accumulate node decided the result; only the wrapper that owns
    /// the slot catches this.
    #[error("comprehension stopped early")]
    StopComprehension(SlotId),

    /// A signal raised by a consumer, carried through the generator body
    /// that yielded to it.
    #[error("{0}")]
    Unwind(Box<RuntimeError>),
}

impl RuntimeError {
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            RuntimeError::Return
                | RuntimeError::Break
                | RuntimeError::Continue
                | RuntimeError::StopGenerator
                | RuntimeError::StopComprehension(_)
                | RuntimeError::Unwind(_)
        )
    }

    fn into_user_error(self) -> RuntimeError {
        match self {
            RuntimeError::Unwind(inner) => inner.into_user_error(),
            other => other,
        }
    }
}

/// Runtime error with source location for diagnostic display.
#[derive(Debug)]
pub struct RuntimeDiagnostic {
    pub error: RuntimeError,
    pub span: Span,
}

impl RuntimeDiagnostic {
    pub fn new(error: RuntimeError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for RuntimeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RuntimeDiagnostic {}
