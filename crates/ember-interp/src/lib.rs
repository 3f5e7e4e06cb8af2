// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk interpreter for the Ember language.
//!
//! Executes the tree directly, with an adaptive engine that intrinsifies hot
//! builtin calls over generator expressions while the program runs.

mod value;
mod frame;
mod reduce;
mod builtins;
mod interp;
pub mod adaptive;

pub use adaptive::AdaptiveEngine;
pub use interp::{Interpreter, RuntimeDiagnostic, RuntimeError};
pub use value::{Builtin, Value};
