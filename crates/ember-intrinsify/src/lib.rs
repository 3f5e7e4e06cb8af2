// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builtin-call intrinsification.
//!
//! Rewrites `sum(e for x in it)` and friends into an eager accumulation
//! loop that runs in the caller's scope, removing the generator frame and
//! its suspend/resume machinery. The adaptive engine decides when a call
//! site is hot and owns the speculation guards; this crate only checks the
//! site and performs the rewrite.

mod error;
mod guard;
mod options;
mod trace;

pub mod eligibility;
pub mod intrinsifier;
pub mod registry;
mod rewrite;

#[cfg(test)]
mod test_util;

pub use eligibility::{Eligible, Ineligible};
pub use error::IntrinsifyError;
pub use guard::SpeculationGuard;
pub use intrinsifier::{BuiltinIntrinsifier, Outcome};
pub use options::IntrinsifyOptions;
pub use registry::TransformDescriptor;
pub use trace::TraceSink;
