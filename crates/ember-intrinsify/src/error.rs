// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Intrinsification errors.

use ember_ast::{NodeId, TreeError};

/// Failures of an eligible rewrite. Ineligible call sites are not errors;
/// see [`crate::Outcome::Ineligible`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntrinsifyError {
    /// The generator expression does not have the `For` + single
    /// `Yield { WriteLocal }` shape the rewrite needs. The tree is untouched.
    #[error("generator expression {generator} is malformed: {reason}")]
    MalformedGenerator { generator: NodeId, reason: &'static str },

    #[error("accumulator slot '{name}' already exists in the enclosing scope")]
    AccumulatorSlotTaken { name: String },

    #[error(transparent)]
    Tree(#[from] TreeError),
}
