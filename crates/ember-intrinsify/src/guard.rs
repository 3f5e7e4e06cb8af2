// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Speculation guards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A correctness token owned by the adaptive engine.
///
/// Clones share state. The engine invalidates a guard when an assumption it
/// stands for stops holding (for example, a builtin name gets rebound); the
/// pass only reads it. Invalidation is permanent.
#[derive(Debug, Clone)]
pub struct SpeculationGuard {
    name: &'static str,
    valid: Arc<AtomicBool>,
}

impl SpeculationGuard {
    pub fn new(name: &'static str) -> Self {
        Self { name, valid: Arc::new(AtomicBool::new(true)) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            tracing::debug!(guard = self.name, "speculation guard invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_validity() {
        let guard = SpeculationGuard::new("builtin_module_unchanged");
        let held_by_pass = guard.clone();
        assert!(held_by_pass.is_valid());
        guard.invalidate();
        assert!(!held_by_pass.is_valid());
        guard.invalidate();
        assert!(!guard.is_valid());
    }

    #[test]
    fn guards_are_independent() {
        let a = SpeculationGuard::new("a");
        let b = SpeculationGuard::new("b");
        a.invalidate();
        assert!(b.is_valid());
    }
}
