//! Shared hot-element suppression state
//!
//! Nodes land here two ways: statically, from the hot-element pass before any
//! traversal starts, and adaptively, when an engine promotes its locally
//! hottest nodes mid-run. The set is shared by every worker, so adaptive
//! promotion uses concurrency-safe types; insertion is idempotent and a
//! node is never removed once suppressed.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashSet;
use rustc_hash::FxHashSet;

use crate::shared::models::NodeId;

#[derive(Debug, Default)]
pub struct SuppressionState {
    nodes: DashSet<NodeId>,
    call_names: FxHashSet<String>,
    ret_names: FxHashSet<String>,
    visits: AtomicU64,
}

impl SuppressionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn suppress(&self, node: NodeId) {
        self.nodes.insert(node);
    }

    pub fn suppressed_count(&self) -> usize {
        self.nodes.len()
    }

    /// Callee whose argument-passing edges were suppressed wholesale.
    pub fn is_hot_call(&self, callee: &str) -> bool {
        self.call_names.contains(callee)
    }

    /// Callee whose return edges were suppressed wholesale.
    pub fn is_hot_ret(&self, callee: &str) -> bool {
        self.ret_names.contains(callee)
    }

    pub fn mark_hot_call(&mut self, callee: String) {
        self.call_names.insert(callee);
    }

    pub fn mark_hot_ret(&mut self, callee: String) {
        self.ret_names.insert(callee);
    }

    /// Count one engine visit against the process-wide window.
    ///
    /// Returns true when the window just elapsed and the caller should run a
    /// promotion sweep. `window == 0` disables sweeps. Concurrent callers may
    /// each observe an elapsed window at most once per reset; promotion is
    /// idempotent so overlap is harmless.
    pub fn record_visit(&self, window: u64) -> bool {
        if window == 0 {
            return false;
        }
        if self.visits.fetch_add(1, Ordering::Relaxed) + 1 >= window {
            self.visits.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_idempotent() {
        let s = SuppressionState::new();
        s.suppress(7);
        s.suppress(7);
        assert!(s.is_suppressed(7));
        assert_eq!(s.suppressed_count(), 1);
    }

    #[test]
    fn test_visit_window_elapses_once() {
        let s = SuppressionState::new();
        assert!(!s.record_visit(3));
        assert!(!s.record_visit(3));
        assert!(s.record_visit(3));
        assert!(!s.record_visit(3));
    }

    #[test]
    fn test_zero_window_never_sweeps() {
        let s = SuppressionState::new();
        for _ in 0..100 {
            assert!(!s.record_visit(0));
        }
    }
}
