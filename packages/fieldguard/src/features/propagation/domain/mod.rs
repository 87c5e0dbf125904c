//! Traversal state and results

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::shared::models::NodeId;

/// One layer of the memory-indirection stack.
///
/// `offset` accumulates field displacement at this indirection level;
/// `reverse_flow` records whether the layer was opened while traversing
/// against the dataflow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub offset: i64,
    pub reverse_flow: bool,
}

impl Frame {
    pub fn new(offset: i64, reverse_flow: bool) -> Self {
        Self {
            offset,
            reverse_flow,
        }
    }
}

/// Aliases of the target, partitioned by byte offset.
///
/// Ordered map so reports iterate offsets ascending without re-sorting.
pub type AliasMap = BTreeMap<i64, FxHashSet<NodeId>>;

/// Per-run traversal counters
#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    /// Node expansions performed
    pub visits: u64,
    /// Adaptive suppression sweeps triggered by this engine
    pub promotions: u64,
}

/// Outcome of one target's traversal
#[derive(Debug)]
pub struct AliasResult {
    pub target: NodeId,
    pub aliases: AliasMap,
    pub stats: EngineStats,
}

impl AliasResult {
    /// Total distinct offsets observed.
    pub fn field_count(&self) -> usize {
        self.aliases.len()
    }
}
