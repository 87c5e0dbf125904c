//! Pre-analysis indexing
//!
//! One pass over the graph before any traversal: hot-element suppression,
//! Phi/Select adjacency, anonymous-struct naming, Gep byte offsets, the three
//! shortcut tables, and the interprocedural call summary.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::GraphIndexer;
pub use domain::{
    CallSummary, GraphIndex, IndexStats, PhiSelectAdjacency, ShortcutTables, StructNaming,
    StructuralOffsets, SuppressionState,
};
