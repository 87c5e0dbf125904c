//! Domain types of the indexing feature

pub mod index;
pub mod suppression;

pub use index::{
    declared_usable_name, manual_type_size, shape_fingerprint, CallSummary, GraphIndex,
    IndexStats, PhiSelectAdjacency, ShortcutTables, StructNaming, StructuralOffsets,
};
pub use suppression::SuppressionState;
