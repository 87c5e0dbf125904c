/*
 * Fieldguard - write-protectable field classification for kernel globals
 *
 * Feature-First Hexagonal Architecture:
 * - shared/   : Value-flow graph, type and layout models
 * - features/ : Vertical slices (indexing → propagation → classification → scheduling)
 * - config/   : Threshold and runtime configuration
 *
 * Pipeline: load graph → build index → per-variable flows-to traversal →
 * Protect/Written classification → per-worker reports.
 */

/// Shared graph, type and layout models
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

pub use config::{AnalysisConfig, FieldguardConfig, IndexingConfig, ParallelConfig};
pub use errors::{FieldguardError, Result};
pub use features::classification::{read_allow_list, ResultClassifier, VariableClassification};
pub use features::indexing::{GraphIndex, GraphIndexer};
pub use features::propagation::{AliasResult, VariableAnalyzer};
pub use features::scheduling::{
    read_scope_file, DirSinks, MemorySinks, Scheduler, SinkFactory, StdoutSinks, TargetScope,
};
pub use shared::models::ValueFlowGraph;
