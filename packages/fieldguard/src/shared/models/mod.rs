//! Shared data model
//!
//! - `types`: closed type shapes and the per-module layout oracle
//! - `node` / `edge`: value-flow graph elements
//! - `graph`: the graph container with tag-bucketed adjacency

pub mod edge;
pub mod graph;
pub mod node;
pub mod types;

pub use edge::{CallRef, EdgeId, EdgeKind, EdgeTag, GepDescriptor, GepIndex, VfgEdge};
pub use graph::{CallSiteInfo, FunctionInfo, GlobalVar, ValueFlowGraph};
pub use node::{NodeId, SourceRef, VfgNode};
pub use types::{
    normalize_struct_name, LayoutOracle, ModuleId, ModuleLayout, StructLayout, TypeId, TypeKind,
    TypeTable,
};
