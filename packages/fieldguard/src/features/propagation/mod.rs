//! Demand-driven flows-to propagation
//!
//! Walks the value-flow graph from one target address node and collects, per
//! byte offset, every node denoting that field. Store/load pairing is
//! tracked with an explicit offset stack; type, bridging and cast shortcuts
//! from the index replace most plain Gep walks.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::VariableAnalyzer;
pub use domain::{AliasMap, AliasResult, EngineStats, Frame};
pub use infrastructure::AliasEngine;
