//! Parallel per-variable scheduling
//!
//! Resolves the analysis scope to a worklist of globals and drains it with a
//! fixed worker pool, one report sink per worker.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::Scheduler;
pub use domain::{resolve_scope, TargetScope};
pub use infrastructure::{read_scope_file, DirSinks, MemorySinks, SinkFactory, StdoutSinks};
