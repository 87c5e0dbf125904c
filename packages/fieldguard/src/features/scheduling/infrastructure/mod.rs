//! Scheduling infrastructure

pub mod scope_file;
pub mod sink;

pub use scope_file::read_scope_file;
pub use sink::{DirSinks, MemorySinks, ReportSink, SinkFactory, StdoutSinks};
