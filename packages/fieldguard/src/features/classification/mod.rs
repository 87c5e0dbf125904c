//! Protect/Written classification and reporting
//!
//! Consumes one variable's per-offset alias sets, judges each offset against
//! the writers observed in the graph, and renders the detailed or legacy
//! report text.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::ResultClassifier;
pub use domain::{FieldClass, FieldStatus, VariableClassification};
pub use infrastructure::read_allow_list;
