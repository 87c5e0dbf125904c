//! Feature modules, one vertical slice each
//!
//! Every feature keeps the same internal split:
//! - domain/         - data model and pure logic
//! - application/    - use-case facade the other features call
//! - infrastructure/ - the concrete builders, engines and I/O

pub mod classification;
pub mod indexing;
pub mod propagation;
pub mod scheduling;
