//! Propagation infrastructure

pub mod engine;

pub use engine::AliasEngine;
