//! Error types for fieldguard
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

/// Main error type for fieldguard operations
#[derive(Debug, Error)]
pub enum FieldguardError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Graph loading / consistency error
    #[error("graph error: {0}")]
    Graph(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Analysis error
    #[error("analysis error: {0}")]
    Analysis(String),
}

impl FieldguardError {
    /// Create a graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        FieldguardError::Graph(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        FieldguardError::Config(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        FieldguardError::Analysis(msg.into())
    }
}

/// Result type alias for fieldguard operations
pub type Result<T> = std::result::Result<T, FieldguardError>;
