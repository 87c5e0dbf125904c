//! Scope-file loading

use std::path::Path;

use tracing::info;

use crate::errors::{FieldguardError, Result};
use crate::features::scheduling::domain::TargetScope;

/// Reads an explicit scope: one variable name per whitespace-separated token.
/// A missing or empty file is fatal, the run would have nothing to analyze.
pub fn read_scope_file(path: &Path) -> Result<TargetScope> {
    let content = std::fs::read_to_string(path)?;
    let names: Vec<String> = content.split_whitespace().map(str::to_string).collect();
    if names.is_empty() {
        return Err(FieldguardError::config(format!(
            "scope file {} names no variables",
            path.display()
        )));
    }
    info!(count = names.len(), "explicit scope loaded");
    Ok(TargetScope::Explicit(names))
}
