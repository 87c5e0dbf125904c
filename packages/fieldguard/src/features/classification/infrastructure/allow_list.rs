//! Init-function allow-list loading

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{info, warn};

/// Reads function names (whitespace separated) whose writes count as
/// initialization. A missing or unreadable file yields an empty list.
pub fn read_allow_list(path: &Path) -> FxHashSet<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            warn!(path = %path.display(), %err, "allow-list not readable, continuing without");
            return FxHashSet::default();
        }
    };
    let names: FxHashSet<String> = content
        .split_whitespace()
        .map(str::to_string)
        .collect();
    info!(count = names.len(), "init-function allow-list loaded");
    names
}
