//! Analysis scope selection

use tracing::warn;

use crate::errors::{FieldguardError, Result};
use crate::shared::models::{GlobalVar, ValueFlowGraph};

/// Which globals a run analyzes
#[derive(Debug, Clone)]
pub enum TargetScope {
    /// Named variables, in the order given
    Explicit(Vec<String>),
    /// Every global that is writable and carries no explicit section
    Filtered,
}

/// Resolves a scope against the graph's global table.
///
/// Unknown explicit names are logged and skipped. An empty resolution is a
/// configuration error; the run has nothing to do.
pub fn resolve_scope<'a>(
    graph: &'a ValueFlowGraph,
    scope: &TargetScope,
) -> Result<Vec<&'a GlobalVar>> {
    let targets: Vec<&GlobalVar> = match scope {
        TargetScope::Explicit(names) => names
            .iter()
            .filter_map(|name| {
                let found = graph.globals.iter().find(|g| &g.name == name);
                if found.is_none() {
                    warn!(name, "scoped variable not present in graph");
                }
                found
            })
            .collect(),
        TargetScope::Filtered => graph
            .globals
            .iter()
            .filter(|g| !g.is_constant && g.section.is_none())
            .collect(),
    };
    if targets.is_empty() {
        return Err(FieldguardError::config("analysis scope resolved to no variables"));
    }
    Ok(targets)
}
