//! Value-flow nodes and their source provenance

use serde::{Deserialize, Serialize};

use super::types::TypeId;

/// Unique identifier for nodes in the value-flow graph
pub type NodeId = u32;

/// What a node corresponds to in the analyzed program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRef {
    /// Symbol name, if the node is tied to a named value
    pub name: Option<String>,
    /// Program constant (literal, constant aggregate). Constants terminate
    /// traversal and are excluded from hot-node promotion.
    pub is_constant: bool,
    /// Synthetic node with no program counterpart (formal-return slots,
    /// varargs bundles). Excluded from hot-node promotion.
    pub is_dummy: bool,
    /// Global placed in a dedicated linker section
    pub has_section: bool,
}

impl SourceRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn constant() -> Self {
        Self {
            is_constant: true,
            ..Self::default()
        }
    }
}

/// A value-flow graph node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfgNode {
    pub id: NodeId,
    /// Static type of the value this node carries, if known
    pub ty: Option<TypeId>,
    pub source: SourceRef,
}

impl VfgNode {
    pub fn name(&self) -> Option<&str> {
        self.source.name.as_deref()
    }
}
