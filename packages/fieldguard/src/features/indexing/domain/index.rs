//! Pre-analysis index tables
//!
//! Built once per graph, read-only during traversal. All shortcut tables key
//! on normalized struct names so every per-unit clone of a struct shares one
//! group.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::{EdgeId, NodeId, TypeId, TypeTable};

use super::suppression::SuppressionState;

/// Operand/result adjacency for Phi and Select statements.
///
/// Phi and Select are hyperedges in the source graph; the engine wants them
/// as plain `(edge, other endpoint)` fan-outs in both directions.
#[derive(Debug, Default)]
pub struct PhiSelectAdjacency {
    pub phi_in: FxHashMap<NodeId, Vec<(EdgeId, NodeId)>>,
    pub phi_out: FxHashMap<NodeId, Vec<(EdgeId, NodeId)>>,
    pub select_in: FxHashMap<NodeId, Vec<(EdgeId, NodeId)>>,
    pub select_out: FxHashMap<NodeId, Vec<(EdgeId, NodeId)>>,
}

const EMPTY_ADJ: &[(EdgeId, NodeId)] = &[];

impl PhiSelectAdjacency {
    pub fn phi_sources(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.phi_in.get(&node).map_or(EMPTY_ADJ, Vec::as_slice)
    }

    pub fn phi_targets(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.phi_out.get(&node).map_or(EMPTY_ADJ, Vec::as_slice)
    }

    pub fn select_sources(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.select_in.get(&node).map_or(EMPTY_ADJ, Vec::as_slice)
    }

    pub fn select_targets(&self, node: NodeId) -> &[(EdgeId, NodeId)] {
        self.select_out.get(&node).map_or(EMPTY_ADJ, Vec::as_slice)
    }
}

/// Byte-offset classification of every Gep edge.
///
/// An edge is in exactly one of the two tables; edges in neither failed
/// resolution so badly the build degraded them to `variant` too.
#[derive(Debug, Default)]
pub struct StructuralOffsets {
    pub byte_offset: FxHashMap<EdgeId, i64>,
    pub variant: FxHashSet<EdgeId>,
}

impl StructuralOffsets {
    pub fn offset_of(&self, edge: EdgeId) -> Option<i64> {
        self.byte_offset.get(&edge).copied()
    }

    pub fn is_variant(&self, edge: EdgeId) -> bool {
        self.variant.contains(&edge)
    }
}

/// Shortcut tables for backward Gep traversal
#[derive(Debug, Default)]
pub struct ShortcutTables {
    /// Field-to-field: all Gep edges producing `offset` of struct `name`
    pub type_offset: FxHashMap<String, FxHashMap<i64, Vec<EdgeId>>>,
    /// Bridging links discovered from store patterns; each entry names
    /// another `type_offset` group
    pub bridging: FxHashMap<String, FxHashMap<i64, FxHashSet<(String, i64)>>>,
    /// Copy edges that change the observed type of a struct pointer
    pub cast_sites: FxHashMap<String, Vec<EdgeId>>,
}

impl ShortcutTables {
    pub fn type_group(&self, name: &str, offset: i64) -> Option<&Vec<EdgeId>> {
        self.type_offset.get(name).and_then(|m| m.get(&offset))
    }

    pub fn bridging_groups(&self, name: &str, offset: i64) -> Option<&FxHashSet<(String, i64)>> {
        self.bridging.get(name).and_then(|m| m.get(&offset))
    }

    /// Cast-site group size; absent group counts as empty.
    pub fn cast_group_len(&self, name: &str) -> usize {
        self.cast_sites.get(name).map_or(0, Vec::len)
    }
}

/// Resolved names for structs with no usable declared name
#[derive(Debug, Default)]
pub struct StructNaming {
    pub resolved: FxHashMap<TypeId, String>,
}

impl StructNaming {
    /// Effective shortcut-group name of a struct type.
    ///
    /// Declared names win; resolved anonymous structs use their donor's name;
    /// the rest fall back to a `fields,size` shape fingerprint so structurally
    /// identical anonymous structs still group together.
    pub fn name_of(&self, types: &TypeTable, ty: TypeId) -> Option<String> {
        if let Some(name) = declared_usable_name(types, ty) {
            return Some(name.to_string());
        }
        if let Some(name) = self.resolved.get(&ty) {
            return Some(name.clone());
        }
        types.get(ty).map(|_| shape_fingerprint(types, ty))
    }
}

/// Declared struct name, unless it is compiler-generated anonymous.
pub fn declared_usable_name(types: &TypeTable, ty: TypeId) -> Option<&str> {
    let name = types.declared_struct_name(ty)?;
    if name.contains(".anon.") {
        return None;
    }
    Some(name)
}

/// `fieldcount,bytesize` shape key for unnamed structs. Sizes are computed
/// without padding (pointer = 8) so the key is layout independent.
pub fn shape_fingerprint(types: &TypeTable, ty: TypeId) -> String {
    format!("{},{}", types.field_count(ty), manual_type_size(types, ty))
}

/// Padding-free recursive byte size, usable without a module layout.
pub fn manual_type_size(types: &TypeTable, ty: TypeId) -> u64 {
    use crate::shared::models::TypeKind;
    match types.get(ty) {
        Some(TypeKind::Scalar { size }) => *size,
        Some(TypeKind::Pointer { .. }) => 8,
        Some(TypeKind::Array { elem, count }) => manual_type_size(types, *elem) * count,
        Some(TypeKind::Struct { fields, .. }) => {
            fields.iter().map(|f| manual_type_size(types, *f)).sum()
        }
        None => 0,
    }
}

/// Interprocedural summary jumps from the external call graph
#[derive(Debug, Default)]
pub struct CallSummary {
    pub real_to_formal: FxHashMap<NodeId, Vec<NodeId>>,
    pub formal_to_real: FxHashMap<NodeId, Vec<NodeId>>,
    pub ret_to_call: FxHashMap<NodeId, Vec<NodeId>>,
    pub call_to_ret: FxHashMap<NodeId, Vec<NodeId>>,
}

const EMPTY_NODES: &[NodeId] = &[];

impl CallSummary {
    pub fn formals_of(&self, real: NodeId) -> &[NodeId] {
        self.real_to_formal
            .get(&real)
            .map_or(EMPTY_NODES, Vec::as_slice)
    }

    pub fn reals_of(&self, formal: NodeId) -> &[NodeId] {
        self.formal_to_real
            .get(&formal)
            .map_or(EMPTY_NODES, Vec::as_slice)
    }

    pub fn callsites_of(&self, ret: NodeId) -> &[NodeId] {
        self.ret_to_call
            .get(&ret)
            .map_or(EMPTY_NODES, Vec::as_slice)
    }

    pub fn returns_of(&self, callsite: NodeId) -> &[NodeId] {
        self.call_to_ret
            .get(&callsite)
            .map_or(EMPTY_NODES, Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.real_to_formal.is_empty()
            && self.formal_to_real.is_empty()
            && self.ret_to_call.is_empty()
            && self.call_to_ret.is_empty()
    }
}

/// Build-phase counters, logged once after indexing
#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    pub suppressed_nodes: usize,
    pub phi_entries: usize,
    pub select_entries: usize,
    pub resolved_structs: usize,
    pub offset_edges: usize,
    pub variant_edges: usize,
    pub type_shortcut_groups: usize,
    pub bridging_groups: usize,
    pub cast_site_groups: usize,
    pub summary_links: usize,
}

/// Everything the propagation engine consumes besides the graph itself
#[derive(Debug)]
pub struct GraphIndex {
    pub suppression: Arc<SuppressionState>,
    pub phi_select: PhiSelectAdjacency,
    pub offsets: StructuralOffsets,
    pub shortcuts: ShortcutTables,
    pub naming: StructNaming,
    pub calls: CallSummary,
    pub stats: IndexStats,
}
