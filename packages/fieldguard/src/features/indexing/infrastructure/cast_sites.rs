//! Cast-site collection
//!
//! A Copy edge whose endpoints disagree on type is a cast. When either side
//! points to a struct, the edge is recorded under that struct's group name so
//! backward Gep traversal can re-enter the dataflow on the far side of the
//! cast.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::shared::models::{EdgeId, EdgeTag, ValueFlowGraph};

use super::super::domain::StructNaming;

pub fn process_cast_sites(
    graph: &ValueFlowGraph,
    naming: &StructNaming,
) -> FxHashMap<String, Vec<EdgeId>> {
    let mut groups: FxHashMap<String, FxHashSet<EdgeId>> = FxHashMap::default();

    for edge in graph.edges() {
        if edge.kind.tag() != EdgeTag::Copy {
            continue;
        }
        let src_ty = graph.node(edge.src).and_then(|n| n.ty);
        let dst_ty = graph.node(edge.dst).and_then(|n| n.ty);
        if src_ty == dst_ty {
            continue;
        }
        for ty in [src_ty, dst_ty].into_iter().flatten() {
            if let Some(st) = graph.types.strip_to_struct(ty) {
                if let Some(name) = naming.name_of(&graph.types, st) {
                    groups.entry(name).or_default().insert(edge.id);
                }
            }
        }
    }

    let table: FxHashMap<String, Vec<EdgeId>> = groups
        .into_iter()
        .map(|(name, set)| {
            let mut v: Vec<EdgeId> = set.into_iter().collect();
            v.sort_unstable();
            (name, v)
        })
        .collect();
    info!(structs = table.len(), "cast sites collected");
    table
}
