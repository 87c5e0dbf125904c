//! Byte-offset resolution for Gep edges
//!
//! Every Gep edge is classified either as a constant byte offset or as
//! `variant` (field-insensitive). Struct field indices are flattened: nested
//! structs and arrays of structs count their leaf slots, and resolving an
//! index registers the edge in the type shortcut table at every nesting
//! level it crosses. Any resolution failure degrades to `variant`.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::shared::models::{
    EdgeId, EdgeTag, GepIndex, ModuleLayout, NodeId, TypeId, TypeKind, TypeTable, ValueFlowGraph,
};

use super::super::domain::{StructNaming, StructuralOffsets};

/// Gep fan-out above which a raw-index guess is considered unsafe
const RAW_INDEX_FANOUT_CAP: usize = 20;

/// Offset tables plus build-time scratch consumed by bridging construction.
#[derive(Debug, Default)]
pub struct OffsetBuild {
    pub offsets: StructuralOffsets,
    pub type_offset: FxHashMap<String, FxHashMap<i64, Vec<EdgeId>>>,
    /// Per edge: the (struct name, offset) registrations made while resolving
    pub reverse: FxHashMap<EdgeId, Vec<(String, i64)>>,
    /// Last Gep edge producing each node
    pub gep_in: FxHashMap<NodeId, EdgeId>,
}

pub fn collect_byte_offsets(graph: &ValueFlowGraph, naming: &StructNaming) -> OffsetBuild {
    let mut out = OffsetBuild::default();

    for edge in graph.edges() {
        let Some(desc) = edge.kind.gep() else {
            continue;
        };
        out.gep_in.insert(edge.dst, edge.id);

        let Some(layout) = edge.module.and_then(|m| graph.layouts.module(m)) else {
            out.offsets.variant.insert(edge.id);
            continue;
        };

        let resolved = if desc.via_copy_call {
            resolve_copy_call_gep(graph, naming, layout, edge.id, edge.src, desc.index, &mut out)
        } else {
            resolve_plain_gep(graph, naming, layout, edge.id, edge.src, desc.index, &mut out)
        };

        match resolved {
            Some(off) => {
                out.offsets.byte_offset.insert(edge.id, off);
            }
            None => {
                out.offsets.variant.insert(edge.id);
            }
        }
    }

    info!(
        constant = out.offsets.byte_offset.len(),
        variant = out.offsets.variant.len(),
        shortcut_structs = out.type_offset.len(),
        "byte offsets collected"
    );
    out
}

/// Gep embedded in a block-copy call: the declared base type went through a
/// cast, so the struct type is inferred from Copy predecessors. Without one,
/// a small-fan-out base lets the raw index stand in for the byte offset.
fn resolve_copy_call_gep(
    graph: &ValueFlowGraph,
    naming: &StructNaming,
    layout: &ModuleLayout,
    edge: EdgeId,
    src: NodeId,
    index: GepIndex,
    out: &mut OffsetBuild,
) -> Option<i64> {
    if let Some(st) = infer_struct_source(graph, src) {
        return match index {
            GepIndex::Field(i) => {
                regular_struct_visit(&graph.types, layout, naming, st, i, edge, out)
            }
            GepIndex::Element(_) => Some(0),
            GepIndex::Variant => None,
        };
    }
    let raw = match index {
        GepIndex::Field(i) => i64::from(i),
        GepIndex::Element(i) => i,
        GepIndex::Variant => return None,
    };
    if graph.outgoing(src, EdgeTag::Gep).len() < RAW_INDEX_FANOUT_CAP {
        Some(raw)
    } else {
        None
    }
}

fn resolve_plain_gep(
    graph: &ValueFlowGraph,
    naming: &StructNaming,
    layout: &ModuleLayout,
    edge: EdgeId,
    src: NodeId,
    index: GepIndex,
    out: &mut OffsetBuild,
) -> Option<i64> {
    let src_ty = graph.node(src).and_then(|n| n.ty)?;
    let base = graph.types.pointee_base(src_ty)?;
    match (index, graph.types.get(base)?) {
        (GepIndex::Variant, _) => None,
        (GepIndex::Field(i), TypeKind::Struct { .. }) => {
            regular_struct_visit(&graph.types, layout, naming, base, i, edge, out)
        }
        // constant index over a non-struct base is plain element arithmetic
        (GepIndex::Field(i), _) => {
            Some(layout.type_size(&graph.types, base)? as i64 * i64::from(i))
        }
        (GepIndex::Element(_), TypeKind::Struct { .. }) => Some(0),
        (GepIndex::Element(i), _) => Some(layout.type_size(&graph.types, base)? as i64 * i),
    }
}

/// Number of flattened leaf slots a type contributes to its parent struct.
fn flat_count(types: &TypeTable, ty: TypeId) -> u32 {
    match types.get(ty) {
        Some(TypeKind::Struct { fields, .. }) => {
            fields.iter().map(|f| flat_count(types, *f)).sum()
        }
        Some(TypeKind::Array { elem, .. }) => flat_count(types, *elem),
        Some(_) => 1,
        None => 0,
    }
}

/// Byte offset of flattened field `idx` within `st`, registering the edge in
/// the shortcut tables at each struct level the index crosses.
fn regular_struct_visit(
    types: &TypeTable,
    layout: &ModuleLayout,
    naming: &StructNaming,
    st: TypeId,
    idx: u32,
    edge: EdgeId,
    out: &mut OffsetBuild,
) -> Option<i64> {
    let Some(TypeKind::Struct { fields, .. }) = types.get(st) else {
        return None;
    };
    let mut acc = 0u32;
    let mut hit = None;
    for (fi, &fty) in fields.iter().enumerate() {
        let c = flat_count(types, fty);
        if acc + c > idx {
            hit = Some((fi, fty, idx - acc));
            break;
        }
        acc += c;
    }
    let (fi, fty, rel) = hit?;

    let mut off = layout.field_offset(st, fi)? as i64;
    if let Some(inner) = types.strip_arrays_to_struct(fty) {
        off += regular_struct_visit(types, layout, naming, inner, rel, edge, out)?;
    } else if rel != 0 {
        return None;
    }

    if let Some(name) = naming.name_of(types, st) {
        out.type_offset
            .entry(name.clone())
            .or_default()
            .entry(off)
            .or_default()
            .push(edge);
        out.reverse.entry(edge).or_default().push((name, off));
    }
    Some(off)
}

/// Walk Copy predecessors looking for a node typed as pointer-to-struct.
fn infer_struct_source(graph: &ValueFlowGraph, start: NodeId) -> Option<TypeId> {
    let mut visited = FxHashSet::default();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        for &eid in graph.incoming(node, EdgeTag::Copy) {
            let pred = graph.edge(eid)?.src;
            if let Some(ty) = graph.node(pred).and_then(|n| n.ty) {
                if let Some(base) = graph.types.pointee_base(ty) {
                    if matches!(graph.types.get(base), Some(TypeKind::Struct { .. })) {
                        return Some(base);
                    }
                }
            }
            stack.push(pred);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        EdgeKind, GepDescriptor, SourceRef, StructLayout,
    };

    fn layout_for(g: &mut ValueFlowGraph, st: TypeId, size: u64, offs: Vec<u64>) {
        let mut ml = ModuleLayout::new(8);
        ml.struct_layouts.insert(
            st,
            StructLayout {
                size,
                field_offsets: offs,
            },
        );
        g.layouts.insert(0, ml);
    }

    fn gep(index: GepIndex, via_copy_call: bool) -> EdgeKind {
        EdgeKind::Gep(GepDescriptor {
            index,
            via_copy_call,
        })
    }

    #[test]
    fn test_struct_field_offset_and_shortcut() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: Some("struct.cfg".into()),
            fields: vec![i64t, i64t],
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(st) });
        layout_for(&mut g, st, 16, vec![0, 8]);

        let base = g.add_node(Some(ptr), SourceRef::named("b"));
        let field = g.add_node(None, SourceRef::named("f"));
        let e = g.add_edge(base, field, gep(GepIndex::Field(1), false), Some(0), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert_eq!(out.offsets.offset_of(e), Some(8));
        assert_eq!(out.type_offset["struct.cfg"][&8], vec![e]);
        assert_eq!(out.reverse[&e], vec![("struct.cfg".to_string(), 8)]);
        assert_eq!(out.gep_in[&field], e);
    }

    #[test]
    fn test_nested_struct_registers_both_levels() {
        let mut g = ValueFlowGraph::new();
        let i32t = g.types.add(TypeKind::Scalar { size: 4 });
        let inner = g.types.add(TypeKind::Struct {
            name: Some("struct.inner".into()),
            fields: vec![i32t, i32t],
        });
        let outer = g.types.add(TypeKind::Struct {
            name: Some("struct.outer".into()),
            fields: vec![i32t, inner],
        });
        let ptr = g.types.add(TypeKind::Pointer {
            pointee: Some(outer),
        });
        let mut ml = ModuleLayout::new(8);
        ml.struct_layouts.insert(
            inner,
            StructLayout {
                size: 8,
                field_offsets: vec![0, 4],
            },
        );
        ml.struct_layouts.insert(
            outer,
            StructLayout {
                size: 12,
                field_offsets: vec![0, 4],
            },
        );
        g.layouts.insert(0, ml);

        let base = g.add_node(Some(ptr), SourceRef::named("b"));
        let field = g.add_node(None, SourceRef::named("f"));
        // flattened index 2 = second field of the nested struct
        let e = g.add_edge(base, field, gep(GepIndex::Field(2), false), Some(0), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert_eq!(out.offsets.offset_of(e), Some(8));
        assert_eq!(out.type_offset["struct.outer"][&8], vec![e]);
        assert_eq!(out.type_offset["struct.inner"][&4], vec![e]);
    }

    #[test]
    fn test_element_index_on_scalar_array() {
        let mut g = ValueFlowGraph::new();
        let i32t = g.types.add(TypeKind::Scalar { size: 4 });
        let arr = g.types.add(TypeKind::Array {
            elem: i32t,
            count: 10,
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(arr) });
        g.layouts.insert(0, ModuleLayout::new(8));

        let base = g.add_node(Some(ptr), SourceRef::named("b"));
        let elem = g.add_node(None, SourceRef::named("e"));
        let e = g.add_edge(base, elem, gep(GepIndex::Element(3), false), Some(0), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert_eq!(out.offsets.offset_of(e), Some(12));
    }

    #[test]
    fn test_variant_and_missing_layout_degrade() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: Some("struct.s".into()),
            fields: vec![i64t],
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(st) });
        layout_for(&mut g, st, 8, vec![0]);

        let base = g.add_node(Some(ptr), SourceRef::named("b"));
        let d1 = g.add_node(None, SourceRef::named("d1"));
        let d2 = g.add_node(None, SourceRef::named("d2"));
        let variant = g.add_edge(base, d1, gep(GepIndex::Variant, false), Some(0), None);
        // module 9 has no layout
        let orphan = g.add_edge(base, d2, gep(GepIndex::Field(0), false), Some(9), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert!(out.offsets.is_variant(variant));
        assert!(out.offsets.is_variant(orphan));
    }

    #[test]
    fn test_copy_call_gep_infers_struct_through_copies() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: Some("struct.msg".into()),
            fields: vec![i64t, i64t],
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(st) });
        layout_for(&mut g, st, 16, vec![0, 8]);

        let typed = g.add_node(Some(ptr), SourceRef::named("typed"));
        let casted = g.add_node(None, SourceRef::named("casted"));
        let field = g.add_node(None, SourceRef::named("f"));
        g.add_edge(typed, casted, EdgeKind::Copy, Some(0), None);
        let e = g.add_edge(casted, field, gep(GepIndex::Field(1), true), Some(0), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert_eq!(out.offsets.offset_of(e), Some(8));
        assert_eq!(out.type_offset["struct.msg"][&8], vec![e]);
    }

    #[test]
    fn test_copy_call_gep_without_struct_uses_raw_index() {
        let mut g = ValueFlowGraph::new();
        let untyped = g.add_node(None, SourceRef::named("u"));
        let field = g.add_node(None, SourceRef::named("f"));
        g.layouts.insert(0, ModuleLayout::new(8));
        let e = g.add_edge(untyped, field, gep(GepIndex::Field(24), true), Some(0), None);

        let out = collect_byte_offsets(&g, &StructNaming::default());
        assert_eq!(out.offsets.offset_of(e), Some(24));
    }
}
