//! Anonymous-struct name resolution
//!
//! Compiler-generated anonymous structs would otherwise never join a shortcut
//! group. A name is borrowed from the other side of a cast (Copy edge with
//! differing struct pointees) or from the paired argument of a block-copy
//! call; structs that never resolve fall back to a shape fingerprint.

use rustc_hash::FxHashSet;
use tracing::info;

use crate::shared::models::{EdgeTag, TypeId, ValueFlowGraph};

use super::super::domain::{declared_usable_name, StructNaming};

pub fn resolve_anonymous_structs(graph: &ValueFlowGraph) -> StructNaming {
    let mut naming = StructNaming::default();

    // anonymous struct types reachable from analysis targets
    let mut anon_gv_types: FxHashSet<TypeId> = FxHashSet::default();
    for gv in &graph.globals {
        if let Some(st) = gv.ty.and_then(|t| graph.types.strip_to_struct(t)) {
            if declared_usable_name(&graph.types, st).is_none() {
                anon_gv_types.insert(st);
            }
        }
    }

    // casts between a named and an unnamed struct donate the name
    for edge in graph.edges() {
        if edge.kind.tag() != EdgeTag::Copy {
            continue;
        }
        let src_st = node_struct(graph, edge.src);
        let dst_st = node_struct(graph, edge.dst);
        let (Some(src_st), Some(dst_st)) = (src_st, dst_st) else {
            continue;
        };
        if src_st == dst_st {
            continue;
        }
        if anon_gv_types.contains(&src_st) {
            if let Some(name) = declared_usable_name(&graph.types, dst_st) {
                naming.resolved.insert(src_st, name.to_string());
                anon_gv_types.remove(&src_st);
            }
        } else if anon_gv_types.contains(&dst_st) {
            if let Some(name) = declared_usable_name(&graph.types, src_st) {
                naming.resolved.insert(dst_st, name.to_string());
                anon_gv_types.remove(&dst_st);
            }
        }
    }

    // block-copy calls pair their first two pointer arguments
    for site in &graph.call_sites {
        let copy_like = site
            .callee
            .as_deref()
            .is_some_and(|name| !name.contains("memset"));
        if !copy_like || site.args.len() < 2 {
            continue;
        }
        let (Some(st1), Some(st2)) = (
            node_struct(graph, site.args[0]),
            node_struct(graph, site.args[1]),
        ) else {
            continue;
        };
        let n1 = declared_usable_name(&graph.types, st1).map(str::to_string);
        let n2 = declared_usable_name(&graph.types, st2).map(str::to_string);
        match (n1, n2) {
            (Some(name), None) => {
                naming.resolved.insert(st2, name);
            }
            (None, Some(name)) => {
                naming.resolved.insert(st1, name);
            }
            _ => {}
        }
    }

    info!(resolved = naming.resolved.len(), "anonymous structs resolved");
    naming
}

fn node_struct(graph: &ValueFlowGraph, node: crate::shared::models::NodeId) -> Option<TypeId> {
    graph
        .node(node)
        .and_then(|n| n.ty)
        .and_then(|t| graph.types.strip_to_struct(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{CallSiteInfo, EdgeKind, GlobalVar, SourceRef, TypeKind};

    fn struct_ptr(g: &mut ValueFlowGraph, name: Option<&str>) -> (TypeId, TypeId) {
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: name.map(str::to_string),
            fields: vec![i64t],
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(st) });
        (st, ptr)
    }

    #[test]
    fn test_cast_donates_name_to_anonymous_global() {
        let mut g = ValueFlowGraph::new();
        let (anon_st, anon_ptr) = struct_ptr(&mut g, None);
        let (_named_st, named_ptr) = struct_ptr(&mut g, Some("struct.dev"));
        let gv = g.add_node(Some(anon_ptr), SourceRef::named("g"));
        let other = g.add_node(Some(named_ptr), SourceRef::named("o"));
        g.add_global(GlobalVar {
            node: gv,
            name: "g".into(),
            ty: Some(anon_ptr),
            is_constant: false,
            section: None,
        });
        g.add_edge(gv, other, EdgeKind::Copy, None, None);

        let naming = resolve_anonymous_structs(&g);
        assert_eq!(naming.resolved.get(&anon_st).map(String::as_str), Some("struct.dev"));
        assert_eq!(
            naming.name_of(&g.types, anon_st).as_deref(),
            Some("struct.dev")
        );
    }

    #[test]
    fn test_copy_call_pairs_argument_types() {
        let mut g = ValueFlowGraph::new();
        let (anon_st, anon_ptr) = struct_ptr(&mut g, None);
        let (_, named_ptr) = struct_ptr(&mut g, Some("struct.buf"));
        let a0 = g.add_node(Some(named_ptr), SourceRef::named("d"));
        let a1 = g.add_node(Some(anon_ptr), SourceRef::named("s"));
        let site = g.add_node(None, SourceRef::named("cs"));
        g.add_call_site(CallSiteInfo {
            node: site,
            args: vec![a0, a1],
            callee: Some("memcpy".into()),
            module: 0,
        });

        let naming = resolve_anonymous_structs(&g);
        assert_eq!(naming.resolved.get(&anon_st).map(String::as_str), Some("struct.buf"));
    }

    #[test]
    fn test_memset_calls_ignored() {
        let mut g = ValueFlowGraph::new();
        let (anon_st, anon_ptr) = struct_ptr(&mut g, None);
        let (_, named_ptr) = struct_ptr(&mut g, Some("struct.buf"));
        let a0 = g.add_node(Some(named_ptr), SourceRef::named("d"));
        let a1 = g.add_node(Some(anon_ptr), SourceRef::named("s"));
        let site = g.add_node(None, SourceRef::named("cs"));
        g.add_call_site(CallSiteInfo {
            node: site,
            args: vec![a0, a1],
            callee: Some("llvm.memset.p0i8.i64".into()),
            module: 0,
        });

        let naming = resolve_anonymous_structs(&g);
        assert!(!naming.resolved.contains_key(&anon_st));
    }

    #[test]
    fn test_unresolved_falls_back_to_fingerprint() {
        let mut g = ValueFlowGraph::new();
        let (anon_st, _) = struct_ptr(&mut g, None);
        let naming = resolve_anonymous_structs(&g);
        assert_eq!(naming.name_of(&g.types, anon_st).as_deref(), Some("1,8"));
    }
}
