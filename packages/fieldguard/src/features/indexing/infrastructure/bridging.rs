//! Bridging shortcut construction
//!
//! A store whose value was loaded from field (A, off_a) into field (B, off_b)
//! moves data between differently-named struct groups. Bridging links let
//! backward Gep traversal jump from (B, off_b) straight into the (A, off_a)
//! type-shortcut group. This is a heuristic over Copy-transitive sources of
//! both sides of every Store edge.

use rustc_hash::FxHashSet;
use tracing::info;

use crate::shared::models::{EdgeTag, NodeId, ValueFlowGraph};

use super::byte_offsets::OffsetBuild;

pub type BridgingTable =
    rustc_hash::FxHashMap<String, rustc_hash::FxHashMap<i64, FxHashSet<(String, i64)>>>;

pub fn setup_bridging(graph: &ValueFlowGraph, build: &OffsetBuild) -> BridgingTable {
    let mut bridging = BridgingTable::default();

    for edge in graph.edges() {
        if edge.kind.tag() != EdgeTag::Store {
            continue;
        }
        let mut value_sources = FxHashSet::default();
        for &load in graph.incoming(edge.src, EdgeTag::Load) {
            if let Some(load_edge) = graph.edge(load) {
                collect_copy_sources(graph, load_edge.src, &mut value_sources);
            }
        }
        if value_sources.is_empty() {
            continue;
        }
        let mut addr_sources = FxHashSet::default();
        collect_copy_sources(graph, edge.dst, &mut addr_sources);

        for &dst_node in &addr_sources {
            let Some(dst_regs) = build.gep_in.get(&dst_node).and_then(|e| build.reverse.get(e))
            else {
                continue;
            };
            for &src_node in &value_sources {
                let Some(src_regs) =
                    build.gep_in.get(&src_node).and_then(|e| build.reverse.get(e))
                else {
                    continue;
                };
                for (src_name, src_off) in src_regs {
                    for (dst_name, dst_off) in dst_regs {
                        if src_name != dst_name {
                            bridging
                                .entry(dst_name.clone())
                                .or_default()
                                .entry(*dst_off)
                                .or_default()
                                .insert((src_name.clone(), *src_off));
                        }
                    }
                }
            }
        }
    }

    info!(structs = bridging.len(), "bridging shortcuts ready");
    bridging
}

/// Node plus everything reachable backwards over Copy edges.
fn collect_copy_sources(graph: &ValueFlowGraph, start: NodeId, out: &mut FxHashSet<NodeId>) {
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !out.insert(node) {
            continue;
        }
        for &eid in graph.incoming(node, EdgeTag::Copy) {
            if let Some(e) = graph.edge(eid) {
                stack.push(e.src);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{EdgeKind, SourceRef};

    #[test]
    fn test_store_links_differently_named_groups() {
        let mut g = ValueFlowGraph::new();
        // value side: gep-produced address a, loaded value v, stored to
        // gep-produced address b of another struct
        let a = g.add_node(None, SourceRef::named("a"));
        let v = g.add_node(None, SourceRef::named("v"));
        let b = g.add_node(None, SourceRef::named("b"));
        g.add_edge(a, v, EdgeKind::Load, None, None);
        g.add_edge(v, b, EdgeKind::Store, None, None);

        let mut build = OffsetBuild::default();
        build.gep_in.insert(a, 10);
        build.gep_in.insert(b, 11);
        build
            .reverse
            .insert(10, vec![("struct.src".to_string(), 8)]);
        build
            .reverse
            .insert(11, vec![("struct.dst".to_string(), 16)]);

        let bridging = setup_bridging(&g, &build);
        let links = &bridging["struct.dst"][&16];
        assert!(links.contains(&("struct.src".to_string(), 8)));
    }

    #[test]
    fn test_same_name_not_linked() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::named("a"));
        let v = g.add_node(None, SourceRef::named("v"));
        let b = g.add_node(None, SourceRef::named("b"));
        g.add_edge(a, v, EdgeKind::Load, None, None);
        g.add_edge(v, b, EdgeKind::Store, None, None);

        let mut build = OffsetBuild::default();
        build.gep_in.insert(a, 10);
        build.gep_in.insert(b, 11);
        build.reverse.insert(10, vec![("struct.s".to_string(), 8)]);
        build.reverse.insert(11, vec![("struct.s".to_string(), 16)]);

        assert!(setup_bridging(&g, &build).is_empty());
    }

    #[test]
    fn test_copy_chain_reaches_gep_source() {
        let mut g = ValueFlowGraph::new();
        let gep_dst = g.add_node(None, SourceRef::named("gd"));
        let mid = g.add_node(None, SourceRef::named("m"));
        let v = g.add_node(None, SourceRef::named("v"));
        let b = g.add_node(None, SourceRef::named("b"));
        g.add_edge(gep_dst, mid, EdgeKind::Copy, None, None);
        g.add_edge(mid, v, EdgeKind::Load, None, None);
        g.add_edge(v, b, EdgeKind::Store, None, None);

        let mut build = OffsetBuild::default();
        build.gep_in.insert(gep_dst, 10);
        build.gep_in.insert(b, 11);
        build
            .reverse
            .insert(10, vec![("struct.one".to_string(), 0)]);
        build
            .reverse
            .insert(11, vec![("struct.two".to_string(), 4)]);

        let bridging = setup_bridging(&g, &build);
        assert!(bridging["struct.two"][&4].contains(&("struct.one".to_string(), 0)));
    }
}
