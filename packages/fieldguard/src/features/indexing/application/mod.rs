//! Index build orchestration
//!
//! Runs the construction passes in dependency order: the call summary feeds
//! hot-element detection, suppression feeds Phi adjacency, naming feeds
//! offset resolution, and offset scratch tables feed bridging.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::IndexingConfig;
use crate::shared::models::ValueFlowGraph;

use super::domain::{GraphIndex, IndexStats, ShortcutTables};
use super::infrastructure::{
    collect_byte_offsets, detect_hot_elements, process_cast_sites, read_call_graph,
    resolve_anonymous_structs, setup_bridging, setup_call_summary, setup_phi_select, RawCallGraph,
};

pub struct GraphIndexer;

impl GraphIndexer {
    /// Build the full pre-analysis index for one graph.
    pub fn build(
        graph: &ValueFlowGraph,
        config: &IndexingConfig,
        call_graph_path: Option<&Path>,
    ) -> GraphIndex {
        let raw = call_graph_path.map_or_else(RawCallGraph::default, read_call_graph);
        let calls = setup_call_summary(graph, &raw);

        let suppression = detect_hot_elements(graph, &calls, config);
        let phi_select = setup_phi_select(graph, &suppression);
        let naming = resolve_anonymous_structs(graph);

        let offset_build = collect_byte_offsets(graph, &naming);
        let bridging = setup_bridging(graph, &offset_build);
        let cast_sites = process_cast_sites(graph, &naming);

        let stats = IndexStats {
            suppressed_nodes: suppression.suppressed_count(),
            phi_entries: phi_select.phi_in.len(),
            select_entries: phi_select.select_in.len(),
            resolved_structs: naming.resolved.len(),
            offset_edges: offset_build.offsets.byte_offset.len(),
            variant_edges: offset_build.offsets.variant.len(),
            type_shortcut_groups: offset_build.type_offset.len(),
            bridging_groups: bridging.len(),
            cast_site_groups: cast_sites.len(),
            summary_links: calls.real_to_formal.len() + calls.ret_to_call.len(),
        };
        info!(?stats, "graph index built");

        GraphIndex {
            suppression: Arc::new(suppression),
            phi_select,
            offsets: offset_build.offsets,
            shortcuts: ShortcutTables {
                type_offset: offset_build.type_offset,
                bridging,
                cast_sites,
            },
            naming,
            calls,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        EdgeKind, GepDescriptor, GepIndex, ModuleLayout, SourceRef, StructLayout, TypeKind,
    };

    #[test]
    fn test_indexer_runs_all_passes() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: Some("struct.cfg".into()),
            fields: vec![i64t, i64t],
        });
        let ptr = g.types.add(TypeKind::Pointer { pointee: Some(st) });
        let mut ml = ModuleLayout::new(8);
        ml.struct_layouts.insert(
            st,
            StructLayout {
                size: 16,
                field_offsets: vec![0, 8],
            },
        );
        g.layouts.insert(0, ml);

        let base = g.add_node(Some(ptr), SourceRef::named("g"));
        let f = g.add_node(None, SourceRef::named("f"));
        g.add_edge(
            base,
            f,
            EdgeKind::Gep(GepDescriptor {
                index: GepIndex::Field(1),
                via_copy_call: false,
            }),
            Some(0),
            None,
        );

        let index = GraphIndexer::build(&g, &IndexingConfig::default(), None);
        assert_eq!(index.stats.offset_edges, 1);
        assert!(index.shortcuts.type_group("struct.cfg", 8).is_some());
        assert!(index.calls.is_empty());
    }
}
