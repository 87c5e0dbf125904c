//! Protect/Written decision per field offset
//!
//! A field is protectable when every node denoting it is only stored to from
//! initialization code. Writers are judged by the enclosing function of each
//! incoming Store edge: functions placed in an init section, or named in the
//! user-supplied allow-list, do not disqualify protection. Store edges with
//! no attributable function are tolerated and skipped.

use rustc_hash::FxHashSet;

use crate::config::AnalysisConfig;
use crate::features::propagation::AliasResult;
use crate::shared::models::{EdgeTag, NodeId, ValueFlowGraph};

use super::super::domain::{FieldClass, FieldStatus, VariableClassification};

pub fn classify(
    graph: &ValueFlowGraph,
    result: &AliasResult,
    config: &AnalysisConfig,
    allow_list: &FxHashSet<String>,
) -> VariableClassification {
    let mut fields = std::collections::BTreeMap::new();
    for (&offset, nodes) in &result.aliases {
        let protectable = nodes
            .iter()
            .all(|&n| node_only_written_in_init(graph, n, config, allow_list));
        let status = if protectable {
            FieldStatus::Protect
        } else {
            FieldStatus::Written
        };
        fields.insert(
            offset,
            FieldClass {
                status,
                alias_count: nodes.len(),
            },
        );
    }
    VariableClassification {
        target: result.target,
        name: graph
            .node_name(result.target)
            .unwrap_or("<unnamed>")
            .to_string(),
        fields,
    }
}

fn node_only_written_in_init(
    graph: &ValueFlowGraph,
    node: NodeId,
    config: &AnalysisConfig,
    allow_list: &FxHashSet<String>,
) -> bool {
    for &e in graph.incoming(node, EdgeTag::Store) {
        let Some(edge) = graph.edge(e) else {
            continue;
        };
        let Some(func_name) = edge.in_function.as_deref() else {
            continue;
        };
        if allow_list.contains(func_name) {
            continue;
        }
        let in_init = graph
            .function(func_name)
            .and_then(|f| f.section.as_deref())
            .is_some_and(|s| config.is_init_section(s));
        if !in_init {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexingConfig;
    use crate::features::indexing::GraphIndexer;
    use crate::features::propagation::VariableAnalyzer;
    use crate::shared::models::{EdgeKind, SourceRef};

    fn graph_with_writer(section: Option<&str>) -> (ValueFlowGraph, NodeId) {
        let mut g = ValueFlowGraph::new();
        let gv = g.add_node(None, SourceRef::named("gv"));
        let v = g.add_node(None, SourceRef::named("v"));
        g.add_edge(v, gv, EdgeKind::Store, None, Some("writer".into()));
        g.add_function(crate::shared::models::FunctionInfo {
            name: "writer".into(),
            params: vec![],
            return_nodes: vec![],
            returns_pointer: false,
            section: section.map(str::to_string),
        });
        (g, gv)
    }

    fn classify_single(g: &ValueFlowGraph, gv: NodeId, allow: &[&str]) -> VariableClassification {
        let index = GraphIndexer::build(g, &IndexingConfig::default(), None);
        let config = AnalysisConfig {
            stat_window: 0,
            ..AnalysisConfig::default()
        };
        let result = VariableAnalyzer::new(g, &index, &config).analyze(gv);
        let allow_list = allow.iter().map(|s| s.to_string()).collect();
        classify(g, &result, &config, &allow_list)
    }

    #[test]
    fn test_init_section_writer_keeps_field_protectable() {
        let (g, gv) = graph_with_writer(Some(".init.text"));
        let cls = classify_single(&g, gv, &[]);
        assert_eq!(cls.fields[&0].status, FieldStatus::Protect);
    }

    #[test]
    fn test_runtime_writer_flips_to_written() {
        let (g, gv) = graph_with_writer(Some(".text"));
        let cls = classify_single(&g, gv, &[]);
        assert_eq!(cls.fields[&0].status, FieldStatus::Written);
    }

    #[test]
    fn test_allow_list_flips_back_to_protect() {
        let (g, gv) = graph_with_writer(Some(".text"));
        let cls = classify_single(&g, gv, &["writer"]);
        assert_eq!(cls.fields[&0].status, FieldStatus::Protect);
    }

    #[test]
    fn test_unattributable_store_is_skipped() {
        let mut g = ValueFlowGraph::new();
        let gv = g.add_node(None, SourceRef::named("gv"));
        let v = g.add_node(None, SourceRef::named("v"));
        g.add_edge(v, gv, EdgeKind::Store, None, None);
        let cls = classify_single(&g, gv, &[]);
        assert_eq!(cls.fields[&0].status, FieldStatus::Protect);
    }
}
