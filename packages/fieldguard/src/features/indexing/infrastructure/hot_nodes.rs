//! Static hot-element detection
//!
//! High-fan-out nodes and over-called functions dominate traversal cost while
//! contributing near-zero precision, so they are suppressed up front. Names
//! containing `.` are compiler-generated clones and get the laxer threshold.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::config::IndexingConfig;
use crate::shared::models::{EdgeTag, NodeId, ValueFlowGraph};

use super::super::domain::{CallSummary, SuppressionState};

pub fn detect_hot_elements(
    graph: &ValueFlowGraph,
    summary: &CallSummary,
    cfg: &IndexingConfig,
) -> SuppressionState {
    let mut state = SuppressionState::new();

    // constants and synthetic nodes terminate dataflow; a constant's
    // Address edge marks the value node holding its address
    for node in graph.nodes() {
        if node.source.is_constant || node.source.is_dummy {
            state.suppress(node.id);
            for &e in graph.outgoing(node.id, EdgeTag::Address) {
                if let Some(edge) = graph.edge(e) {
                    state.suppress(edge.dst);
                }
            }
        }
    }

    suppress_hot_call_groups(graph, cfg, &mut state);

    // per-node fan thresholds
    for node in graph.nodes() {
        let id = node.id;
        if graph.incoming(id, EdgeTag::Store).len() as u64 > cfg.hot_base * 50
            || graph.outgoing(id, EdgeTag::Store).len() as u64 > cfg.hot_base * 10
            || graph.outgoing(id, EdgeTag::Copy).len() as u64 > cfg.hot_base * 15
            || graph.outgoing(id, EdgeTag::Load).len() as u64 > cfg.hot_base * 5
        {
            state.suppress(id);
        }
    }

    // over-wide summary fan-outs
    for (&node, targets) in &summary.call_to_ret {
        if targets.len() as u64 > cfg.call_base {
            state.suppress(node);
        }
    }
    for (&node, targets) in &summary.ret_to_call {
        if targets.len() as u64 > cfg.call_base {
            state.suppress(node);
        }
    }
    for (&node, targets) in &summary.formal_to_real {
        if targets.len() as u64 > cfg.call_base {
            state.suppress(node);
        }
    }
    for (&node, targets) in &summary.real_to_formal {
        if targets.len() as u64 * 2 > cfg.call_base * 5 {
            state.suppress(node);
        }
    }

    info!(
        suppressed = state.suppressed_count(),
        "hot-element detection done"
    );
    state
}

fn suppress_hot_call_groups(
    graph: &ValueFlowGraph,
    cfg: &IndexingConfig,
    state: &mut SuppressionState,
) {
    let mut call_counts: FxHashMap<&str, u64> = FxHashMap::default();
    let mut call_nodes: FxHashMap<&str, FxHashSet<NodeId>> = FxHashMap::default();
    let mut ret_counts: FxHashMap<&str, u64> = FxHashMap::default();
    let mut ret_nodes: FxHashMap<&str, FxHashSet<NodeId>> = FxHashMap::default();

    for edge in graph.edges() {
        let Some(call) = edge.kind.call_ref() else {
            continue;
        };
        match edge.kind.tag() {
            EdgeTag::Call => {
                *call_counts.entry(call.callee.as_str()).or_default() += 1;
                call_nodes
                    .entry(call.callee.as_str())
                    .or_default()
                    .insert(edge.dst);
            }
            EdgeTag::Return => {
                *ret_counts.entry(call.callee.as_str()).or_default() += 1;
                ret_nodes
                    .entry(call.callee.as_str())
                    .or_default()
                    .insert(edge.src);
            }
            _ => {}
        }
    }

    for (callee, count) in call_counts {
        let arity = graph.function(callee).map_or(0, |f| f.params.len()) as u64;
        let per_slot = count / (arity + 1);
        if over_group_threshold(callee, per_slot, cfg.call_base) {
            for &node in &call_nodes[callee] {
                state.suppress(node);
            }
            state.mark_hot_call(callee.to_string());
        }
    }
    for (callee, count) in ret_counts {
        if over_group_threshold(callee, count, cfg.call_base) {
            for &node in &ret_nodes[callee] {
                state.suppress(node);
            }
            state.mark_hot_ret(callee.to_string());
        }
    }
}

fn over_group_threshold(name: &str, value: u64, base: u64) -> bool {
    if value > base * 5 {
        !name.contains('.') || value > base * 10
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{CallRef, EdgeKind, FunctionInfo, SourceRef};

    fn small_cfg() -> IndexingConfig {
        IndexingConfig {
            call_base: 1,
            hot_base: 1,
            shortcut_threshold: 300,
        }
    }

    #[test]
    fn test_constant_nodes_suppressed() {
        let mut g = ValueFlowGraph::new();
        let c = g.add_node(None, SourceRef::constant());
        let n = g.add_node(None, SourceRef::named("v"));
        let s = detect_hot_elements(&g, &CallSummary::default(), &small_cfg());
        assert!(s.is_suppressed(c));
        assert!(!s.is_suppressed(n));
    }

    #[test]
    fn test_constant_address_target_suppressed() {
        let mut g = ValueFlowGraph::new();
        let c = g.add_node(None, SourceRef::constant());
        let held = g.add_node(None, SourceRef::named("held"));
        let other = g.add_node(None, SourceRef::named("other"));
        g.add_edge(c, held, EdgeKind::Address, None, None);
        g.add_edge(other, held, EdgeKind::Copy, None, None);
        let s = detect_hot_elements(&g, &CallSummary::default(), &small_cfg());
        assert!(s.is_suppressed(held));
        assert!(!s.is_suppressed(other));
    }

    #[test]
    fn test_wide_store_fan_in_suppressed() {
        let mut g = ValueFlowGraph::new();
        let sink = g.add_node(None, SourceRef::named("sink"));
        for i in 0..60 {
            let src = g.add_node(None, SourceRef::named(format!("s{i}")));
            g.add_edge(src, sink, EdgeKind::Store, None, None);
        }
        let s = detect_hot_elements(&g, &CallSummary::default(), &small_cfg());
        assert!(s.is_suppressed(sink));
    }

    #[test]
    fn test_over_called_function_suppressed() {
        let mut g = ValueFlowGraph::new();
        let formal = g.add_node(None, SourceRef::named("p"));
        g.add_function(FunctionInfo {
            name: "hot".into(),
            params: vec![formal],
            return_nodes: vec![],
            returns_pointer: false,
            section: None,
        });
        for i in 0..12 {
            let site = g.add_node(None, SourceRef::named(format!("cs{i}")));
            let arg = g.add_node(None, SourceRef::named(format!("a{i}")));
            g.add_edge(
                arg,
                formal,
                EdgeKind::Call(CallRef {
                    callsite: site,
                    callee: "hot".into(),
                }),
                None,
                None,
            );
        }
        let s = detect_hot_elements(&g, &CallSummary::default(), &small_cfg());
        assert!(s.is_suppressed(formal));
        assert!(s.is_hot_call("hot"));
    }

    #[test]
    fn test_dotted_name_needs_higher_count() {
        // 12 calls / (1 arg + 1) = 6 per slot: above 5x base, below 10x
        let mut g = ValueFlowGraph::new();
        let formal = g.add_node(None, SourceRef::named("p"));
        g.add_function(FunctionInfo {
            name: "hot.clone".into(),
            params: vec![formal],
            return_nodes: vec![],
            returns_pointer: false,
            section: None,
        });
        for i in 0..12 {
            let site = g.add_node(None, SourceRef::named(format!("cs{i}")));
            let arg = g.add_node(None, SourceRef::named(format!("a{i}")));
            g.add_edge(
                arg,
                formal,
                EdgeKind::Call(CallRef {
                    callsite: site,
                    callee: "hot.clone".into(),
                }),
                None,
                None,
            );
        }
        let s = detect_hot_elements(&g, &CallSummary::default(), &small_cfg());
        assert!(!s.is_suppressed(formal));
    }
}
