//! External call-graph consumption
//!
//! The call graph arrives as a whitespace-separated file of
//! `<callsite-node-id> <callee-count> <callee-name>...` records, produced by
//! a separate resolution pass. Records referencing unknown call sites or
//! functions are dropped; a missing or malformed file degrades to an empty
//! summary so the engine falls back to plain Call/Return edges.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::shared::models::{NodeId, ValueFlowGraph};

use super::super::domain::CallSummary;

/// Parsed call graph: call-site node to candidate callee names.
pub type RawCallGraph = FxHashMap<NodeId, Vec<String>>;

pub fn read_call_graph(path: &Path) -> RawCallGraph {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "call graph unreadable, summary disabled");
            return RawCallGraph::default();
        }
    };
    match parse_call_graph(&text) {
        Some(map) => map,
        None => {
            warn!(path = %path.display(), "call graph malformed, summary disabled");
            RawCallGraph::default()
        }
    }
}

fn parse_call_graph(text: &str) -> Option<RawCallGraph> {
    let mut map = RawCallGraph::default();
    let mut tokens = text.split_whitespace();
    while let Some(site_tok) = tokens.next() {
        let site: NodeId = site_tok.parse().ok()?;
        let count: usize = tokens.next()?.parse().ok()?;
        let entry = map.entry(site).or_default();
        for _ in 0..count {
            entry.push(tokens.next()?.to_string());
        }
    }
    Some(map)
}

/// Build the four summary maps from the raw call graph.
///
/// A callee is linked only when its arity matches the call site's; return
/// links require a pointer-returning callee and at least one argument pair.
pub fn setup_call_summary(graph: &ValueFlowGraph, raw: &RawCallGraph) -> CallSummary {
    let mut real_to_formal: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();
    let mut formal_to_real: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();
    let mut ret_to_call: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();
    let mut call_to_ret: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();

    let sites: FxHashMap<NodeId, usize> = graph
        .call_sites
        .iter()
        .enumerate()
        .map(|(i, cs)| (cs.node, i))
        .collect();

    for (site_node, callees) in raw {
        let Some(&site_idx) = sites.get(site_node) else {
            continue;
        };
        let site = &graph.call_sites[site_idx];
        for callee_name in callees {
            let Some(func) = graph.function(callee_name) else {
                continue;
            };
            if func.params.len() != site.args.len() {
                continue;
            }
            for (&real, &formal) in site.args.iter().zip(&func.params) {
                real_to_formal.entry(real).or_default().insert(formal);
                formal_to_real.entry(formal).or_default().insert(real);
            }
            if !site.args.is_empty() && func.returns_pointer {
                for &ret in &func.return_nodes {
                    ret_to_call.entry(ret).or_default().insert(site.node);
                    call_to_ret.entry(site.node).or_default().insert(ret);
                }
            }
        }
    }

    let summary = CallSummary {
        real_to_formal: freeze(real_to_formal),
        formal_to_real: freeze(formal_to_real),
        ret_to_call: freeze(ret_to_call),
        call_to_ret: freeze(call_to_ret),
    };
    info!(
        real_to_formal = summary.real_to_formal.len(),
        formal_to_real = summary.formal_to_real.len(),
        ret_to_call = summary.ret_to_call.len(),
        call_to_ret = summary.call_to_ret.len(),
        "call summary ready"
    );
    summary
}

fn freeze(map: FxHashMap<NodeId, FxHashSet<NodeId>>) -> FxHashMap<NodeId, Vec<NodeId>> {
    map.into_iter()
        .map(|(k, set)| {
            let mut v: Vec<NodeId> = set.into_iter().collect();
            v.sort_unstable();
            (k, v)
        })
        .collect()
}
