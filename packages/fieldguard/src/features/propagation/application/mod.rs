//! Propagation application service
//!
//! Thin facade the scheduler drives: one analyzer per run, one engine per
//! target. Engines are cheap to construct, so every target starts from a
//! clean path state while still sharing the immutable index.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::features::indexing::GraphIndex;
use crate::shared::models::{NodeId, ValueFlowGraph};

use super::domain::AliasResult;
use super::infrastructure::AliasEngine;

/// Runs flows-to traversals against one indexed graph.
pub struct VariableAnalyzer<'a> {
    graph: &'a ValueFlowGraph,
    index: &'a GraphIndex,
    config: &'a AnalysisConfig,
}

impl<'a> VariableAnalyzer<'a> {
    pub fn new(
        graph: &'a ValueFlowGraph,
        index: &'a GraphIndex,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            graph,
            index,
            config,
        }
    }

    /// Collects the per-offset alias sets reachable from `target`.
    pub fn analyze(&self, target: NodeId) -> AliasResult {
        let result = AliasEngine::new(self.graph, self.index, self.config).run(target);
        debug!(
            target,
            name = self.graph.node_name(target).unwrap_or("<unnamed>"),
            offsets = result.field_count(),
            visits = result.stats.visits,
            "target analyzed"
        );
        result
    }
}
