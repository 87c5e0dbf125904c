//! Classification application service

use rustc_hash::FxHashSet;

use crate::config::AnalysisConfig;
use crate::features::propagation::AliasResult;
use crate::shared::models::{GlobalVar, ValueFlowGraph};

use super::domain::VariableClassification;
use super::infrastructure::{classify, render_detailed, render_legacy};

/// Turns one variable's alias sets into a rendered report.
pub struct ResultClassifier<'a> {
    graph: &'a ValueFlowGraph,
    config: &'a AnalysisConfig,
    allow_list: &'a FxHashSet<String>,
    legacy: bool,
}

impl<'a> ResultClassifier<'a> {
    pub fn new(
        graph: &'a ValueFlowGraph,
        config: &'a AnalysisConfig,
        allow_list: &'a FxHashSet<String>,
        legacy: bool,
    ) -> Self {
        Self {
            graph,
            config,
            allow_list,
            legacy,
        }
    }

    pub fn classify(&self, result: &AliasResult) -> VariableClassification {
        classify(self.graph, result, self.config, self.allow_list)
    }

    pub fn render(&self, gv: &GlobalVar, cls: &VariableClassification) -> String {
        if self.legacy {
            render_legacy(cls)
        } else {
            render_detailed(self.graph, gv, cls)
        }
    }
}
