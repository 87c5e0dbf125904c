//! Worker-pool scheduling
//!
//! A fixed pool of OS threads drains one shared queue of target variables.
//! Each worker owns its output sink, so reports never interleave within a
//! file. Per-target failures stay inside the worker; a broken sink write is
//! logged and the worker moves on to the next target.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

use crate::config::FieldguardConfig;
use crate::errors::Result;
use crate::features::classification::ResultClassifier;
use crate::features::indexing::GraphIndex;
use crate::features::propagation::VariableAnalyzer;
use crate::shared::models::{GlobalVar, ValueFlowGraph};

use super::domain::{resolve_scope, TargetScope};
use super::infrastructure::SinkFactory;

pub struct Scheduler<'a> {
    graph: &'a ValueFlowGraph,
    index: &'a GraphIndex,
    config: &'a FieldguardConfig,
    allow_list: &'a FxHashSet<String>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        graph: &'a ValueFlowGraph,
        index: &'a GraphIndex,
        config: &'a FieldguardConfig,
        allow_list: &'a FxHashSet<String>,
    ) -> Self {
        Self {
            graph,
            index,
            config,
            allow_list,
        }
    }

    /// Analyzes every variable in `scope`, returning how many were processed.
    pub fn run(&self, scope: &TargetScope, sinks: &dyn SinkFactory) -> Result<usize> {
        let targets = resolve_scope(self.graph, scope)?;
        let threads = self.config.parallel.threads.max(1).min(targets.len());
        info!(
            targets = targets.len(),
            threads,
            legacy = self.config.parallel.legacy_report,
            "scheduling analysis"
        );

        let queue: Mutex<VecDeque<usize>> = Mutex::new((0..targets.len()).collect());
        std::thread::scope(|s| {
            let queue = &queue;
            let targets = &targets;
            for worker in 0..threads {
                s.spawn(move || self.drain(worker, queue, targets, sinks));
            }
        });
        Ok(targets.len())
    }

    fn drain(
        &self,
        worker: usize,
        queue: &Mutex<VecDeque<usize>>,
        targets: &[&GlobalVar],
        sinks: &dyn SinkFactory,
    ) {
        let mut sink = match sinks.create(worker) {
            Ok(sink) => sink,
            Err(err) => {
                warn!(worker, %err, "sink unavailable, worker exits");
                return;
            }
        };
        let analyzer = VariableAnalyzer::new(self.graph, self.index, &self.config.analysis);
        let classifier = ResultClassifier::new(
            self.graph,
            &self.config.analysis,
            self.allow_list,
            self.config.parallel.legacy_report,
        );
        loop {
            let next = queue.lock().pop_front();
            let Some(i) = next else {
                break;
            };
            let gv = targets[i];
            let result = analyzer.analyze(gv.node);
            let cls = classifier.classify(&result);
            let text = classifier.render(gv, &cls);
            if let Err(err) = sink.write_report(&text) {
                warn!(worker, variable = %gv.name, %err, "report write failed");
            }
        }
    }
}
