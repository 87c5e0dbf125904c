//! Demand-driven alias traversal
//!
//! One engine analyzes one target. The traversal is the recursive
//! flows-to/alias walk expressed as an explicit step machine: a LIFO step
//! stack replaces native recursion, with state-restoring micro-steps
//! (offset adjustment, frame push/pop, path-membership release) interleaved
//! exactly where the recursive formulation would unwind. Deep value chains
//! therefore cost heap, not call stack.
//!
//! Rules, in expansion order for each node:
//! 1. record the node as an alias when only the root frame is open
//! 2. forward Load closes a zero-offset frame (store/load pairing)
//! 3. backward Store closes a zero-offset reverse frame
//! 4. direct edges: Copy/Select/Phi/Call/Return plus summary jumps,
//!    forward always, backward only under reverse flow
//! 5. forward Store opens a frame; backward Load opens a reverse frame
//! 6. backward Gep consumes field offset, preferring type/bridging/cast
//!    shortcuts over the plain walk; forward Gep produces field offset

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::config::AnalysisConfig;
use crate::features::indexing::GraphIndex;
use crate::shared::models::{EdgeId, EdgeTag, NodeId, TypeId, ValueFlowGraph};

use super::super::domain::{AliasMap, AliasResult, EngineStats, Frame};

/// How a visit is accounted against the current path
#[derive(Debug, Clone, Copy)]
enum PathMark {
    Edge(EdgeId),
    Call(NodeId),
}

#[derive(Debug)]
enum Step {
    /// Guarded entry: suppression, path cap, path membership
    Visit {
        node: NodeId,
        reverse: bool,
        mark: PathMark,
    },
    /// Apply the traversal rules at a node
    Expand { node: NodeId, reverse: bool },
    ReleaseEdge(EdgeId),
    ReleaseCall(NodeId),
    /// Adjust the top frame's offset
    AddOffset(i64),
    /// Open a fresh frame
    PushFrame(Frame),
    /// Close the top frame, remembering it for `RestoreFrame`
    PopFrame,
    /// Reopen the most recently popped frame
    RestoreFrame,
    /// Discard the top frame
    DropFrame,
    ShortcutActive(bool),
}

pub struct AliasEngine<'a> {
    graph: &'a ValueFlowGraph,
    index: &'a GraphIndex,
    config: &'a AnalysisConfig,
    steps: Vec<Step>,
    stack: Vec<Frame>,
    saved: Vec<Frame>,
    visited_edges: FxHashSet<EdgeId>,
    visited_calls: FxHashSet<NodeId>,
    node_freq: FxHashMap<NodeId, u64>,
    shortcut_active: bool,
    aliases: AliasMap,
    stats: EngineStats,
}

impl<'a> AliasEngine<'a> {
    pub fn new(
        graph: &'a ValueFlowGraph,
        index: &'a GraphIndex,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            graph,
            index,
            config,
            steps: Vec::new(),
            stack: Vec::new(),
            saved: Vec::new(),
            visited_edges: FxHashSet::default(),
            visited_calls: FxHashSet::default(),
            node_freq: FxHashMap::default(),
            shortcut_active: false,
            aliases: AliasMap::new(),
            stats: EngineStats::default(),
        }
    }

    /// Flows-to traversal from a target's address node.
    pub fn run(mut self, target: NodeId) -> AliasResult {
        self.stack.push(Frame::new(0, false));
        self.steps.push(Step::Expand {
            node: target,
            reverse: false,
        });
        while let Some(step) = self.steps.pop() {
            self.exec(step);
        }
        trace!(
            target,
            visits = self.stats.visits,
            offsets = self.aliases.len(),
            "traversal finished"
        );
        AliasResult {
            target,
            aliases: self.aliases,
            stats: self.stats,
        }
    }

    fn exec(&mut self, step: Step) {
        match step {
            Step::Visit {
                node,
                reverse,
                mark,
            } => self.visit(node, reverse, mark),
            Step::Expand { node, reverse } => self.expand(node, reverse),
            Step::ReleaseEdge(e) => {
                self.visited_edges.remove(&e);
            }
            Step::ReleaseCall(c) => {
                self.visited_calls.remove(&c);
            }
            Step::AddOffset(delta) => {
                if let Some(top) = self.stack.last_mut() {
                    top.offset += delta;
                } else {
                    debug!("offset adjustment on empty frame stack");
                }
            }
            Step::PushFrame(frame) => self.stack.push(frame),
            Step::PopFrame => {
                if let Some(frame) = self.stack.pop() {
                    self.saved.push(frame);
                } else {
                    debug!("frame pop on empty stack");
                }
            }
            Step::RestoreFrame => {
                if let Some(frame) = self.saved.pop() {
                    self.stack.push(frame);
                } else {
                    debug!("frame restore without a saved frame");
                }
            }
            Step::DropFrame => {
                if self.stack.pop().is_none() {
                    debug!("frame drop on empty stack");
                }
            }
            Step::ShortcutActive(v) => self.shortcut_active = v,
        }
    }

    /// Entry guards. On pass, schedules the expansion plus the matching
    /// path-membership release; on fail, the surrounding state-restoring
    /// steps still run.
    fn visit(&mut self, node: NodeId, reverse: bool, mark: PathMark) {
        if self.index.suppression.is_suppressed(node) {
            return;
        }
        if self.visited_edges.len() > self.config.max_path_edges {
            return;
        }
        match mark {
            PathMark::Edge(e) => {
                if !self.visited_edges.insert(e) {
                    return;
                }
                self.steps.push(Step::ReleaseEdge(e));
            }
            PathMark::Call(c) => {
                if !self.visited_calls.insert(c) {
                    return;
                }
                self.steps.push(Step::ReleaseCall(c));
            }
        }
        self.steps.push(Step::Expand { node, reverse });
    }

    fn expand(&mut self, node: NodeId, reverse: bool) {
        self.stats.visits += 1;
        *self.node_freq.entry(node).or_default() += 1;
        if self.index.suppression.record_visit(self.config.stat_window) {
            self.promote_hot_nodes();
        }

        let top = match self.stack.last() {
            Some(f) => *f,
            None => {
                debug!(node, "expansion with no open frame");
                return;
            }
        };
        if self.stack.len() == 1 {
            self.aliases.entry(top.offset).or_default().insert(node);
        }

        let mut seq: Vec<Step> = Vec::new();

        // store/load pairing: a forward Load closes the frame its Store opened
        if self.stack.len() > 1 && top.offset == 0 {
            for &e in self.graph.outgoing(node, EdgeTag::Load) {
                if let Some(edge) = self.graph.edge(e) {
                    seq.push(Step::PopFrame);
                    seq.push(visit_step(edge.dst, false, PathMark::Edge(e)));
                    seq.push(Step::RestoreFrame);
                }
            }
        }
        if self.stack.len() > 1 && top.reverse_flow && top.offset == 0 {
            for &e in self.graph.incoming(node, EdgeTag::Store) {
                if let Some(edge) = self.graph.edge(e) {
                    seq.push(Step::PopFrame);
                    seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                    seq.push(Step::RestoreFrame);
                }
            }
        }

        self.direct_forward(node, &mut seq);
        if reverse {
            self.direct_backward(node, &mut seq);
        }

        // a Store opens a frame to be closed by a matching Load downstream
        for &e in self.graph.outgoing(node, EdgeTag::Store) {
            if let Some(edge) = self.graph.edge(e) {
                seq.push(Step::PushFrame(Frame::new(0, false)));
                seq.push(visit_step(edge.dst, true, PathMark::Edge(e)));
                seq.push(Step::DropFrame);
            }
        }
        if reverse {
            for &e in self.graph.incoming(node, EdgeTag::Load) {
                if let Some(edge) = self.graph.edge(e) {
                    seq.push(Step::PushFrame(Frame::new(0, true)));
                    seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                    seq.push(Step::DropFrame);
                }
            }
            self.gep_backward(node, &mut seq);
        }
        self.gep_forward(node, &mut seq);

        for step in seq.into_iter().rev() {
            self.steps.push(step);
        }
    }

    fn direct_forward(&self, node: NodeId, seq: &mut Vec<Step>) {
        for &e in self.graph.outgoing(node, EdgeTag::Copy) {
            if let Some(edge) = self.graph.edge(e) {
                seq.push(visit_step(edge.dst, false, PathMark::Edge(e)));
            }
        }
        for &(e, dst) in self.index.phi_select.select_targets(node) {
            seq.push(visit_step(dst, false, PathMark::Edge(e)));
        }
        for &(e, dst) in self.index.phi_select.phi_targets(node) {
            seq.push(visit_step(dst, false, PathMark::Edge(e)));
        }
        for &formal in self.index.calls.formals_of(node) {
            seq.push(visit_step(formal, false, PathMark::Call(node)));
        }
        for &e in self.graph.outgoing(node, EdgeTag::Call) {
            if let Some(edge) = self.graph.edge(e) {
                if self.callable(&edge.kind, false) {
                    seq.push(visit_step(edge.dst, false, PathMark::Edge(e)));
                }
            }
        }
        for &callsite in self.index.calls.callsites_of(node) {
            seq.push(visit_step(callsite, false, PathMark::Call(callsite)));
        }
        for &e in self.graph.outgoing(node, EdgeTag::Return) {
            if let Some(edge) = self.graph.edge(e) {
                if self.callable(&edge.kind, true) {
                    seq.push(visit_step(edge.dst, false, PathMark::Edge(e)));
                }
            }
        }
    }

    fn direct_backward(&self, node: NodeId, seq: &mut Vec<Step>) {
        for &e in self.graph.incoming(node, EdgeTag::Copy) {
            if let Some(edge) = self.graph.edge(e) {
                seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
            }
        }
        for &(e, src) in self.index.phi_select.select_sources(node) {
            seq.push(visit_step(src, true, PathMark::Edge(e)));
        }
        for &(e, src) in self.index.phi_select.phi_sources(node) {
            seq.push(visit_step(src, true, PathMark::Edge(e)));
        }
        for &real in self.index.calls.reals_of(node) {
            seq.push(visit_step(real, true, PathMark::Call(real)));
        }
        for &e in self.graph.incoming(node, EdgeTag::Call) {
            if let Some(edge) = self.graph.edge(e) {
                if self.callable(&edge.kind, false) {
                    seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                }
            }
        }
        for &ret in self.index.calls.returns_of(node) {
            seq.push(visit_step(ret, true, PathMark::Call(node)));
        }
        for &e in self.graph.incoming(node, EdgeTag::Return) {
            if let Some(edge) = self.graph.edge(e) {
                if self.callable(&edge.kind, true) {
                    seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                }
            }
        }
    }

    /// Callee filter shared by Call and Return edges: hot callees and
    /// allocator-like functions are not traversed through.
    fn callable(&self, kind: &crate::shared::models::EdgeKind, is_return: bool) -> bool {
        let Some(call) = kind.call_ref() else {
            return false;
        };
        let hot = if is_return {
            self.index.suppression.is_hot_ret(&call.callee)
        } else {
            self.index.suppression.is_hot_call(&call.callee)
        };
        !hot && !self.config.is_alloc_callee(&call.callee)
    }

    fn gep_forward(&self, node: NodeId, seq: &mut Vec<Step>) {
        for &e in self.graph.outgoing(node, EdgeTag::Gep) {
            let Some(edge) = self.graph.edge(e) else {
                continue;
            };
            if self.index.offsets.is_variant(e) {
                seq.push(visit_step(edge.dst, true, PathMark::Edge(e)));
            } else if let Some(off) = self.index.offsets.offset_of(e) {
                seq.push(Step::AddOffset(off));
                seq.push(visit_step(edge.dst, true, PathMark::Edge(e)));
                seq.push(Step::AddOffset(-off));
            }
        }
    }

    fn gep_backward(&self, node: NodeId, seq: &mut Vec<Step>) {
        for &e in self.graph.incoming(node, EdgeTag::Gep) {
            let Some(edge) = self.graph.edge(e) else {
                continue;
            };
            if self.index.offsets.is_variant(e) {
                // field-insensitive fallback
                seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                continue;
            }
            let Some(off) = self.index.offsets.offset_of(e) else {
                continue;
            };

            let mut cast_taken = false;
            if !self.shortcut_active {
                if let Some(name) = self.struct_name_of(edge.src) {
                    if self.type_shortcut_applies(&name, off) {
                        cast_taken = self.emit_shortcuts(&name, off, seq);
                    }
                }
            }
            if !cast_taken {
                seq.push(Step::AddOffset(-off));
                seq.push(visit_step(edge.src, true, PathMark::Edge(e)));
                seq.push(Step::AddOffset(off));
            }
        }
    }

    fn type_shortcut_applies(&self, name: &str, off: i64) -> bool {
        self.index
            .shortcuts
            .type_group(name, off)
            .is_some_and(|g| g.len() < self.config.shortcut_threshold * 5)
    }

    /// Emit the type, bridging, and cast shortcut visits for one consumed
    /// Gep edge. Returns whether the cast shortcut applied; when it did, the
    /// plain decrement walk is skipped (shortcut and walk are mutually
    /// exclusive to avoid double-counting the same field).
    fn emit_shortcuts(&self, name: &str, off: i64, seq: &mut Vec<Step>) -> bool {
        seq.push(Step::ShortcutActive(true));
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();

        if let Some(group) = self.index.shortcuts.type_group(name, off) {
            for &short in group {
                if let Some(edge) = self.graph.edge(short) {
                    seq.push(visit_step(edge.dst, false, PathMark::Edge(short)));
                    seen.insert(edge.dst);
                }
            }
        }
        if let Some(links) = self.index.shortcuts.bridging_groups(name, off) {
            for (other_name, other_off) in links {
                let Some(group) = self.index.shortcuts.type_group(other_name, *other_off) else {
                    continue;
                };
                for &short in group {
                    if let Some(edge) = self.graph.edge(short) {
                        if seen.insert(edge.dst) {
                            seq.push(visit_step(edge.dst, false, PathMark::Edge(short)));
                        }
                    }
                }
            }
        }

        let mut cast_taken = false;
        if self.index.shortcuts.cast_group_len(name) < self.config.shortcut_threshold {
            if let Some(casts) = self.index.shortcuts.cast_sites.get(name) {
                for &cast in casts {
                    let Some(edge) = self.graph.edge(cast) else {
                        continue;
                    };
                    let (visit_src, visit_dst) = self.cast_sides(edge.src, edge.dst, name);
                    // the far side still has to re-match a forward Gep,
                    // so the consumed offset is temporarily given back
                    if visit_src {
                        seq.push(Step::AddOffset(-off));
                        seq.push(visit_step(edge.src, true, PathMark::Edge(cast)));
                        seq.push(Step::AddOffset(off));
                    }
                    if visit_dst {
                        seq.push(Step::AddOffset(-off));
                        seq.push(visit_step(edge.dst, false, PathMark::Edge(cast)));
                        seq.push(Step::AddOffset(off));
                    }
                }
            }
            cast_taken = true;
        }

        seq.push(Step::ShortcutActive(false));
        cast_taken
    }

    /// Decide which end of a cast edge continues the traversal: the side
    /// whose struct name differs from the consumed group's name.
    fn cast_sides(&self, src: NodeId, dst: NodeId, name: &str) -> (bool, bool) {
        let mut visit_src = false;
        let mut visit_dst = false;
        match self.struct_name_of(src) {
            Some(src_name) if src_name == name => visit_dst = true,
            _ => visit_src = true,
        }
        match self.struct_name_of(dst) {
            Some(dst_name) if dst_name == name => visit_src = true,
            Some(_) => visit_dst = true,
            None => visit_dst = true,
        }
        (visit_src, visit_dst)
    }

    fn struct_name_of(&self, node: NodeId) -> Option<String> {
        let ty = self.graph.node(node).and_then(|n| n.ty)?;
        let st: TypeId = self.graph.types.strip_to_struct(ty)?;
        self.index.naming.name_of(&self.graph.types, st)
    }

    /// Adaptive suppression sweep: the locally hottest nodes join the shared
    /// suppression set and local counters reset.
    fn promote_hot_nodes(&mut self) {
        let mut sorted: Vec<(NodeId, u64)> =
            self.node_freq.iter().map(|(&n, &c)| (n, c)).collect();
        sorted.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for &(node, _) in sorted.iter().take(self.config.promote_top_k) {
            self.index.suppression.suppress(node);
        }
        self.node_freq.clear();
        self.stats.promotions += 1;
        debug!(
            promoted = self.config.promote_top_k.min(sorted.len()),
            "adaptive suppression sweep"
        );
    }
}

fn visit_step(node: NodeId, reverse: bool, mark: PathMark) -> Step {
    Step::Visit {
        node,
        reverse,
        mark,
    }
}
