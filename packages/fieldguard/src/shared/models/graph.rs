//! The value-flow graph consumed by indexing and propagation
//!
//! Adjacency is pre-bucketed by `(node, edge tag)` so the propagation engine
//! asks exactly the queries it needs ("Store edges into n", "Copy edges out
//! of n") without per-step filtering. Lookups for absent buckets return an
//! empty slice, never an error.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldguardError, Result};

use super::edge::{EdgeId, EdgeKind, EdgeTag, VfgEdge};
use super::node::{NodeId, SourceRef, VfgNode};
use super::types::{LayoutOracle, ModuleId, TypeId, TypeTable};

/// A function known to the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Formal parameter nodes, in declaration order
    pub params: Vec<NodeId>,
    /// Nodes carrying returned values, one per return instruction
    pub return_nodes: Vec<NodeId>,
    /// Return type is a pointer
    pub returns_pointer: bool,
    /// Linker section the function body was placed in
    pub section: Option<String>,
}

/// A call site known to the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSiteInfo {
    /// Node standing for the call site result
    pub node: NodeId,
    /// Actual argument nodes, in order
    pub args: Vec<NodeId>,
    /// Statically known callee name; `None` for indirect calls
    pub callee: Option<String>,
    pub module: ModuleId,
}

impl CallSiteInfo {
    pub fn is_indirect(&self) -> bool {
        self.callee.is_none()
    }
}

/// A global variable eligible for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalVar {
    pub node: NodeId,
    pub name: String,
    /// Declared type behind the global's address
    pub ty: Option<TypeId>,
    pub is_constant: bool,
    pub section: Option<String>,
}

/// Whole-program value-flow graph plus its type and layout oracles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueFlowGraph {
    nodes: Vec<VfgNode>,
    edges: Vec<VfgEdge>,
    pub types: TypeTable,
    pub layouts: LayoutOracle,
    pub functions: Vec<FunctionInfo>,
    pub call_sites: Vec<CallSiteInfo>,
    pub globals: Vec<GlobalVar>,

    #[serde(skip)]
    out_by_tag: FxHashMap<(NodeId, EdgeTag), Vec<EdgeId>>,
    #[serde(skip)]
    in_by_tag: FxHashMap<(NodeId, EdgeTag), Vec<EdgeId>>,
    #[serde(skip)]
    functions_by_name: FxHashMap<String, usize>,
}

const EMPTY: &[EdgeId] = &[];

impl ValueFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a graph snapshot and rebuild derived adjacency.
    pub fn from_json(data: &str) -> Result<Self> {
        let mut graph: ValueFlowGraph = serde_json::from_str(data)
            .map_err(|e| FieldguardError::graph(format!("malformed graph snapshot: {e}")))?;
        graph.rebuild_indexes();
        graph.check_consistency()?;
        Ok(graph)
    }

    pub fn add_node(&mut self, ty: Option<TypeId>, source: SourceRef) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(VfgNode { id, ty, source });
        id
    }

    pub fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
        module: Option<ModuleId>,
        in_function: Option<String>,
    ) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        let tag = kind.tag();
        self.edges.push(VfgEdge {
            id,
            src,
            dst,
            kind,
            module,
            in_function,
        });
        self.out_by_tag.entry((src, tag)).or_default().push(id);
        self.in_by_tag.entry((dst, tag)).or_default().push(id);
        id
    }

    pub fn add_function(&mut self, f: FunctionInfo) {
        self.functions_by_name
            .insert(f.name.clone(), self.functions.len());
        self.functions.push(f);
    }

    pub fn add_call_site(&mut self, cs: CallSiteInfo) {
        self.call_sites.push(cs);
    }

    pub fn add_global(&mut self, g: GlobalVar) {
        self.globals.push(g);
    }

    pub fn node(&self, id: NodeId) -> Option<&VfgNode> {
        self.nodes.get(id as usize)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&VfgEdge> {
        self.edges.get(id as usize)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VfgNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &VfgEdge> {
        self.edges.iter()
    }

    /// Edges of kind `tag` leaving `node`.
    pub fn outgoing(&self, node: NodeId, tag: EdgeTag) -> &[EdgeId] {
        self.out_by_tag
            .get(&(node, tag))
            .map_or(EMPTY, Vec::as_slice)
    }

    /// Edges of kind `tag` entering `node`.
    pub fn incoming(&self, node: NodeId, tag: EdgeTag) -> &[EdgeId] {
        self.in_by_tag
            .get(&(node, tag))
            .map_or(EMPTY, Vec::as_slice)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions_by_name
            .get(name)
            .and_then(|&i| self.functions.get(i))
    }

    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(VfgNode::name)
    }

    /// Rebuild the `(node, tag)` adjacency buckets and the function name
    /// index. Required after deserialization; `add_edge` keeps them current.
    pub fn rebuild_indexes(&mut self) {
        self.out_by_tag.clear();
        self.in_by_tag.clear();
        for e in &self.edges {
            let tag = e.kind.tag();
            self.out_by_tag.entry((e.src, tag)).or_default().push(e.id);
            self.in_by_tag.entry((e.dst, tag)).or_default().push(e.id);
        }
        self.functions_by_name = self
            .functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
    }

    fn check_consistency(&self) -> Result<()> {
        let n = self.nodes.len() as u64;
        for e in &self.edges {
            if u64::from(e.src) >= n || u64::from(e.dst) >= n {
                return Err(FieldguardError::graph(format!(
                    "edge {} references missing node ({} -> {})",
                    e.id, e.src, e.dst
                )));
            }
        }
        for g in &self.globals {
            if u64::from(g.node) >= n {
                return Err(FieldguardError::graph(format!(
                    "global '{}' references missing node {}",
                    g.name, g.node
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_buckets_by_tag() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::named("a"));
        let b = g.add_node(None, SourceRef::named("b"));
        let e1 = g.add_edge(a, b, EdgeKind::Copy, None, None);
        let e2 = g.add_edge(a, b, EdgeKind::Store, None, Some("f".into()));

        assert_eq!(g.outgoing(a, EdgeTag::Copy), &[e1]);
        assert_eq!(g.outgoing(a, EdgeTag::Store), &[e2]);
        assert_eq!(g.incoming(b, EdgeTag::Store), &[e2]);
        assert!(g.outgoing(b, EdgeTag::Load).is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_rebuilds_adjacency() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::named("a"));
        let b = g.add_node(None, SourceRef::default());
        g.add_edge(a, b, EdgeKind::Load, None, None);

        let json = serde_json::to_string(&g).unwrap();
        let back = ValueFlowGraph::from_json(&json).unwrap();
        assert_eq!(back.outgoing(a, EdgeTag::Load).len(), 1);
        assert_eq!(back.incoming(b, EdgeTag::Load).len(), 1);
    }

    #[test]
    fn test_snapshot_accepts_address_edges() {
        let mut g = ValueFlowGraph::new();
        let obj = g.add_node(None, SourceRef::constant());
        let holder = g.add_node(None, SourceRef::named("holder"));
        g.add_edge(obj, holder, EdgeKind::Address, None, None);

        let json = serde_json::to_string(&g).unwrap();
        let back = ValueFlowGraph::from_json(&json).unwrap();
        assert_eq!(back.outgoing(obj, EdgeTag::Address).len(), 1);
    }

    #[test]
    fn test_snapshot_rejects_dangling_edge() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::default());
        g.add_edge(a, a, EdgeKind::Copy, None, None);
        let mut json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&g).unwrap()).unwrap();
        json["edges"][0]["dst"] = serde_json::json!(99);
        assert!(ValueFlowGraph::from_json(&json.to_string()).is_err());
    }
}
