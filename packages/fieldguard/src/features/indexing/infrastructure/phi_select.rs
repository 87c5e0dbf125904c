//! Phi/Select adjacency extraction
//!
//! Each Phi/Select edge links one operand to the merge result. Suppressed Phi
//! operands are left out of both directions; Select operands are kept as-is.

use tracing::info;

use crate::shared::models::{EdgeTag, ValueFlowGraph};

use super::super::domain::{PhiSelectAdjacency, SuppressionState};

pub fn setup_phi_select(
    graph: &ValueFlowGraph,
    suppression: &SuppressionState,
) -> PhiSelectAdjacency {
    let mut adj = PhiSelectAdjacency::default();

    for edge in graph.edges() {
        match edge.kind.tag() {
            EdgeTag::Phi => {
                if suppression.is_suppressed(edge.src) {
                    continue;
                }
                adj.phi_in.entry(edge.dst).or_default().push((edge.id, edge.src));
                adj.phi_out.entry(edge.src).or_default().push((edge.id, edge.dst));
            }
            EdgeTag::Select => {
                adj.select_in.entry(edge.dst).or_default().push((edge.id, edge.src));
                adj.select_out.entry(edge.src).or_default().push((edge.id, edge.dst));
            }
            _ => {}
        }
    }

    info!(
        phi = adj.phi_in.len(),
        select = adj.select_in.len(),
        "phi/select adjacency ready"
    );
    adj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{EdgeKind, SourceRef};

    #[test]
    fn test_phi_adjacency_both_directions() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::named("a"));
        let b = g.add_node(None, SourceRef::named("b"));
        let r = g.add_node(None, SourceRef::named("r"));
        let e1 = g.add_edge(a, r, EdgeKind::Phi, None, None);
        let e2 = g.add_edge(b, r, EdgeKind::Phi, None, None);

        let adj = setup_phi_select(&g, &SuppressionState::new());
        assert_eq!(adj.phi_sources(r), &[(e1, a), (e2, b)]);
        assert_eq!(adj.phi_targets(a), &[(e1, r)]);
    }

    #[test]
    fn test_suppressed_phi_operand_excluded() {
        let mut g = ValueFlowGraph::new();
        let a = g.add_node(None, SourceRef::named("a"));
        let r = g.add_node(None, SourceRef::named("r"));
        g.add_edge(a, r, EdgeKind::Phi, None, None);

        let s = SuppressionState::new();
        s.suppress(a);
        let adj = setup_phi_select(&g, &s);
        assert!(adj.phi_sources(r).is_empty());
        assert!(adj.phi_targets(a).is_empty());
    }
}
