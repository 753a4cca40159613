//! Evaluation-order scheduler.
//!
//! Kahn's algorithm over the indexed adjacency. If the graph contains
//! a cycle, the nodes left out of the partial order are appended in
//! original collection order and evaluation proceeds anyway; the
//! result for cycle members is an approximation, not a fixed point.

use crate::index::GraphIndex;
use capflow_core::NodeId;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Compute an evaluation order containing every node id exactly once.
///
/// For any edge outside a cycle, the source precedes the target.
/// Never fails: cycles soft-degrade via the residual append rule.
#[must_use]
pub fn evaluation_order(index: &GraphIndex<'_>) -> Vec<NodeId> {
    let model = index.model();

    let mut in_degree: IndexMap<NodeId, usize> = model
        .nodes()
        .map(|n| (n.id.clone(), index.in_degree(&n.id)))
        .collect();

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(id, _)| id.clone())
        .collect();

    let mut ordered = Vec::with_capacity(model.node_count());
    while let Some(id) = queue.pop_front() {
        for edge in index.outgoing(&id) {
            if let Some(deg) = in_degree.get_mut(&edge.to) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    queue.push_back(edge.to.clone());
                }
            }
        }
        ordered.push(id);
    }

    // Cycle present: append the leftovers in insertion order
    if ordered.len() < model.node_count() {
        let emitted: IndexSet<&NodeId> = ordered.iter().collect();
        let residual: Vec<NodeId> = model
            .nodes()
            .map(|n| n.id.clone())
            .filter(|id| !emitted.contains(id))
            .collect();
        ordered.extend(residual);
    }

    ordered
}
