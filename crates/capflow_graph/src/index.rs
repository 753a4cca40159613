//! Adjacency index over one graph snapshot.
//!
//! Built once per evaluation. Edges whose endpoints reference unknown
//! node ids are skipped during indexing rather than rejected; the
//! validator reports them separately.

use crate::edge::Edge;
use crate::model::GraphModel;
use capflow_core::NodeId;
use indexmap::IndexMap;

/// Outgoing and incoming edge lists per node
pub struct GraphIndex<'a> {
    model: &'a GraphModel,
    outgoing: IndexMap<NodeId, Vec<usize>>,
    incoming: IndexMap<NodeId, Vec<usize>>,
}

impl<'a> GraphIndex<'a> {
    /// Build the index for a snapshot
    #[must_use]
    pub fn build(model: &'a GraphModel) -> Self {
        let mut outgoing: IndexMap<NodeId, Vec<usize>> = IndexMap::new();
        let mut incoming: IndexMap<NodeId, Vec<usize>> = IndexMap::new();

        for node in model.nodes() {
            outgoing.insert(node.id.clone(), Vec::new());
            incoming.insert(node.id.clone(), Vec::new());
        }

        for (idx, edge) in model.edges().iter().enumerate() {
            // Dangling endpoints are skipped, not an error
            if !outgoing.contains_key(&edge.from) || !incoming.contains_key(&edge.to) {
                continue;
            }
            if let Some(edges) = outgoing.get_mut(&edge.from) {
                edges.push(idx);
            }
            if let Some(edges) = incoming.get_mut(&edge.to) {
                edges.push(idx);
            }
        }

        Self {
            model,
            outgoing,
            incoming,
        }
    }

    /// The snapshot this index was built over
    #[must_use]
    pub fn model(&self) -> &'a GraphModel {
        self.model
    }

    /// Outgoing edges of a node, in edge insertion order
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &'a Edge> + '_ {
        self.outgoing
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&idx| &self.model.edges()[idx])
    }

    /// Incoming edges of a node, in edge insertion order
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &'a Edge> + '_ {
        self.incoming
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&idx| &self.model.edges()[idx])
    }

    /// In-degree of a node counting only indexed (non-dangling) edges
    #[must_use]
    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.incoming.get(id).map_or(0, Vec::len)
    }
}
