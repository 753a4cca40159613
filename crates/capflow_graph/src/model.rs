//! The graph snapshot the engine evaluates.
//!
//! A `GraphModel` is constructed and mutated by the editor
//! collaborator; one evaluation reads a snapshot and never writes
//! back. Nodes keep insertion order so evaluation is deterministic.

use crate::edge::Edge;
use crate::node::Node;
use capflow_core::{CoreError, CoreResult, NodeId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Optional snapshot metadata, pass-through for the editor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Display name of the sketch
    pub name: Option<String>,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
}

/// An ordered collection of nodes and edges
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphModel {
    /// All nodes, in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// All edges, in insertion order
    edges: Vec<Edge>,
    /// Optional metadata
    pub metadata: Option<GraphMetadata>,
}

impl GraphModel {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from pre-assembled collections, unchecked
    #[must_use]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges,
            metadata: None,
        }
    }

    /// Add a node to the graph
    ///
    /// # Errors
    ///
    /// Returns error if a node with the same id already exists
    pub fn add_node(&mut self, node: Node) -> CoreResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::AlreadyExists {
                kind: "Node".to_string(),
                id: node.id.as_str().to_string(),
            });
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Add an edge to the graph
    ///
    /// Dangling endpoints are allowed here; the indexer skips them
    /// and the validator reports them.
    ///
    /// # Errors
    ///
    /// Returns error if an edge with the same id already exists
    pub fn add_edge(&mut self, edge: Edge) -> CoreResult<()> {
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Err(CoreError::AlreadyExists {
                kind: "Edge".to_string(),
                id: edge.id.as_str().to_string(),
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Get a node by id
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Iterate nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
