//! Directed edges between nodes.
//!
//! Edges are lean shapers: a protocol tag, an optional operation-type
//! hint consumed by datastore cost accounting, a fan-out weight, and a
//! key-skew dial that only means something when the target is a
//! queue topic.

use capflow_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// Transport protocol carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Plain request/response transport
    #[default]
    Generic,
    /// Partitioned message-queue transport
    Partitioned,
}

impl Protocol {
    /// Modeled transport latency in ms.
    ///
    /// Both protocols currently model zero transit time; the seam
    /// exists so a transport model can be added without touching the
    /// distributor.
    #[must_use]
    pub fn transport_latency_ms(&self) -> f64 {
        match self {
            Self::Generic | Self::Partitioned => 0.0,
        }
    }
}

/// Operation-type hint, consumed by datastore cost accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    /// Point or range read
    Read,
    /// Mutating write
    Write,
    /// Bulk operation
    Bulk,
    /// Streaming operation
    Stream,
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge id
    pub id: EdgeId,
    /// Source node id
    pub from: NodeId,
    /// Target node id
    pub to: NodeId,
    /// Transport protocol
    pub protocol: Protocol,
    /// Display label
    pub label: Option<String>,
    /// Operation-type hint interpreted by the target node
    pub op_type: Option<OpType>,
    /// Fan-out weight; default equal split when unset
    pub weight: Option<f64>,
    /// Key skew in `[0, 1]`; only valid when the target is a QueueTopic
    pub key_skew: Option<f64>,
}

impl Edge {
    /// Create a generic edge between two nodes
    #[must_use]
    pub fn new(id: impl Into<EdgeId>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            protocol: Protocol::Generic,
            label: None,
            op_type: None,
            weight: None,
            key_skew: None,
        }
    }

    /// Set the protocol
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the operation-type hint
    #[must_use]
    pub fn with_op_type(mut self, op_type: OpType) -> Self {
        self.op_type = Some(op_type);
        self
    }

    /// Set the fan-out weight
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the key skew
    #[must_use]
    pub fn with_key_skew(mut self, skew: f64) -> Self {
        self.key_skew = Some(skew);
        self
    }
}
