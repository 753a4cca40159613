//! Evaluation output.
//!
//! The result keeps raw intermediate quantities in detail sub-records
//! so the UI collaborator can explain every number it renders, not
//! just paint the final ones.

use capflow_core::{EdgeId, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which formula/resource determined a node's egress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterKind {
    /// No binding constraint
    None,
    /// Service compute capacity is binding
    ServiceCompute,
    /// Barrier join gated by the slowest stream
    JoinAll,
    /// Quorum join bound
    JoinKOfN,
    /// Window correlation bound
    WindowCorrelation,
    /// Producer-side ingress into a topic
    ProducerPartitions,
    /// Topic partition capacity
    Partitions,
    /// Downstream consumer parallelism
    ConsumerParallelism,
    /// Datastore cost-unit capacity
    DatastoreCapacity,
}

/// Limiter diagnosis with a human-readable explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limiter {
    /// Binding constraint kind
    pub kind: LimiterKind,
    /// Explanation for hover tooltips
    pub reason: String,
}

impl Limiter {
    /// Create a limiter diagnosis
    #[must_use]
    pub fn new(kind: LimiterKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// The "no constraint" diagnosis
    #[must_use]
    pub fn none(reason: impl Into<String>) -> Self {
        Self::new(LimiterKind::None, reason)
    }
}

/// Raw join intermediates for explainability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSummary {
    /// Join mode name
    pub mode: String,
    /// Configured quorum size, if any
    pub required_streams: Option<usize>,
    /// Configured efficiency, if any
    pub efficiency: Option<f64>,
    /// Configured window match rate, if any
    pub match_rate: Option<f64>,
    /// How many inbound streams were marked active
    pub active_streams: usize,
    /// Effective ingress after the join rule
    pub join_ingress_rps: f64,
    /// Which bound inside the join rule was binding
    pub note: String,
}

/// Service-specific intermediates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetail {
    /// Effective worker count after any partition cap
    pub workers: u32,
    /// Computed capacity in requests per second
    pub capacity_rps: f64,
    /// Total partitions available across partitioned inbound edges
    pub available_partitions: Option<u32>,
    /// Consumer-side bound when consuming from topics
    pub consumer_cap_rps: Option<f64>,
    /// Join intermediates, present when a join is configured
    pub join: Option<JoinSummary>,
}

/// Topic-specific intermediates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDetail {
    /// Partition count
    pub partitions: u32,
    /// Own partition capacity in messages per second
    pub capacity_rps: f64,
    /// Summed consumer bound across downstream services
    pub consumer_cap_total_rps: f64,
}

/// Datastore-specific intermediates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatastoreDetail {
    /// Read rate in requests per second
    pub reads_rps: f64,
    /// Write rate in requests per second
    pub writes_rps: f64,
    /// Other (bulk/stream/untagged) rate in requests per second
    pub other_rps: f64,
    /// Cost-weighted ingress in cost units per second
    pub cost_units: f64,
    /// Capacity in cost units per second
    pub capacity_cost_units: f64,
}

/// Variant-specific detail sub-record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeDetail {
    /// Service intermediates
    Service(ServiceDetail),
    /// Topic intermediates
    Topic(TopicDetail),
    /// Datastore intermediates
    Datastore(DatastoreDetail),
}

/// A constraint applied upstream of a node, surfaced for explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConstraint {
    /// Constraint kind
    pub kind: LimiterKind,
    /// Explanation
    pub reason: String,
    /// The constrained input rate
    pub input_rps: f64,
}

/// Computed statistics for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Effective inbound rate
    pub ingress_rps: f64,
    /// Outbound rate
    pub egress_rps: f64,
    /// Ingress over capacity; may exceed 1 under overload
    pub utilization: f64,
    /// Modeled p50 latency in ms
    pub modeled_p50_ms: f64,
    /// Modeled p95 latency in ms
    pub modeled_p95_ms: f64,
    /// Rate at which unconsumed work accumulates, when positive
    pub backlog_rps: Option<f64>,
    /// Topic consumer lag, when positive
    pub consumer_lag_rps: Option<f64>,
    /// Workers beyond what partitions can feed, when positive
    pub wasted_concurrency: Option<f64>,
    /// Advisory warnings
    pub warnings: Vec<String>,
    /// Binding-constraint diagnosis
    pub limiter: Limiter,
    /// Upstream constraint, when one is worth surfacing
    pub upstream_constraint: Option<UpstreamConstraint>,
    /// Variant-specific intermediates
    pub detail: Option<NodeDetail>,
}

/// Computed statistics for one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStats {
    /// Flow assigned to this edge by the distributor
    pub flow_rps: f64,
    /// Modeled transport latency in ms
    pub modeled_latency_ms: f64,
    /// Flow actually accepted by the target
    pub delivered_rps: f64,
    /// Flow refused by the target (backpressure)
    pub blocked_rps: f64,
    /// Advisory warnings
    pub warnings: Vec<String>,
    /// Edge-level shaping diagnosis, when a clamp applied
    pub limiter: Option<Limiter>,
}

/// A node flagged as a bottleneck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// The constrained node
    pub node_id: NodeId,
    /// Why it was flagged
    pub reason: String,
}

/// Graph-wide findings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Graph-wide warnings; hosts may merge validator output here
    pub warnings: Vec<String>,
    /// Nodes where ingress exceeded capacity
    pub bottlenecks: Vec<Bottleneck>,
}

/// The full result of one evaluation; owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Per-node statistics, keyed by node id in evaluation order
    pub node_stats: IndexMap<NodeId, NodeStats>,
    /// Per-edge statistics, keyed by edge id
    pub edge_stats: IndexMap<EdgeId, EdgeStats>,
    /// Graph-wide findings
    pub global: GlobalStats,
}

impl ScenarioResult {
    /// Stats for a node, if it was evaluated
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeStats> {
        self.node_stats.get(id)
    }

    /// Stats for an edge, if flow was distributed over it
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&EdgeStats> {
        self.edge_stats.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_constructors() {
        let limiter = Limiter::new(LimiterKind::ServiceCompute, "capacity 200.0/s");
        assert_eq!(limiter.kind, LimiterKind::ServiceCompute);

        let none = Limiter::none("entry");
        assert_eq!(none.kind, LimiterKind::None);
        assert_eq!(none.reason, "entry");
    }

    #[test]
    fn test_result_lookup() {
        let result = ScenarioResult {
            node_stats: IndexMap::new(),
            edge_stats: IndexMap::new(),
            global: GlobalStats::default(),
        };
        assert!(result.node(&"missing".into()).is_none());
        assert!(result.edge(&"missing".into()).is_none());
    }
}
