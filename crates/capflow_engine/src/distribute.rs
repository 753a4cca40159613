//! Flow distribution and backpressure annotation.
//!
//! After a node is evaluated, its egress is split across outgoing
//! edges (by weight, or duplicated), shaped by the partitioned
//! producer clamp, and accumulated into each target's ingress. Once a
//! consuming node's acceptance ratio is known, its inbound edges are
//! back-annotated with delivered vs blocked flow. The annotation is
//! forward-only: it never feeds back into upstream capacity decisions.

use crate::evaluate::Inbound;
use crate::result::{EdgeStats, Limiter, LimiterKind, NodeStats};
use capflow_core::{EPSILON, EdgeId, NodeId, clamp_unit, floor_div};
use capflow_graph::{Edge, FanOut, GraphModel, Node, Protocol};
use indexmap::IndexMap;

/// Usable partitions after hot-key skew destroys parallelism.
///
/// `floor(partitions * (1 - skew^2))`, floored at one partition.
#[must_use]
pub fn effective_partitions(partitions: u32, key_skew: Option<f64>) -> u32 {
    let skew = clamp_unit(key_skew.unwrap_or(0.0));
    let usable = (f64::from(partitions) * (1.0 - skew * skew)).floor() as u32;
    usable.max(1)
}

/// Split a node's egress across its outgoing edges and accumulate it
/// into the downstream ingress map.
pub(crate) fn distribute(
    node: &Node,
    egress: f64,
    outgoing: &[&Edge],
    model: &GraphModel,
    incoming: &mut IndexMap<NodeId, f64>,
    edge_stats: &mut IndexMap<EdgeId, EdgeStats>,
) {
    let duplicate = node
        .as_service()
        .is_some_and(|d| d.fan_out == Some(FanOut::Duplicate));

    let total_weight: f64 = outgoing.iter().map(|e| e.weight.unwrap_or(1.0)).sum();
    let total_weight = if total_weight > 0.0 { total_weight } else { 1.0 };

    for edge in outgoing {
        let mut flow = if duplicate {
            egress
        } else {
            egress * (edge.weight.unwrap_or(1.0) / total_weight)
        };
        let pre_clamp = flow;

        // Producer bound when flowing into a partitioned topic
        if edge.protocol == Protocol::Partitioned {
            if let Some(topic) = model.node(&edge.to).and_then(Node::as_queue_topic) {
                let usable = effective_partitions(topic.partitions, edge.key_skew);
                let mut bound = f64::from(usable) * topic.per_partition_throughput;
                if let Some(producer) = node.as_service() {
                    bound =
                        bound.min(f64::from(producer.concurrency) * topic.per_partition_throughput);
                }
                flow = flow.min(bound);
            }
        }

        if let Some(target) = incoming.get_mut(&edge.to) {
            *target += flow;
        }

        let limiter = (flow + EPSILON < pre_clamp).then(|| {
            Limiter::new(
                LimiterKind::ProducerPartitions,
                "producer cap on partitioned edge",
            )
        });
        edge_stats.insert(
            edge.id.clone(),
            EdgeStats {
                flow_rps: flow,
                modeled_latency_ms: edge.protocol.transport_latency_ms(),
                delivered_rps: flow,
                blocked_rps: 0.0,
                warnings: Vec::new(),
                limiter,
            },
        );
    }
}

/// Back-annotate inbound edges with delivered vs blocked flow once the
/// consuming node's stats are fixed.
///
/// For joins, the per-stream consumption vector caps each edge's
/// desired flow first, so streams left inactive by a quorum are fully
/// blocked even when the node overall is under capacity.
pub(crate) fn annotate_acceptance(
    stats: &NodeStats,
    inbound: &[Inbound<'_>],
    consumption: Option<&[f64]>,
    edge_stats: &mut IndexMap<EdgeId, EdgeStats>,
) {
    let acceptance_ratio = if stats.ingress_rps > 0.0 {
        floor_div(stats.egress_rps, stats.ingress_rps).min(1.0)
    } else {
        1.0
    };

    for (i, link) in inbound.iter().enumerate() {
        // Cycle members may have inbound edges with no stats yet
        let Some(es) = edge_stats.get_mut(&link.edge.id) else {
            continue;
        };
        let desired = consumption.and_then(|c| c.get(i).copied()).unwrap_or(es.flow_rps);
        let delivered = desired.min(es.flow_rps) * acceptance_ratio;
        let blocked = (es.flow_rps - delivered).max(0.0);

        es.delivered_rps = delivered;
        es.blocked_rps += blocked;
        if blocked > 0.0 {
            es.warnings
                .push(format!("Target constrained: blocked {:.2}/s", blocked));
        }
    }
}
