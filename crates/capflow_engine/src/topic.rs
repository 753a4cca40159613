//! QueueTopic evaluation.
//!
//! A topic's own capacity is partitions times per-partition
//! throughput; egress is additionally bounded by how fast downstream
//! services can consume. The limiter picks the smallest of the three
//! candidate bounds, breaking ties toward the producer constraint.

use crate::penalty;
use crate::result::{Limiter, LimiterKind, NodeDetail, NodeStats, TopicDetail, UpstreamConstraint};
use capflow_core::{EPSILON, floor_div};
use capflow_graph::{Edge, GraphModel, Node, QueueTopicDials};

pub(crate) fn evaluate(
    node: &Node,
    dials: &QueueTopicDials,
    ingress: f64,
    outgoing: &[&Edge],
    model: &GraphModel,
) -> NodeStats {
    let penalties = node.penalties.as_ref();

    let base_capacity = f64::from(dials.partitions) * dials.per_partition_throughput;
    let capacity = penalty::scaled_capacity(base_capacity, penalties);

    // Summed consumer bound across downstream services
    let consumer_cap_total: f64 = outgoing
        .iter()
        .filter_map(|e| model.node(&e.to).and_then(Node::as_service))
        .map(|svc| {
            f64::from(dials.partitions.min(svc.concurrency)) * dials.per_partition_throughput
        })
        .sum();
    let consumer_bound = if consumer_cap_total > 0.0 {
        consumer_cap_total
    } else {
        f64::INFINITY
    };

    let egress = penalty::capped_egress(ingress.min(capacity).min(consumer_bound), penalties);
    let consumer_lag = (ingress - egress).max(0.0);
    let utilization = floor_div(ingress, capacity);

    // Binding constraint: smallest of the three bounds, producer wins ties
    let candidates = [
        (
            LimiterKind::ProducerPartitions,
            ingress,
            format!("producer total {:.1}/s", ingress),
        ),
        (
            LimiterKind::Partitions,
            capacity,
            format!("partitions cap {:.1}/s", capacity),
        ),
        (
            LimiterKind::ConsumerParallelism,
            consumer_bound,
            if consumer_bound.is_finite() {
                format!("consumer cap {:.1}/s", consumer_bound)
            } else {
                "consumer cap unbounded".to_string()
            },
        ),
    ];
    let (kind, _, reason) = candidates
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .cloned()
        .unwrap_or((LimiterKind::None, 0.0, "no constraint".to_string()));

    // Producer limited ingress but something else was diagnosed:
    // surface the upstream constraint separately
    let upstream_constraint = (ingress < capacity - EPSILON
        && ingress < consumer_bound - EPSILON
        && kind != LimiterKind::ProducerPartitions)
        .then(|| UpstreamConstraint {
            kind: LimiterKind::ProducerPartitions,
            reason: "producer limited ingress".to_string(),
            input_rps: ingress,
        });

    NodeStats {
        ingress_rps: ingress,
        egress_rps: egress,
        utilization,
        modeled_p50_ms: 0.0,
        modeled_p95_ms: 0.0,
        backlog_rps: None,
        consumer_lag_rps: (consumer_lag > 0.0).then_some(consumer_lag),
        wasted_concurrency: None,
        warnings: Vec::new(),
        limiter: Limiter::new(kind, reason),
        upstream_constraint,
        detail: Some(NodeDetail::Topic(TopicDetail {
            partitions: dials.partitions,
            capacity_rps: capacity,
            consumer_cap_total_rps: if consumer_cap_total > 0.0 {
                consumer_cap_total
            } else {
                0.0
            },
        })),
    }
}
