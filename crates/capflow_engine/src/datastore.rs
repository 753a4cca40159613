//! Datastore evaluation.
//!
//! Inbound flow is aggregated into abstract cost units so writes can
//! consume capacity disproportionately; latency starts from the
//! declared p95 and inflates under write-heavy load via the lock
//! contention factor.

use crate::config::EngineConfig;
use crate::evaluate::Inbound;
use crate::penalty;
use crate::result::{DatastoreDetail, Limiter, LimiterKind, NodeDetail, NodeStats};
use capflow_core::floor_div;
use capflow_graph::{DatastoreDials, Node, OpType};

/// Default cost units consumed per write
const DEFAULT_WRITE_AMPLIFICATION: f64 = 4.0;

/// Assumed p95:p50 ratio for the declared latency
const DECLARED_P95_TO_P50: f64 = 1.5;

/// Inbound flow bucketed by operation type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct CostedIngress {
    pub reads: f64,
    pub writes: f64,
    pub other: f64,
    pub cost_units: f64,
}

/// Aggregate inbound edge flows into cost units.
pub(crate) fn costed_ingress(inbound: &[Inbound<'_>], write_amplification: f64) -> CostedIngress {
    let mut acc = CostedIngress::default();
    for i in inbound {
        match i.edge.op_type {
            Some(OpType::Write) => acc.writes += i.rps,
            Some(OpType::Read) => acc.reads += i.rps,
            _ => acc.other += i.rps,
        }
    }
    acc.cost_units = acc.reads + acc.writes * write_amplification + acc.other;
    acc
}

pub(crate) fn evaluate(
    node: &Node,
    dials: &DatastoreDials,
    ingress: f64,
    inbound: &[Inbound<'_>],
    config: &EngineConfig,
) -> NodeStats {
    let penalties = node.penalties.as_ref();
    let write_amplification = dials.write_amplification.unwrap_or(DEFAULT_WRITE_AMPLIFICATION);
    let costed = costed_ingress(inbound, write_amplification);

    // Capacity in cost units, clamped by whichever pool dials are set
    let mut capacity = dials.max_qps;
    let pool_clamp = match (dials.pool_size, dials.max_concurrent) {
        (Some(pool), Some(concurrent)) => {
            Some(f64::from(pool.max(1)) * f64::from(concurrent.max(1)))
        }
        (Some(pool), None) => Some(f64::from(pool.max(1))),
        (None, Some(concurrent)) => Some(f64::from(concurrent.max(1))),
        (None, None) => None,
    };
    if let Some(clamp) = pool_clamp {
        capacity = capacity.min(clamp);
    }
    capacity = penalty::scaled_capacity(capacity, penalties);

    let utilization = floor_div(costed.cost_units, capacity);

    let mut p50 = dials.p95_ms / DECLARED_P95_TO_P50;
    let contention = dials.lock_contention_factor.unwrap_or(0.0);
    if costed.writes > 0.0 && contention > 0.0 {
        let write_share = floor_div(costed.writes, costed.cost_units);
        p50 *= 1.0 + write_share * contention;
    }
    p50 = penalty::adjusted_latency(p50, penalties);
    let p95 = p50 * config.p95_multiplier;

    // Egress back in request-rate terms: total ingress scaled by how
    // much of the costed load fits
    let capacity_share = floor_div(capacity, costed.cost_units).min(1.0);
    let egress = penalty::capped_egress(ingress * capacity_share, penalties);

    let backlog = (costed.cost_units - capacity).max(0.0);

    let limiter = if capacity_share < 1.0 {
        Limiter::new(
            LimiterKind::DatastoreCapacity,
            format!("capacity {:.1} costUnits/s", capacity),
        )
    } else {
        Limiter::none("under capacity")
    };

    NodeStats {
        ingress_rps: ingress,
        egress_rps: egress,
        utilization,
        modeled_p50_ms: p50,
        modeled_p95_ms: p95,
        backlog_rps: (backlog > 0.0).then_some(backlog),
        consumer_lag_rps: None,
        wasted_concurrency: None,
        warnings: Vec::new(),
        limiter,
        upstream_constraint: None,
        detail: Some(NodeDetail::Datastore(DatastoreDetail {
            reads_rps: costed.reads,
            writes_rps: costed.writes,
            other_rps: costed.other,
            cost_units: costed.cost_units,
            capacity_cost_units: capacity,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capflow_graph::{Edge, NodeKind};

    fn store_node(dials: DatastoreDials) -> Node {
        Node::new("db", "DB", NodeKind::Datastore(dials))
    }

    fn write_edge(id: &str) -> Edge {
        Edge::new(id, "svc", "db").with_op_type(OpType::Write)
    }

    #[test]
    fn test_all_write_cost_accounting() {
        let e = write_edge("e1");
        let inbound = [Inbound { edge: &e, rps: 100.0 }];

        let costed = costed_ingress(&inbound, 4.0);
        assert_eq!(costed.writes, 100.0);
        assert_eq!(costed.cost_units, 400.0);

        // Halving the amplification halves the cost units
        let halved = costed_ingress(&inbound, 2.0);
        assert_eq!(halved.cost_units, 200.0);
    }

    #[test]
    fn test_mixed_op_types() {
        let r = Edge::new("r", "svc", "db").with_op_type(OpType::Read);
        let w = write_edge("w");
        let b = Edge::new("b", "svc", "db").with_op_type(OpType::Bulk);
        let untagged = Edge::new("u", "svc", "db");
        let inbound = [
            Inbound { edge: &r, rps: 50.0 },
            Inbound { edge: &w, rps: 10.0 },
            Inbound { edge: &b, rps: 5.0 },
            Inbound { edge: &untagged, rps: 5.0 },
        ];

        let costed = costed_ingress(&inbound, 4.0);
        assert_eq!(costed.reads, 50.0);
        assert_eq!(costed.writes, 10.0);
        assert_eq!(costed.other, 10.0);
        assert_eq!(costed.cost_units, 50.0 + 40.0 + 10.0);
    }

    #[test]
    fn test_under_capacity() {
        let dials = DatastoreDials::new(1000.0, 30.0);
        let node = store_node(dials);
        let r = Edge::new("r", "svc", "db").with_op_type(OpType::Read);
        let inbound = [Inbound { edge: &r, rps: 200.0 }];
        let stats = evaluate(&node, &dials, 200.0, &inbound, &EngineConfig::default());

        assert_eq!(stats.egress_rps, 200.0);
        assert!((stats.utilization - 0.2).abs() < 1e-9);
        assert!(stats.backlog_rps.is_none());
        assert_eq!(stats.limiter.kind, LimiterKind::None);
        // Declared p95 of 30ms implies p50 of 20ms
        assert!((stats.modeled_p50_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_amplified_overload() {
        // 100 writes/s x amplification 4 = 400 cost units against 300
        let dials = DatastoreDials::new(300.0, 30.0);
        let node = store_node(dials);
        let e = write_edge("e1");
        let inbound = [Inbound { edge: &e, rps: 100.0 }];
        let stats = evaluate(&node, &dials, 100.0, &inbound, &EngineConfig::default());

        assert!((stats.utilization - 400.0 / 300.0).abs() < 1e-9);
        assert_eq!(stats.backlog_rps, Some(100.0));
        // Egress in request terms: 100 x (300/400)
        assert!((stats.egress_rps - 75.0).abs() < 1e-9);
        assert_eq!(stats.limiter.kind, LimiterKind::DatastoreCapacity);
    }

    #[test]
    fn test_lock_contention_inflates_latency() {
        let dials = DatastoreDials::new(10_000.0, 30.0).with_lock_contention(0.5);
        let node = store_node(dials);
        let e = write_edge("e1");
        let inbound = [Inbound { edge: &e, rps: 100.0 }];
        let stats = evaluate(&node, &dials, 100.0, &inbound, &EngineConfig::default());

        // All-write workload: write share = 100/400 = 0.25
        let expected = (30.0 / 1.5) * (1.0 + 0.25 * 0.5);
        assert!((stats.modeled_p50_ms - expected).abs() < 1e-9);
        assert!((stats.modeled_p95_ms - expected * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_pool_clamp() {
        let dials = DatastoreDials::new(10_000.0, 30.0).with_pool(20, 4);
        let node = store_node(dials);
        let r = Edge::new("r", "svc", "db").with_op_type(OpType::Read);
        let inbound = [Inbound { edge: &r, rps: 100.0 }];
        let stats = evaluate(&node, &dials, 100.0, &inbound, &EngineConfig::default());

        let Some(NodeDetail::Datastore(detail)) = &stats.detail else {
            panic!("expected datastore detail");
        };
        // min(10000, 20 x 4) = 80 cost units/s
        assert_eq!(detail.capacity_cost_units, 80.0);
        assert_eq!(stats.limiter.kind, LimiterKind::DatastoreCapacity);
    }

    #[test]
    fn test_partial_pool_dials() {
        let mut dials = DatastoreDials::new(10_000.0, 30.0);
        dials.pool_size = Some(50);
        let node = store_node(dials);
        let stats = evaluate(&node, &dials, 0.0, &[], &EngineConfig::default());

        let Some(NodeDetail::Datastore(detail)) = &stats.detail else {
            panic!("expected datastore detail");
        };
        assert_eq!(detail.capacity_cost_units, 50.0);
    }
}
