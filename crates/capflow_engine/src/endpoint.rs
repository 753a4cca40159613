//! ApiEndpoint evaluation.
//!
//! Entrypoints are unconstrained sources: no capacity, no
//! utilization. Latency is whatever the node declares, passed through
//! with penalties applied rather than derived.

use crate::config::EngineConfig;
use crate::penalty;
use crate::result::{Limiter, NodeStats};
use capflow_graph::{ApiEndpointDials, Node};

pub(crate) fn evaluate(
    node: &Node,
    dials: &ApiEndpointDials,
    ingress: f64,
    config: &EngineConfig,
) -> NodeStats {
    let penalties = node.penalties.as_ref();
    let egress = penalty::capped_egress(ingress, penalties);

    let p50 = penalty::adjusted_latency(dials.p50_ms.unwrap_or(0.0), penalties);
    let p95 = dials.p95_ms.unwrap_or(p50 * config.p95_multiplier);

    NodeStats {
        ingress_rps: ingress,
        egress_rps: egress,
        utilization: 0.0,
        modeled_p50_ms: p50,
        modeled_p95_ms: p95,
        backlog_rps: None,
        consumer_lag_rps: None,
        wasted_concurrency: None,
        warnings: Vec::new(),
        limiter: Limiter::none("entry"),
        upstream_constraint: None,
        detail: None,
    }
}
