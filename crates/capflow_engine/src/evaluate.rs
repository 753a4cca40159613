//! The recomputation driver.
//!
//! One pure, synchronous pass over a snapshot: index, order, then
//! evaluate each node in topological order, interleaving evaluation
//! with flow distribution so every node sees its upstream flows
//! already computed. Cycle members are evaluated with whatever flows
//! exist at that point; their result is an approximation, not a fixed
//! point.
//!
//! All working state is allocated per call, so concurrent invocations
//! over unrelated snapshots never interact.

use crate::config::EngineConfig;
use crate::result::{Bottleneck, EdgeStats, GlobalStats, NodeStats, ScenarioResult};
use crate::{datastore, distribute, endpoint, service, topic};
use capflow_core::{EdgeId, NodeId};
use capflow_graph::{Edge, GraphIndex, GraphModel, NodeKind, evaluation_order};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// One inbound edge with its already-computed flow
pub(crate) struct Inbound<'a> {
    /// The edge itself
    pub edge: &'a Edge,
    /// Flow assigned by the distributor; zero for unevaluated (cycle)
    /// or dangling sources
    pub rps: f64,
}

/// Evaluate one graph snapshot into per-node and per-edge statistics.
///
/// Pure function of its inputs: the same snapshot and config always
/// yield a bit-identical result, and the caller owns the output.
#[must_use]
pub fn evaluate(model: &GraphModel, config: &EngineConfig) -> ScenarioResult {
    let index = GraphIndex::build(model);
    let order = evaluation_order(&index);
    debug!(
        nodes = model.node_count(),
        edges = model.edge_count(),
        "evaluating snapshot"
    );

    // Per-call ingress accumulator, seeded with entrypoint rates
    let mut incoming: IndexMap<NodeId, f64> =
        model.nodes().map(|n| (n.id.clone(), 0.0)).collect();
    for node in model.nodes() {
        if let NodeKind::ApiEndpoint(dials) = &node.kind {
            if let Some(rate) = incoming.get_mut(&node.id) {
                *rate += dials.target_qps * dials.burst_factor.unwrap_or(1.0);
            }
        }
    }

    let mut node_stats: IndexMap<NodeId, NodeStats> = IndexMap::with_capacity(model.node_count());
    let mut edge_stats: IndexMap<EdgeId, EdgeStats> = IndexMap::with_capacity(model.edge_count());
    let mut bottlenecks: Vec<Bottleneck> = Vec::new();

    for node_id in order {
        let Some(node) = model.node(&node_id) else {
            continue;
        };
        let ingress = incoming.get(&node_id).copied().unwrap_or(0.0);
        let inbound: Vec<Inbound<'_>> = index
            .incoming(&node_id)
            .map(|edge| Inbound {
                edge,
                rps: edge_stats.get(&edge.id).map_or(0.0, |es| es.flow_rps),
            })
            .collect();

        let (stats, consumption) = match &node.kind {
            NodeKind::ApiEndpoint(dials) => {
                (endpoint::evaluate(node, dials, ingress, config), None)
            }
            NodeKind::Service(dials) => {
                let eval = service::evaluate(node, dials, &inbound, model, config);
                (eval.stats, Some(eval.consumption))
            }
            NodeKind::QueueTopic(dials) => {
                let outgoing: Vec<&Edge> = index.outgoing(&node_id).collect();
                (topic::evaluate(node, dials, ingress, &outgoing, model), None)
            }
            NodeKind::Datastore(dials) => {
                (datastore::evaluate(node, dials, ingress, &inbound, config), None)
            }
        };
        trace!(
            node = %node_id,
            ingress = stats.ingress_rps,
            egress = stats.egress_rps,
            utilization = stats.utilization,
            "node evaluated"
        );

        if stats.backlog_rps.is_some() {
            let reason = match &node.kind {
                NodeKind::Datastore(_) => "Datastore capacity limit",
                _ => "Capacity exceeded",
            };
            bottlenecks.push(Bottleneck {
                node_id: node_id.clone(),
                reason: reason.to_string(),
            });
        }

        // Acceptance is known now; back-annotate the inbound edges
        distribute::annotate_acceptance(&stats, &inbound, consumption.as_deref(), &mut edge_stats);

        // Push egress downstream before successors are evaluated
        let outgoing: Vec<&Edge> = index.outgoing(&node_id).collect();
        distribute::distribute(
            node,
            stats.egress_rps,
            &outgoing,
            model,
            &mut incoming,
            &mut edge_stats,
        );

        node_stats.insert(node_id, stats);
    }

    ScenarioResult {
        node_stats,
        edge_stats,
        global: GlobalStats {
            warnings: Vec::new(),
            bottlenecks,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::LimiterKind;
    use capflow_graph::{
        ApiEndpointDials, JoinSemantics, Node, OpType, Protocol, QueueTopicDials, ServiceDials,
    };

    fn api(id: &str, qps: f64) -> Node {
        Node::new(id, id, NodeKind::ApiEndpoint(ApiEndpointDials::new(qps)))
    }

    fn svc(id: &str, dials: ServiceDials) -> Node {
        Node::new(id, id, NodeKind::Service(dials))
    }

    fn single_edge_model(rate: f64) -> GraphModel {
        let mut model = GraphModel::new();
        model.add_node(api("api", rate)).unwrap();
        model
            .add_node(svc("svc", ServiceDials::new(4, 20.0).with_parallel_efficiency(1.0)))
            .unwrap();
        model.add_edge(Edge::new("e1", "api", "svc")).unwrap();
        model
    }

    #[test]
    fn test_under_capacity_chain() {
        // R = 100 <= C = 200: egress == R, no backlog
        let result = evaluate(&single_edge_model(100.0), &EngineConfig::default());
        let stats = result.node(&"svc".into()).unwrap();

        assert_eq!(stats.ingress_rps, 100.0);
        assert_eq!(stats.egress_rps, 100.0);
        assert!((stats.utilization - 0.5).abs() < 1e-9);
        assert!(stats.backlog_rps.is_none());
        assert!(result.global.bottlenecks.is_empty());
    }

    #[test]
    fn test_overloaded_service_scenario() {
        // 300 rps into 4 x (1000/20) = 200 rps of capacity
        let result = evaluate(&single_edge_model(300.0), &EngineConfig::default());
        let stats = result.node(&"svc".into()).unwrap();

        assert_eq!(stats.egress_rps, 200.0);
        assert!((stats.utilization - 1.5).abs() < 1e-9);
        assert_eq!(stats.backlog_rps, Some(100.0));
        assert!(stats.warnings.iter().any(|w| w.contains("exceeds service capacity")));
        assert_eq!(result.global.bottlenecks.len(), 1);
        assert_eq!(result.global.bottlenecks[0].node_id, "svc".into());

        // The feeding edge carries the backpressure annotation
        let edge = result.edge(&"e1".into()).unwrap();
        assert_eq!(edge.flow_rps, 300.0);
        assert!((edge.delivered_rps - 200.0).abs() < 1e-6);
        assert!((edge.blocked_rps - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_fan_in_quorum_scenario() {
        // Three 300-rps entrypoints into a 2-of-3 quorum join:
        // effective ingress = min(2nd-largest=300, sum/2=450) = 300
        let mut model = GraphModel::new();
        for id in ["api1", "api2", "api3"] {
            model.add_node(api(id, 300.0)).unwrap();
        }
        model
            .add_node(svc(
                "joiner",
                ServiceDials::new(32, 2.0).with_join(JoinSemantics::KOfN {
                    required_streams: 2,
                    efficiency: None,
                }),
            ))
            .unwrap();
        for (i, from) in ["api1", "api2", "api3"].iter().enumerate() {
            model
                .add_edge(Edge::new(format!("e{}", i), *from, "joiner"))
                .unwrap();
        }

        let result = evaluate(&model, &EngineConfig::default());
        let stats = result.node(&"joiner".into()).unwrap();
        assert_eq!(stats.ingress_rps, 300.0);
        assert_eq!(stats.limiter.kind, LimiterKind::JoinKOfN);

        // One stream is inactive and fully blocked
        let blocked_edges = result
            .edge_stats
            .values()
            .filter(|es| es.blocked_rps >= 300.0 - 1e-6)
            .count();
        assert_eq!(blocked_edges, 1);
    }

    #[test]
    fn test_partitioned_pipeline() {
        // Producer -> topic -> consumer -> datastore
        let mut model = GraphModel::new();
        model.add_node(api("api", 500.0)).unwrap();
        model.add_node(svc("producer", ServiceDials::new(8, 4.0))).unwrap();
        model
            .add_node(Node::new(
                "t",
                "Topic",
                NodeKind::QueueTopic(QueueTopicDials::new(12, 150.0)),
            ))
            .unwrap();
        model.add_node(svc("etl", ServiceDials::new(4, 20.0))).unwrap();
        model
            .add_node(Node::new(
                "db",
                "DB",
                NodeKind::Datastore(capflow_graph::DatastoreDials::new(1200.0, 50.0)),
            ))
            .unwrap();
        model.add_edge(Edge::new("e0", "api", "producer")).unwrap();
        model
            .add_edge(Edge::new("e1", "producer", "t").with_protocol(Protocol::Partitioned))
            .unwrap();
        model
            .add_edge(Edge::new("e2", "t", "etl").with_protocol(Protocol::Partitioned))
            .unwrap();
        model
            .add_edge(Edge::new("e3", "etl", "db").with_op_type(OpType::Write))
            .unwrap();

        let result = evaluate(&model, &EngineConfig::default());

        // Producer passes 500 through; topic consumer bound:
        // min(12, 4) x 150 = 600, so the topic passes 500
        assert_eq!(result.node(&"t".into()).unwrap().egress_rps, 500.0);
        // ETL capacity 4 x 50 = 200: overload
        let etl = result.node(&"etl".into()).unwrap();
        assert_eq!(etl.egress_rps, 200.0);
        assert_eq!(etl.backlog_rps, Some(300.0));
        // Datastore sees 200 writes x amplification 4 = 800 cost units
        let db = result.node(&"db".into()).unwrap();
        assert!((db.utilization - 800.0 / 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_fan_out_reaches_both_targets() {
        let mut model = GraphModel::new();
        model.add_node(api("api", 100.0)).unwrap();
        model
            .add_node(svc(
                "splitter",
                ServiceDials::new(8, 5.0).with_fan_out(capflow_graph::FanOut::Duplicate),
            ))
            .unwrap();
        model.add_node(svc("a", ServiceDials::new(8, 5.0))).unwrap();
        model.add_node(svc("b", ServiceDials::new(8, 5.0))).unwrap();
        model.add_edge(Edge::new("e0", "api", "splitter")).unwrap();
        model.add_edge(Edge::new("e1", "splitter", "a")).unwrap();
        model.add_edge(Edge::new("e2", "splitter", "b")).unwrap();

        let result = evaluate(&model, &EngineConfig::default());
        assert_eq!(result.node(&"a".into()).unwrap().ingress_rps, 100.0);
        assert_eq!(result.node(&"b".into()).unwrap().ingress_rps, 100.0);
    }

    #[test]
    fn test_cycle_still_produces_stats_for_all_nodes() {
        let mut model = GraphModel::new();
        model.add_node(api("api", 50.0)).unwrap();
        model.add_node(svc("a", ServiceDials::new(8, 5.0))).unwrap();
        model.add_node(svc("b", ServiceDials::new(8, 5.0))).unwrap();
        model.add_edge(Edge::new("e0", "api", "a")).unwrap();
        model.add_edge(Edge::new("e1", "a", "b")).unwrap();
        model.add_edge(Edge::new("e2", "b", "a")).unwrap();

        let result = evaluate(&model, &EngineConfig::default());
        assert_eq!(result.node_stats.len(), 3);
        assert!(result.node(&"a".into()).is_some());
        assert!(result.node(&"b".into()).is_some());
    }

    #[test]
    fn test_disconnected_components() {
        let mut model = GraphModel::new();
        model.add_node(api("api", 100.0)).unwrap();
        model.add_node(svc("svc", ServiceDials::new(4, 10.0))).unwrap();
        model.add_node(svc("island", ServiceDials::new(4, 10.0))).unwrap();
        model.add_edge(Edge::new("e1", "api", "svc")).unwrap();

        let result = evaluate(&model, &EngineConfig::default());
        let island = result.node(&"island".into()).unwrap();
        assert_eq!(island.ingress_rps, 0.0);
        assert_eq!(island.egress_rps, 0.0);
    }

    #[test]
    fn test_dangling_edge_ignored() {
        let mut model = single_edge_model(100.0);
        model.add_edge(Edge::new("ghost", "svc", "nowhere")).unwrap();

        let result = evaluate(&model, &EngineConfig::default());
        assert!(result.edge(&"ghost".into()).is_none());
        assert_eq!(result.node_stats.len(), 2);
    }

    #[test]
    fn test_burst_factor_scales_source() {
        let mut model = GraphModel::new();
        model
            .add_node(Node::new(
                "api",
                "API",
                NodeKind::ApiEndpoint(ApiEndpointDials::new(100.0).with_burst_factor(1.5)),
            ))
            .unwrap();
        let result = evaluate(&model, &EngineConfig::default());
        assert_eq!(result.node(&"api".into()).unwrap().egress_rps, 150.0);
    }

    #[test]
    fn test_config_tunables_respected() {
        // Raising the queue threshold above the utilization removes
        // the queue penalty; the p95 multiplier applies everywhere
        let config = EngineConfig::new()
            .with_queue_threshold(2.0)
            .with_p95_multiplier(3.0);
        let result = evaluate(&single_edge_model(300.0), &config);
        let stats = result.node(&"svc".into()).unwrap();

        assert_eq!(stats.modeled_p50_ms, 20.0);
        assert_eq!(stats.modeled_p95_ms, 60.0);
    }

    #[test]
    fn test_determinism() {
        let mut model = single_edge_model(300.0);
        model
            .add_node(Node::new(
                "t",
                "Topic",
                NodeKind::QueueTopic(QueueTopicDials::new(6, 100.0)),
            ))
            .unwrap();
        model
            .add_edge(Edge::new("e2", "svc", "t").with_protocol(Protocol::Partitioned))
            .unwrap();

        let first = evaluate(&model, &EngineConfig::default());
        let second = evaluate(&model, &EngineConfig::default());
        assert_eq!(first, second);

        // Bit-identical through serialization as well
        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_graph() {
        let result = evaluate(&GraphModel::new(), &EngineConfig::default());
        assert!(result.node_stats.is_empty());
        assert!(result.edge_stats.is_empty());
        assert!(result.global.bottlenecks.is_empty());
    }
}
