//! Ready-made demonstration topologies.
//!
//! Small graphs that exercise the interesting parts of the model, for
//! tests, benchmarks, and anything that wants a plausible snapshot
//! without building one by hand.

use capflow_graph::{
    ApiEndpointDials, DatastoreDials, Edge, GraphModel, JoinSemantics, Node, NodeKind, OpType,
    Protocol, QueueTopicDials, ServiceDials,
};

/// Three entrypoints fanning into a full-quorum joiner.
///
/// All three 300 rps streams must arrive, so the joiner's effective
/// ingress is the weakest stream and its 200 rps compute capacity is
/// the bottleneck.
#[must_use]
pub fn fan_in_join() -> GraphModel {
    let mut model = GraphModel::new();
    for (i, (id, label)) in [("api1", "API A"), ("api2", "API B"), ("api3", "API C")]
        .into_iter()
        .enumerate()
    {
        model
            .add_node(
                Node::new(id, label, NodeKind::ApiEndpoint(ApiEndpointDials::new(300.0)))
                    .with_position(0.0, 100.0 * i as f64),
            )
            .ok();
    }
    model
        .add_node(
            Node::new(
                "svc",
                "Joiner",
                NodeKind::Service(
                    ServiceDials::new(4, 20.0)
                        .with_parallel_efficiency(1.0)
                        .with_join(JoinSemantics::KOfN {
                            required_streams: 3,
                            efficiency: Some(1.0),
                        }),
                ),
            )
            .with_position(400.0, 100.0),
        )
        .ok();
    for (i, from) in ["api1", "api2", "api3"].into_iter().enumerate() {
        model.add_edge(Edge::new(format!("e{}", i + 1), from, "svc")).ok();
    }
    model
}

/// A partitioned ETL pipeline: producer, skewed topic, consumer, and a
/// write-heavy warehouse.
#[must_use]
pub fn partitioned_etl() -> GraphModel {
    let mut model = GraphModel::new();
    model
        .add_node(
            Node::new("svc1", "Producer", NodeKind::Service(ServiceDials::new(4, 10.0)))
                .with_position(0.0, 100.0),
        )
        .ok();
    model
        .add_node(
            Node::new("t", "Topic", NodeKind::QueueTopic(QueueTopicDials::new(12, 150.0)))
                .with_position(300.0, 100.0),
        )
        .ok();
    model
        .add_node(
            Node::new("svc2", "ETL", NodeKind::Service(ServiceDials::new(4, 20.0)))
                .with_position(600.0, 100.0),
        )
        .ok();
    model
        .add_node(
            Node::new("db", "Warehouse", NodeKind::Datastore(DatastoreDials::new(1200.0, 50.0)))
                .with_position(900.0, 100.0),
        )
        .ok();
    model
        .add_edge(
            Edge::new("e1", "svc1", "t")
                .with_protocol(Protocol::Partitioned)
                .with_key_skew(0.2),
        )
        .ok();
    model
        .add_edge(Edge::new("e2", "t", "svc2").with_protocol(Protocol::Partitioned))
        .ok();
    model
        .add_edge(Edge::new("e3", "svc2", "db").with_op_type(OpType::Write))
        .ok();
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::evaluate;
    use capflow_graph::Validator;

    #[test]
    fn test_presets_validate_cleanly() {
        let validator = Validator::new();
        assert!(validator.validate(&fan_in_join()).is_empty());
        assert!(validator.validate(&partitioned_etl()).is_empty());
    }

    #[test]
    fn test_fan_in_join_bottlenecks_at_joiner() {
        let result = evaluate(&fan_in_join(), &EngineConfig::default());
        let joiner = result.node(&"svc".into()).unwrap();

        // Full quorum: ingress is min(300, 900/3) = 300 against 200
        // rps of compute
        assert_eq!(joiner.ingress_rps, 300.0);
        assert_eq!(joiner.egress_rps, 200.0);
        assert_eq!(joiner.backlog_rps, Some(100.0));
    }

    #[test]
    fn test_partitioned_etl_flows_end_to_end() {
        let result = evaluate(&partitioned_etl(), &EngineConfig::default());

        // Producer has no entrypoint feeding it, so nothing flows, but
        // every node still gets stats
        assert_eq!(result.node_stats.len(), 4);
        let topic = result.node(&"t".into()).unwrap();
        assert_eq!(topic.ingress_rps, 0.0);
    }
}
