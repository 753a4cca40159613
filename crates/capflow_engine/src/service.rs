//! Service evaluation.
//!
//! A service's capacity comes from its workers and per-item time,
//! clamped by partitions when it consumes from topics; its effective
//! ingress comes from the join rule; queueing delay is a closed-form
//! cubic penalty above the configured utilization threshold, not a
//! queueing-theory solution.

use crate::config::EngineConfig;
use crate::evaluate::Inbound;
use crate::join::{self, JoinOutcome};
use crate::penalty;
use crate::result::{JoinSummary, Limiter, LimiterKind, NodeStats, NodeDetail, ServiceDetail};
use capflow_core::{EPSILON, clamp_unit, floor_div};
use capflow_graph::{GraphModel, JoinSemantics, Node, Protocol, ServiceDials};

/// Service evaluation output: stats plus the per-stream consumption
/// vector the back-annotation step needs.
pub(crate) struct ServiceEval {
    pub stats: NodeStats,
    pub consumption: Vec<f64>,
}

/// Expected per-item time with the cache-hit blend, epsilon-floored.
pub(crate) fn effective_time_ms(dials: &ServiceDials) -> f64 {
    let base = dials.service_time_ms.max(EPSILON);
    let hit_rate = clamp_unit(dials.cache_hit_rate.unwrap_or(0.0));
    let hit_ms = dials.cache_hit_ms.unwrap_or(0.0).max(0.0);
    ((1.0 - hit_rate) * base + hit_rate * hit_ms).max(EPSILON)
}

/// Cubic congestion penalty: zero at or below the threshold, then
/// rises steeply toward saturation.
pub(crate) fn queue_penalty_ms(utilization: f64, base_ms: f64, config: &EngineConfig) -> f64 {
    if utilization <= config.queue_threshold {
        return 0.0;
    }
    utilization.powi(3) * base_ms
}

pub(crate) fn evaluate(
    node: &Node,
    dials: &ServiceDials,
    inbound: &[Inbound<'_>],
    model: &GraphModel,
    config: &EngineConfig,
) -> ServiceEval {
    let penalties = node.penalties.as_ref();

    // Join semantics decide the effective ingress
    let rates: Vec<f64> = inbound.iter().map(|i| i.rps).collect();
    let outcome = join::resolve(dials.join.as_ref(), &rates);
    let effective_ingress = outcome.effective_ingress;

    // Partitioned inbound edges cap the usable worker count
    let partitioned_topics: Vec<_> = inbound
        .iter()
        .filter(|i| i.edge.protocol == Protocol::Partitioned)
        .filter_map(|i| model.node(&i.edge.from).and_then(Node::as_queue_topic))
        .collect();
    let available_partitions: u32 = partitioned_topics.iter().map(|t| t.partitions).sum();
    let workers = if partitioned_topics.is_empty() {
        dials.concurrency
    } else {
        dials.concurrency.min(available_partitions)
    };

    let efficiency = clamp_unit(dials.parallel_efficiency.unwrap_or(1.0));
    let time_ms = effective_time_ms(dials);

    let mut capacity = f64::from(workers) * efficiency * (1000.0 / time_ms);
    capacity = penalty::scaled_capacity(capacity, penalties);
    if let Some(max_in_flight) = dials.max_in_flight {
        capacity = capacity.min(max_in_flight);
    }

    // Consumer-side bound when reading from topics, summed across sources
    let consumer_cap = (!partitioned_topics.is_empty()).then(|| {
        partitioned_topics
            .iter()
            .map(|t| f64::from(t.partitions.min(dials.concurrency)) * t.per_partition_throughput)
            .sum::<f64>()
    });
    if let Some(cap) = consumer_cap {
        capacity = capacity.min(cap);
    }

    let utilization = floor_div(effective_ingress, capacity);
    let queue_ms = queue_penalty_ms(utilization, time_ms, config);
    let p50 = penalty::adjusted_latency(time_ms + queue_ms, penalties);
    let p95 = p50 * config.p95_multiplier;

    let egress = penalty::capped_egress(effective_ingress.min(capacity), penalties);
    let backlog = (effective_ingress - capacity).max(0.0);

    // Workers beyond what the widest inbound topic can feed
    let max_partitions = partitioned_topics
        .iter()
        .map(|t| t.partitions)
        .max()
        .unwrap_or(0);
    let wasted_concurrency = (max_partitions > 0)
        .then(|| f64::from(dials.concurrency) - f64::from(max_partitions) * efficiency)
        .filter(|&wasted| wasted > 0.0);

    let mut warnings = Vec::new();
    if utilization >= 1.0 {
        warnings.push(format!(
            "Inbound {:.1} RPS exceeds service capacity ({:.1}). Backlog growing by {:.1} RPS.",
            effective_ingress, capacity, backlog
        ));
    } else if utilization >= 0.85 {
        warnings.push("High utilization (>=0.85)".to_string());
    } else if utilization >= 0.7 {
        warnings.push("Elevated utilization (>=0.70)".to_string());
    }

    let has_join = outcome.mode != "none";
    let limiter = if capacity <= effective_ingress + EPSILON {
        Limiter::new(LimiterKind::ServiceCompute, format!("capacity {:.1}/s", capacity))
    } else if has_join {
        let kind = match outcome.mode {
            "all" => LimiterKind::JoinAll,
            "k_of_n" => LimiterKind::JoinKOfN,
            _ => LimiterKind::WindowCorrelation,
        };
        Limiter::new(kind, outcome.note.clone())
    } else {
        Limiter::none("no constraint")
    };

    let detail = ServiceDetail {
        workers,
        capacity_rps: capacity,
        available_partitions: (!partitioned_topics.is_empty()).then_some(available_partitions),
        consumer_cap_rps: consumer_cap,
        join: dials.join.as_ref().map(|join| join_summary(join, &outcome)),
    };

    let stats = NodeStats {
        ingress_rps: effective_ingress,
        egress_rps: egress,
        utilization,
        modeled_p50_ms: p50,
        modeled_p95_ms: p95,
        backlog_rps: (backlog > 0.0).then_some(backlog),
        consumer_lag_rps: None,
        wasted_concurrency,
        warnings,
        limiter,
        upstream_constraint: None,
        detail: Some(NodeDetail::Service(detail)),
    };

    ServiceEval {
        stats,
        consumption: outcome.consumption,
    }
}

fn join_summary(join: &JoinSemantics, outcome: &JoinOutcome) -> JoinSummary {
    let (required_streams, efficiency, match_rate) = match join {
        JoinSemantics::None => (None, None, None),
        JoinSemantics::All { efficiency } => (None, *efficiency, None),
        JoinSemantics::KOfN {
            required_streams,
            efficiency,
        } => (Some(*required_streams), *efficiency, None),
        JoinSemantics::Window {
            required_streams,
            match_rate,
            efficiency,
        } => (Some(*required_streams), *efficiency, Some(*match_rate)),
    };

    JoinSummary {
        mode: outcome.mode.to_string(),
        required_streams,
        efficiency,
        match_rate,
        active_streams: outcome.active.len(),
        join_ingress_rps: outcome.effective_ingress,
        note: outcome.note.clone(),
    }
}
