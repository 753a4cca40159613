//! Node-level penalty application.
//!
//! Penalties apply uniformly regardless of node variant: capacity is
//! scaled then capped, egress is capped then scaled, latency is
//! scaled then shifted. Keeping the three orderings in one place
//! stops the evaluators from drifting apart.

use capflow_graph::Penalties;

/// Scale capacity by the multiplier, then apply the absolute cap.
pub(crate) fn scaled_capacity(base: f64, penalties: Option<&Penalties>) -> f64 {
    let Some(p) = penalties else {
        return base;
    };
    let mut capacity = base * p.capacity_multiplier.unwrap_or(1.0);
    if let Some(cap) = p.fixed_rps_cap {
        capacity = capacity.min(cap);
    }
    capacity
}

/// Apply the absolute cap, then the throughput multiplier.
pub(crate) fn capped_egress(base: f64, penalties: Option<&Penalties>) -> f64 {
    let Some(p) = penalties else {
        return base;
    };
    let mut egress = base;
    if let Some(cap) = p.fixed_rps_cap {
        egress = egress.min(cap);
    }
    egress * p.throughput_multiplier.unwrap_or(1.0)
}

/// Apply the latency multiplier, then the additive adjustment.
pub(crate) fn adjusted_latency(base_ms: f64, penalties: Option<&Penalties>) -> f64 {
    let Some(p) = penalties else {
        return base_ms;
    };
    base_ms * p.latency_multiplier.unwrap_or(1.0) + p.latency_ms_add.unwrap_or(0.0)
}
