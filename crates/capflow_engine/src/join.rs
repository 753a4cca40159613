//! Fan-in join resolution.
//!
//! Given the already-computed rates of a service's inbound streams,
//! the join rule decides how much effective ingress passes and how
//! much of each stream is consumed. Consumption feeds the
//! delivered/blocked back-annotation; streams left inactive by a
//! quorum join consume nothing.

use capflow_core::clamp_unit;
use capflow_graph::JoinSemantics;

/// Result of applying a join rule to N inbound streams
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Effective ingress after the join rule
    pub effective_ingress: f64,
    /// Per-stream consumed rate, index-aligned with the input
    pub consumption: Vec<f64>,
    /// Indices of streams marked active
    pub active: Vec<usize>,
    /// Join mode name
    pub mode: &'static str,
    /// Which bound inside the rule was binding
    pub note: String,
}

fn apply_efficiency(value: f64, efficiency: Option<f64>) -> f64 {
    value * efficiency.map_or(1.0, clamp_unit)
}

/// Top-k stream indices by rate, plus the k-th largest rate itself.
fn quorum_bounds(rates: &[f64], required: usize) -> (Vec<usize>, f64, f64) {
    let n = rates.len();
    let k = required.clamp(1, n.max(1));

    let mut by_rate: Vec<usize> = (0..n).collect();
    by_rate.sort_by(|&a, &b| rates[b].total_cmp(&rates[a]));

    let kth = if n >= k { rates[by_rate[k - 1]] } else { 0.0 };
    let sum: f64 = rates.iter().sum();
    let avg_k = sum / k as f64;

    by_rate.truncate(k);
    (by_rate, kth, avg_k)
}

/// Apply a join rule to the inbound stream rates.
///
/// A missing join, an explicit `None`, and an empty stream list all
/// degrade to an ordinary merge.
#[must_use]
pub fn resolve(join: Option<&JoinSemantics>, rates: &[f64]) -> JoinOutcome {
    let n = rates.len();

    let merge = || JoinOutcome {
        effective_ingress: rates.iter().sum(),
        consumption: rates.to_vec(),
        active: (0..n).collect(),
        mode: "none",
        note: "merge".to_string(),
    };

    match join {
        None | Some(JoinSemantics::None) => merge(),
        _ if n == 0 => merge(),
        Some(JoinSemantics::All { efficiency }) => {
            let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
            let effective = apply_efficiency(min, *efficiency);
            JoinOutcome {
                effective_ingress: effective,
                consumption: vec![effective; n],
                active: (0..n).collect(),
                mode: "all",
                note: format!("all: min={:.2}", min),
            }
        }
        Some(JoinSemantics::KOfN {
            required_streams,
            efficiency,
        }) => {
            let (active, kth, avg_k) = quorum_bounds(rates, *required_streams);
            let k = active.len();
            let effective = apply_efficiency(kth.min(avg_k), *efficiency);
            let consumption = (0..n)
                .map(|i| if active.contains(&i) { effective } else { 0.0 })
                .collect();
            JoinOutcome {
                effective_ingress: effective,
                consumption,
                active,
                mode: "k_of_n",
                note: format!("kOfN k={}: min(kth={:.2}, sum/k={:.2})", k, kth, avg_k),
            }
        }
        Some(JoinSemantics::Window {
            required_streams,
            match_rate,
            efficiency,
        }) => {
            let (active, kth, avg_k) = quorum_bounds(rates, *required_streams);
            let k = active.len();
            let match_rate = clamp_unit(*match_rate);
            let effective = apply_efficiency(kth.min(avg_k) * match_rate, *efficiency);
            let consumption = (0..n)
                .map(|i| if active.contains(&i) { effective } else { 0.0 })
                .collect();
            JoinOutcome {
                effective_ingress: effective,
                consumption,
                active,
                mode: "window",
                note: format!("window k={}: quorum bound * match={:.2}", k, match_rate),
            }
        }
    }
}
