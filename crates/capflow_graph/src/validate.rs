//! Advisory semantic validator.
//!
//! Inspects a snapshot and returns human-readable warning strings.
//! It never mutates and never fails; the engine does not depend on it
//! and will evaluate whatever numeric result falls out of an invalid
//! configuration. Hosts typically merge these warnings into the
//! result's global warning list.

use crate::edge::Protocol;
use crate::model::GraphModel;
use capflow_core::NodeId;
use indexmap::{IndexMap, IndexSet};

/// Validator for graph-level semantic rules
#[derive(Debug, Clone)]
pub struct Validator {
    /// Warn about cycles (the engine soft-degrades on them)
    pub warn_on_cycles: bool,
}

impl Validator {
    /// Create a validator with default rules
    #[must_use]
    pub fn new() -> Self {
        Self { warn_on_cycles: true }
    }

    /// Set whether cycles produce a warning
    #[must_use]
    pub fn with_warn_on_cycles(mut self, warn: bool) -> Self {
        self.warn_on_cycles = warn;
        self
    }

    /// Validate a snapshot, returning advisory warnings
    #[must_use]
    pub fn validate(&self, model: &GraphModel) -> Vec<String> {
        let mut warnings = Vec::new();

        self.check_edges(model, &mut warnings);
        self.check_topics(model, &mut warnings);
        if self.warn_on_cycles {
            self.check_cycles(model, &mut warnings);
        }

        warnings
    }

    /// Edge-level rules: endpoint existence, protocol pairings, key skew
    fn check_edges(&self, model: &GraphModel, warnings: &mut Vec<String>) {
        for edge in model.edges() {
            let from = model.node(&edge.from);
            let to = model.node(&edge.to);

            let (Some(from), Some(to)) = (from, to) else {
                warnings.push(format!(
                    "Edge {} references a missing node and will be ignored",
                    edge.id.as_str()
                ));
                continue;
            };

            if edge.protocol == Protocol::Partitioned {
                let ok = (from.as_service().is_some() && to.as_queue_topic().is_some())
                    || (from.as_queue_topic().is_some() && to.as_service().is_some());
                if !ok {
                    warnings.push(format!(
                        "Invalid partitioned edge {}: {} -> {}",
                        edge.id.as_str(),
                        from.kind.name(),
                        to.kind.name()
                    ));
                }
            }

            if edge.key_skew.is_some() && to.as_queue_topic().is_none() {
                warnings.push(format!(
                    "Edge {} sets key skew but its target is a {}, not a QueueTopic",
                    edge.id.as_str(),
                    to.kind.name()
                ));
            }
        }
    }

    /// Topic dial sanity
    fn check_topics(&self, model: &GraphModel, warnings: &mut Vec<String>) {
        for node in model.nodes() {
            if let Some(dials) = node.as_queue_topic() {
                if dials.partitions == 0 {
                    warnings.push(format!("Topic {} partitions must be positive", node.label));
                }
                if dials.per_partition_throughput <= 0.0 {
                    warnings.push(format!(
                        "Topic {} per-partition throughput must be > 0",
                        node.label
                    ));
                }
            }
        }
    }

    /// DFS cycle detection; one warning for the whole graph
    fn check_cycles(&self, model: &GraphModel, warnings: &mut Vec<String>) {
        let mut adjacency: IndexMap<&NodeId, Vec<&NodeId>> =
            model.nodes().map(|n| (&n.id, Vec::new())).collect();
        for edge in model.edges() {
            if adjacency.contains_key(&edge.to) {
                if let Some(next) = adjacency.get_mut(&edge.from) {
                    next.push(&edge.to);
                }
            }
        }

        let mut visited: IndexSet<&NodeId> = IndexSet::new();
        for node in model.nodes() {
            if !visited.contains(&node.id)
                && Self::dfs_cycle(&node.id, &adjacency, &mut visited, &mut IndexSet::new())
            {
                warnings.push("Cycle detected in graph; evaluation order is approximate".to_string());
                break;
            }
        }
    }

    fn dfs_cycle<'a>(
        id: &'a NodeId,
        adjacency: &IndexMap<&'a NodeId, Vec<&'a NodeId>>,
        visited: &mut IndexSet<&'a NodeId>,
        visiting: &mut IndexSet<&'a NodeId>,
    ) -> bool {
        if visiting.contains(id) {
            return true;
        }
        if visited.contains(id) {
            return false;
        }
        visiting.insert(id);

        for next in adjacency.get(id).map(|v| v.as_slice()).unwrap_or(&[]) {
            if Self::dfs_cycle(next, adjacency, visited, visiting) {
                return true;
            }
        }

        visiting.swap_remove(id);
        visited.insert(id);
        false
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
