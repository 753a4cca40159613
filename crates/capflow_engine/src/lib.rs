//! CAPFLOW Recomputation Engine
//!
//! A single-pass, deterministic evaluator for topology snapshots.
//! Given a graph and a handful of tunables it produces per-node and
//! per-edge statistics: flow rates, utilization, modeled latency,
//! backlog growth, binding constraints, and delivered-versus-blocked
//! backpressure annotations. The pass never fails; malformed regions
//! of the graph degrade to zero flow instead of aborting.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod join;
pub mod preset;
pub mod result;

mod datastore;
mod distribute;
mod endpoint;
mod evaluate;
mod penalty;
mod service;
mod topic;

// Re-exports
pub use config::EngineConfig;
pub use distribute::effective_partitions;
pub use evaluate::evaluate;
pub use join::{JoinOutcome, resolve as resolve_join};
pub use result::{
    Bottleneck, DatastoreDetail, EdgeStats, GlobalStats, JoinSummary, Limiter, LimiterKind,
    NodeDetail, NodeStats, ScenarioResult, ServiceDetail, TopicDetail, UpstreamConstraint,
};
