//! Node variants and their dials.
//!
//! A node is a closed tagged union over four variants. Each variant
//! carries its own dial set; the shared identity (id, label, canvas
//! position, optional penalties) lives on the `Node` struct itself.
//! Positions are carried through untouched so the editor round-trips.

use capflow_core::NodeId;
use serde::{Deserialize, Serialize};

/// 2D canvas position, irrelevant to computation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node-level adjustments applied uniformly regardless of variant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Penalties {
    /// Multiplier on computed capacity
    pub capacity_multiplier: Option<f64>,
    /// Multiplier on computed egress
    pub throughput_multiplier: Option<f64>,
    /// Additive latency adjustment in milliseconds
    pub latency_ms_add: Option<f64>,
    /// Multiplicative latency adjustment
    pub latency_multiplier: Option<f64>,
    /// Absolute rate cap in requests per second
    pub fixed_rps_cap: Option<f64>,
}

/// How a service splits egress across its outgoing edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Divide egress across edges by weight
    #[default]
    Split,
    /// Send the full egress to every outgoing edge
    Duplicate,
}

/// Fan-in rule by which a service combines multiple inbound streams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JoinSemantics {
    /// Ordinary merge: sum all inbound flows
    None,
    /// Synchronization barrier: the slowest stream gates all others
    All {
        /// Join efficiency in `[0, 1]`, default 1
        efficiency: Option<f64>,
    },
    /// Quorum: requires `required_streams` of the N inbound streams
    KOfN {
        /// Number of streams that must contribute
        required_streams: usize,
        /// Join efficiency in `[0, 1]`, default 1
        efficiency: Option<f64>,
    },
    /// Quorum further scaled by a window correlation match rate
    Window {
        /// Number of streams that must contribute
        required_streams: usize,
        /// Probability in `[0, 1]` that correlated records co-occur
        match_rate: f64,
        /// Join efficiency in `[0, 1]`, default 1
        efficiency: Option<f64>,
    },
}

/// Dials for a traffic source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpointDials {
    /// Configured target rate in requests per second
    pub target_qps: f64,
    /// Burst multiplier on the target rate, default 1
    pub burst_factor: Option<f64>,
    /// Declared p50 latency in ms (informational pass-through)
    pub p50_ms: Option<f64>,
    /// Declared p95 latency in ms (informational pass-through)
    pub p95_ms: Option<f64>,
}

impl ApiEndpointDials {
    /// Create dials with the given target rate
    #[must_use]
    pub fn new(target_qps: f64) -> Self {
        Self {
            target_qps,
            burst_factor: None,
            p50_ms: None,
            p95_ms: None,
        }
    }

    /// Set the burst multiplier
    #[must_use]
    pub fn with_burst_factor(mut self, factor: f64) -> Self {
        self.burst_factor = Some(factor);
        self
    }

    /// Set declared latencies
    #[must_use]
    pub fn with_latency(mut self, p50_ms: f64, p95_ms: f64) -> Self {
        self.p50_ms = Some(p50_ms);
        self.p95_ms = Some(p95_ms);
        self
    }
}

/// Dials for a compute stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceDials {
    /// Worker count
    pub concurrency: u32,
    /// Per-item mean processing time in ms
    pub service_time_ms: f64,
    /// Parallel efficiency in `[0, 1]`, default 1
    pub parallel_efficiency: Option<f64>,
    /// Cache hit rate in `[0, 1]`, default 0
    pub cache_hit_rate: Option<f64>,
    /// Processing time for a cache hit in ms, default 0
    pub cache_hit_ms: Option<f64>,
    /// Clamp on capacity in requests per second
    pub max_in_flight: Option<f64>,
    /// Fan-in join specification
    pub join: Option<JoinSemantics>,
    /// Fan-out mode for outgoing edges
    pub fan_out: Option<FanOut>,
}

impl ServiceDials {
    /// Create dials with the given worker count and processing time
    #[must_use]
    pub fn new(concurrency: u32, service_time_ms: f64) -> Self {
        Self {
            concurrency,
            service_time_ms,
            parallel_efficiency: None,
            cache_hit_rate: None,
            cache_hit_ms: None,
            max_in_flight: None,
            join: None,
            fan_out: None,
        }
    }

    /// Set parallel efficiency
    #[must_use]
    pub fn with_parallel_efficiency(mut self, efficiency: f64) -> Self {
        self.parallel_efficiency = Some(efficiency);
        self
    }

    /// Set the cache hit rate/latency pair
    #[must_use]
    pub fn with_cache(mut self, hit_rate: f64, hit_ms: f64) -> Self {
        self.cache_hit_rate = Some(hit_rate);
        self.cache_hit_ms = Some(hit_ms);
        self
    }

    /// Set the in-flight clamp
    #[must_use]
    pub fn with_max_in_flight(mut self, max: f64) -> Self {
        self.max_in_flight = Some(max);
        self
    }

    /// Set the fan-in join specification
    #[must_use]
    pub fn with_join(mut self, join: JoinSemantics) -> Self {
        self.join = Some(join);
        self
    }

    /// Set the fan-out mode
    #[must_use]
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = Some(fan_out);
        self
    }
}

/// Dials for a partitioned message buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueTopicDials {
    /// Partition count
    pub partitions: u32,
    /// Sustainable throughput per partition in messages per second
    pub per_partition_throughput: f64,
    /// Replication factor, carried for the inspector and unread here
    pub replication_factor: Option<u32>,
}

impl QueueTopicDials {
    /// Create dials with the given partition layout
    #[must_use]
    pub fn new(partitions: u32, per_partition_throughput: f64) -> Self {
        Self {
            partitions,
            per_partition_throughput,
            replication_factor: None,
        }
    }

    /// Set the replication factor
    #[must_use]
    pub fn with_replication_factor(mut self, factor: u32) -> Self {
        self.replication_factor = Some(factor);
        self
    }
}

/// Dials for a request sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatastoreDials {
    /// Maximum sustainable rate in cost units per second
    pub max_qps: f64,
    /// Declared p95 latency in ms
    pub p95_ms: f64,
    /// Cost units consumed per write, default 4
    pub write_amplification: Option<f64>,
    /// Latency inflation factor under write load, default 0
    pub lock_contention_factor: Option<f64>,
    /// Connection pool size clamp
    pub pool_size: Option<u32>,
    /// Max concurrent requests clamp
    pub max_concurrent: Option<u32>,
}

impl DatastoreDials {
    /// Create dials with the given capacity and declared latency
    #[must_use]
    pub fn new(max_qps: f64, p95_ms: f64) -> Self {
        Self {
            max_qps,
            p95_ms,
            write_amplification: None,
            lock_contention_factor: None,
            pool_size: None,
            max_concurrent: None,
        }
    }

    /// Set the write amplification factor
    #[must_use]
    pub fn with_write_amplification(mut self, factor: f64) -> Self {
        self.write_amplification = Some(factor);
        self
    }

    /// Set the lock contention factor
    #[must_use]
    pub fn with_lock_contention(mut self, factor: f64) -> Self {
        self.lock_contention_factor = Some(factor);
        self
    }

    /// Set the pool-size/max-concurrency clamp
    #[must_use]
    pub fn with_pool(mut self, pool_size: u32, max_concurrent: u32) -> Self {
        self.pool_size = Some(pool_size);
        self.max_concurrent = Some(max_concurrent);
        self
    }
}

/// Node kind - the variant-specific dial set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A traffic source with a configured target rate
    ApiEndpoint(ApiEndpointDials),
    /// A compute stage with workers and a processing-time model
    Service(ServiceDials),
    /// A partitioned message buffer
    QueueTopic(QueueTopicDials),
    /// A request sink with cost-weighted capacity
    Datastore(DatastoreDials),
}

impl NodeKind {
    /// Human-readable variant name, used in warnings
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiEndpoint(_) => "ApiEndpoint",
            Self::Service(_) => "Service",
            Self::QueueTopic(_) => "QueueTopic",
            Self::Datastore(_) => "Datastore",
        }
    }
}

/// A node in the topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Canvas position, carried through untouched
    pub position: Position,
    /// Optional node-level adjustments
    pub penalties: Option<Penalties>,
    /// Variant-specific dials
    pub kind: NodeKind,
}

impl Node {
    /// Create a new node at the origin with no penalties
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position: Position::default(),
            penalties: None,
            kind,
        }
    }

    /// Set the canvas position
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Set the penalties record
    #[must_use]
    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = Some(penalties);
        self
    }

    /// Get the service dials if this is a service node
    #[must_use]
    pub fn as_service(&self) -> Option<&ServiceDials> {
        match &self.kind {
            NodeKind::Service(dials) => Some(dials),
            _ => None,
        }
    }

    /// Get the topic dials if this is a queue-topic node
    #[must_use]
    pub fn as_queue_topic(&self) -> Option<&QueueTopicDials> {
        match &self.kind {
            NodeKind::QueueTopic(dials) => Some(dials),
            _ => None,
        }
    }
}
