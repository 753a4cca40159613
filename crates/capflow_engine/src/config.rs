//! Engine tunables.

use serde::{Deserialize, Serialize};

/// Configuration for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Utilization above which queueing delay applies
    pub queue_threshold: f64,
    /// Assumed p95:p50 latency ratio
    pub p95_multiplier: f64,
}

impl EngineConfig {
    /// Create a config with default tunables
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue_threshold: 0.7,
            p95_multiplier: 2.0,
        }
    }

    /// Set the queueing threshold
    #[must_use]
    pub fn with_queue_threshold(mut self, threshold: f64) -> Self {
        self.queue_threshold = threshold;
        self
    }

    /// Set the p95:p50 multiplier
    #[must_use]
    pub fn with_p95_multiplier(mut self, multiplier: f64) -> Self {
        self.p95_multiplier = multiplier;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
