//! Pregel runtime configuration
//!
//! Thread count, partition count, superstep limit and run timeout for the
//! BSP engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::PregelError;

/// Pregel runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregelConfig {
    /// Superstep limit for runs that iterate until convergence
    pub max_supersteps: usize,

    /// Worker threads in the superstep thread pool
    pub parallelism: usize,

    /// Number of contiguous vertex blocks processed as units of work
    pub partitions: usize,

    /// Timeout for an entire run
    #[serde(with = "humantime_serde")]
    pub run_timeout: Duration,

    /// Log every superstep at debug level
    pub tracing_enabled: bool,
}

impl Default for PregelConfig {
    fn default() -> Self {
        let parallelism = num_cpus::get();
        Self {
            max_supersteps: 10_000,
            parallelism,
            partitions: parallelism * 4,
            run_timeout: Duration::from_secs(3600), // 1 hour total
            tracing_enabled: true,
        }
    }
}

impl PregelConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum supersteps
    pub fn with_max_supersteps(mut self, max: usize) -> Self {
        self.max_supersteps = max;
        self
    }

    /// Set parallelism level
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the number of vertex partitions
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    /// Set run timeout
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Enable or disable per-superstep tracing
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    /// Reject values that deserialization lets through
    pub fn validate(&self) -> Result<(), PregelError> {
        if self.parallelism == 0 {
            return Err(PregelError::config_error("parallelism must be at least 1"));
        }
        if self.partitions == 0 {
            return Err(PregelError::config_error("partitions must be at least 1"));
        }
        if self.max_supersteps == 0 {
            return Err(PregelError::config_error(
                "max_supersteps must be at least 1",
            ));
        }
        if self.run_timeout.is_zero() {
            return Err(PregelError::config_error("run_timeout must be non-zero"));
        }
        Ok(())
    }
}
