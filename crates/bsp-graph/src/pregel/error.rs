//! Error types for the BSP runtime
//!
//! Configuration problems are reported before the first superstep; runtime
//! failures (timeouts, superstep limits, panics inside a superstep) surface
//! from [`PregelRuntime::run`](super::PregelRuntime::run).

use std::time::Duration;

use super::vertex::VertexId;
use thiserror::Error;

/// Errors that can occur while building a graph or running a vertex program
#[derive(Debug, Error)]
pub enum PregelError {
    /// Convergence run did not converge within the superstep limit
    #[error("Max supersteps exceeded: {0}")]
    MaxSuperstepsExceeded(usize),

    /// Source vertex outside the graph's identifier space
    #[error("Invalid source vertex {source_id}: graph has {vertex_count} vertices")]
    InvalidSource { source_id: u64, vertex_count: usize },

    /// Edge endpoint outside the graph's identifier space
    #[error("Vertex {vertex_id} out of range: graph has {vertex_count} vertices")]
    VertexOutOfRange {
        vertex_id: VertexId,
        vertex_count: usize,
    },

    /// Invalid engine or algorithm configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed graph input
    #[error("Graph format error at line {line}: {message}")]
    GraphFormat { line: usize, message: String },

    /// Reading graph input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A vertex program panicked inside a superstep
    #[error("Engine panic in {program}: {message}")]
    EnginePanic { program: String, message: String },

    /// Run cancelled between supersteps
    #[error("Run cancelled")]
    Cancelled,

    /// Run exceeded the configured timeout
    #[error("Run timeout after {0:?}")]
    RunTimeout(Duration),
}

impl PregelError {
    /// Create a config error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a graph format error for a 1-based input line
    pub fn graph_format(line: usize, message: impl Into<String>) -> Self {
        Self::GraphFormat {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid source error from a 1-based external identifier
    pub fn invalid_source(source_id: u64, vertex_count: usize) -> Self {
        Self::InvalidSource {
            source_id,
            vertex_count,
        }
    }

    /// Create an engine panic error
    pub fn engine_panic(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnginePanic {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Check if the error was raised before any superstep ran
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PregelError::ConfigError(_)
                | PregelError::InvalidSource { .. }
                | PregelError::VertexOutOfRange { .. }
                | PregelError::GraphFormat { .. }
        )
    }

    /// Check if the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, PregelError::RunTimeout(_))
    }
}
