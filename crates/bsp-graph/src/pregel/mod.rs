//! Pregel Runtime for vertex-centric graph analytics
//!
//! This module implements a bulk-synchronous-parallel engine in the style of
//! Pregel and GraphMat. Key concepts:
//!
//! - **Topology**: immutable CSR adjacency in both directions, split into
//!   contiguous vertex partitions
//! - **Vertex program**: send / process / reduce / apply callbacks plus
//!   between-superstep hooks
//! - **Superstep**: synchronized execution phase
//! - **Whole-graph pass**: apply-reduce over every vertex between supersteps
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PregelRuntime                             │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐                     │
//! │  │Superstep│→ │Superstep│→ │Superstep│→ ...                │
//! │  │    0    │  │    1    │  │    2    │                     │
//! │  └─────────┘  └─────────┘  └─────────┘                     │
//! │       │            │            │                           │
//! │       ▼            ▼            ▼                           │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │ Per-Superstep: Send → Gather → Apply → Hook         │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Activity policies
//!
//! - `ActivityPolicy::ActiveOnly` (default): only vertices whose value
//!   changed in the previous apply send messages.
//! - `ActivityPolicy::AllVertices`: every vertex sends every superstep.

pub mod vertex;
pub mod config;
pub mod error;
pub mod graph;
pub mod program;
pub mod runtime;

// Re-exports
pub use vertex::{VertexId, VertexState};
pub use config::PregelConfig;
pub use error::PregelError;
pub use graph::{EdgeWeight, Graph, GraphBuilder, Topology, VertexPass, DEFAULT_EDGE_WEIGHT};
pub use program::{ActivityPolicy, EdgeDirection, Iterations, VertexProgram};
pub use runtime::{PregelRuntime, RunOutcome, RunStats};
