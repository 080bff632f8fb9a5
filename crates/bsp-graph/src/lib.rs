//! bsp-graph: bulk-synchronous vertex-centric graph analytics
//!
//! A Pregel-style engine over an immutable CSR topology, plus the six
//! Graphalytics kernels written as vertex programs on top of it.
//! - [`pregel`]: topology, vertex programs and the superstep runtime
//! - [`algorithms`]: BFS, SSSP, WCC, CDLP, PageRank and LCC
//! - [`io`]: Matrix Market input and two-column result output
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bsp_graph::{Algorithm, GraphBuilder, PregelRuntime, VertexId};
//!
//! # async fn demo() -> Result<(), bsp_graph::PregelError> {
//! let mut builder = GraphBuilder::new(3);
//! builder.add_edge(VertexId(0), VertexId(1))?;
//! builder.add_edge(VertexId(1), VertexId(2))?;
//!
//! let runtime = PregelRuntime::new()?;
//! let output = Algorithm::Wcc.run(&runtime, Arc::new(builder.build())).await?;
//! assert_eq!(output.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod io;
pub mod pregel;

// Re-exports for convenience
pub use pregel::{
    ActivityPolicy, EdgeDirection, EdgeWeight, Graph, GraphBuilder, Iterations, PregelConfig,
    PregelError, PregelRuntime, RunOutcome, RunStats, Topology, VertexId, VertexPass,
    VertexProgram, VertexState, DEFAULT_EDGE_WEIGHT,
};

pub use algorithms::{
    Algorithm, AlgorithmOutput, LccConfig, PageRankConfig, DEFAULT_BITMAP_THRESHOLD,
    DEFAULT_DAMPING_FACTOR,
};

pub use io::{load_matrix_market, read_matrix_market, write_output, write_output_to};
