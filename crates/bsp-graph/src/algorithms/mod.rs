//! Graphalytics algorithms as vertex programs
//!
//! Each module holds the program(s) for one algorithm plus an async driver
//! that seeds the vertex values, runs the phases and projects the result.
//! [`Algorithm`] is the closed set of kinds the command line dispatches on.

pub mod bfs;
pub mod cdlp;
pub mod lcc;
pub mod neighbor_set;
pub mod pagerank;
pub mod sssp;
pub mod wcc;

use std::sync::Arc;

use crate::pregel::{PregelError, PregelRuntime, Topology, VertexId};

pub use bfs::{breadth_first_search, BreadthFirstSearch, Depth, UNREACHED};
pub use cdlp::{community_detection, LabelHistogram, LabelPropagation};
pub use lcc::{local_clustering_coefficient, CountTriangles, CollectNeighbors, LccConfig};
pub use neighbor_set::{BitVector, NeighborSet, DEFAULT_BITMAP_THRESHOLD};
pub use pagerank::{pagerank, DegreeCount, PageRank, PageRankConfig, DEFAULT_DAMPING_FACTOR};
pub use sssp::{single_source_shortest_paths, ShortestPaths, UNREACHABLE};
pub use wcc::{weakly_connected_components, ConnectedComponents};

/// One algorithm with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    Bfs { source: VertexId },
    Sssp { source: VertexId },
    Wcc,
    Cdlp { iterations: usize },
    PageRank(PageRankConfig),
    Lcc(LccConfig),
}

/// Per-vertex result of an [`Algorithm`], indexed by vertex
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmOutput {
    Depths(Vec<Depth>),
    Distances(Vec<f64>),
    Labels(Vec<VertexId>),
    Scores(Vec<f64>),
}

impl AlgorithmOutput {
    pub fn len(&self) -> usize {
        match self {
            AlgorithmOutput::Depths(v) => v.len(),
            AlgorithmOutput::Distances(v) | AlgorithmOutput::Scores(v) => v.len(),
            AlgorithmOutput::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Bfs { .. } => "bfs",
            Algorithm::Sssp { .. } => "sssp",
            Algorithm::Wcc => "wcc",
            Algorithm::Cdlp { .. } => "cdlp",
            Algorithm::PageRank(_) => "pagerank",
            Algorithm::Lcc(_) => "lcc",
        }
    }

    /// Run every phase of the algorithm over `topology`
    pub async fn run(
        &self,
        runtime: &PregelRuntime,
        topology: Arc<Topology>,
    ) -> Result<AlgorithmOutput, PregelError> {
        let output = match self {
            Algorithm::Bfs { source } => {
                AlgorithmOutput::Depths(breadth_first_search(runtime, topology, *source).await?)
            }
            Algorithm::Sssp { source } => AlgorithmOutput::Distances(
                single_source_shortest_paths(runtime, topology, *source).await?,
            ),
            Algorithm::Wcc => {
                AlgorithmOutput::Labels(weakly_connected_components(runtime, topology).await?)
            }
            Algorithm::Cdlp { iterations } => AlgorithmOutput::Labels(
                community_detection(runtime, topology, *iterations).await?,
            ),
            Algorithm::PageRank(config) => {
                AlgorithmOutput::Scores(pagerank(runtime, topology, *config).await?)
            }
            Algorithm::Lcc(config) => AlgorithmOutput::Scores(
                local_clustering_coefficient(runtime, topology, *config).await?,
            ),
        };
        Ok(output)
    }
}

/// Reject a source vertex outside the topology
pub(crate) fn check_source(topology: &Topology, source: VertexId) -> Result<(), PregelError> {
    if source.index() >= topology.vertex_count() {
        return Err(PregelError::invalid_source(
            source.external(),
            topology.vertex_count(),
        ));
    }
    Ok(())
}
