//! Single-source shortest paths
//!
//! Bellman-Ford relaxation: a vertex whose distance improved since it last
//! applied sends it, receivers keep the minimum of `distance + weight`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pregel::{
    EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime, Topology,
    VertexId, VertexProgram, VertexState,
};

use super::check_source;

/// Distance of a vertex the search never reached
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Current and previously applied distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SsspValue {
    pub distance: f64,
    pub previous: f64,
}

impl Default for SsspValue {
    fn default() -> Self {
        Self {
            distance: UNREACHABLE,
            previous: UNREACHABLE,
        }
    }
}

/// SSSP vertex program
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestPaths;

impl VertexProgram for ShortestPaths {
    type Value = SsspValue;
    type Message = f64;
    type Reduced = f64;

    fn name(&self) -> &'static str {
        "sssp"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Out
    }

    fn send_message(&self, vertex: &SsspValue) -> Option<f64> {
        (vertex.distance != vertex.previous).then_some(vertex.distance)
    }

    fn process_message(&self, message: &f64, weight: EdgeWeight, _dst: &SsspValue) -> f64 {
        message + weight
    }

    fn reduce(&self, total: &mut f64, partial: f64) {
        *total = total.min(partial);
    }

    fn apply(&self, total: f64, vertex: &mut SsspValue) -> bool {
        vertex.previous = vertex.distance;
        vertex.distance = vertex.distance.min(total);
        vertex.distance != vertex.previous
    }
}

/// Weighted distance of every vertex from `source`, infinite where
/// unreachable. Unweighted graphs use weight 1 per edge.
pub async fn single_source_shortest_paths(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
    source: VertexId,
) -> Result<Vec<f64>, PregelError> {
    check_source(&topology, source)?;
    if let Some(weight) = topology.min_weight().filter(|w| *w < 0.0) {
        return Err(PregelError::config_error(format!(
            "shortest paths needs non-negative edge weights, found {weight}"
        )));
    }

    let mut graph = Graph::from_topology(topology, |v| {
        if v == source {
            SsspValue {
                distance: 0.0,
                previous: UNREACHABLE,
            }
        } else {
            SsspValue::default()
        }
    });
    graph.set_all(VertexState::Halted);
    graph.activate(source);

    let outcome = runtime
        .run(ShortestPaths, graph, Iterations::UntilConverged)
        .await?;
    Ok(outcome
        .graph
        .into_values()
        .into_iter()
        .map(|v| v.distance)
        .collect())
}
