//! Breadth-first search
//!
//! Level-synchronous: the program carries the frontier depth, and only
//! vertices discovered in the previous superstep send. A vertex keeps the
//! first depth it receives.

use std::sync::Arc;

use crate::pregel::{
    EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime, Topology,
    VertexId, VertexPass, VertexProgram, VertexState,
};

use super::check_source;

/// Hop count from the source
pub type Depth = u32;

/// Depth of a vertex the search never reached
pub const UNREACHED: Depth = Depth::MAX;

/// BFS vertex program
#[derive(Debug, Clone)]
pub struct BreadthFirstSearch {
    /// Depth assigned to vertices discovered in the current superstep
    frontier: Depth,
}

impl BreadthFirstSearch {
    pub fn new() -> Self {
        Self { frontier: 1 }
    }

    pub fn frontier(&self) -> Depth {
        self.frontier
    }
}

impl Default for BreadthFirstSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexProgram for BreadthFirstSearch {
    type Value = Depth;
    type Message = Depth;
    type Reduced = Depth;

    fn name(&self) -> &'static str {
        "bfs"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Out
    }

    fn send_message(&self, depth: &Depth) -> Option<Depth> {
        (*depth != UNREACHED && *depth + 1 == self.frontier).then_some(*depth + 1)
    }

    fn process_message(&self, message: &Depth, _weight: EdgeWeight, _dst: &Depth) -> Depth {
        *message
    }

    fn reduce(&self, total: &mut Depth, partial: Depth) {
        *total = (*total).min(partial);
    }

    fn apply(&self, total: Depth, depth: &mut Depth) -> bool {
        if *depth == UNREACHED {
            *depth = total;
            true
        } else {
            false
        }
    }

    fn on_superstep_end(&mut self, _superstep: usize, _pass: &mut VertexPass<'_, Depth>) {
        self.frontier += 1;
    }
}

/// Depth of every vertex from `source`, [`UNREACHED`] where no path exists
pub async fn breadth_first_search(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
    source: VertexId,
) -> Result<Vec<Depth>, PregelError> {
    check_source(&topology, source)?;

    let mut graph = Graph::from_topology(topology, |v| if v == source { 0 } else { UNREACHED });
    graph.set_all(VertexState::Halted);
    graph.activate(source);

    let outcome = runtime
        .run(BreadthFirstSearch::new(), graph, Iterations::UntilConverged)
        .await?;
    Ok(outcome.graph.into_values())
}
