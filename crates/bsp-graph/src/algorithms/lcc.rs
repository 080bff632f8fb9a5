//! Local clustering coefficient
//!
//! Three one-superstep passes:
//!
//! 1. collect out-neighbors (ids flow against the edges),
//! 2. collect in-neighbors and index both lists into [`NeighborSet`]s,
//! 3. every vertex `w` ships a shared copy of `out(w)`; a receiver `v` counts
//!    `|out(w) ∩ all(v)|`.
//!
//! Step 3 delivers one message per edge joining `v` and `w`, in either
//! direction, so each message is weighted by `1 / multiplicity(v, w)` and
//! the neighbor pair contributes once no matter how many edges join it.
//!
//! The count is the number of directed edges between distinct neighbors of
//! `v`, and the coefficient divides it by `deg * (deg - 1)` with `deg` the
//! number of distinct neighbors. Self-loops are ignored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pregel::{
    ActivityPolicy, EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime,
    Topology, VertexId, VertexPass, VertexProgram,
};

use super::neighbor_set::{NeighborSet, DEFAULT_BITMAP_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LccConfig {
    /// Neighbor sets larger than this also get a dense bitmap
    pub bitmap_threshold: usize,
}

impl Default for LccConfig {
    fn default() -> Self {
        Self {
            bitmap_threshold: DEFAULT_BITMAP_THRESHOLD,
        }
    }
}

/// Per-vertex LCC state
#[derive(Debug, Clone, Default)]
pub struct LccValue {
    pub id: u32,
    raw_out: Vec<u32>,
    raw_in: Vec<u32>,
    /// Distinct out-neighbors, shared with the messages of the count pass
    pub out: Arc<NeighborSet>,
    /// Distinct neighbors over both directions
    pub all: NeighborSet,
    /// Edges joining this vertex to each entry of `all`
    pub multiplicity: Vec<u32>,
    pub triangles: u64,
    pub coefficient: f64,
}

impl LccValue {
    pub fn new(id: VertexId) -> Self {
        Self {
            id: id.0,
            ..Default::default()
        }
    }

    /// Turn the raw id lists into indexed sets
    fn index_neighbors(&mut self, bitmap_threshold: usize, universe: usize) {
        let id = self.id;
        let mut out = std::mem::take(&mut self.raw_out);
        let mut all = out.clone();
        all.append(&mut self.raw_in);
        self.raw_in = Vec::new();

        out.retain(|&v| v != id);
        out.sort_unstable();
        out.dedup();

        all.retain(|&v| v != id);
        all.sort_unstable();
        let (all, multiplicity) = run_lengths(&all);

        self.out = Arc::new(NeighborSet::new(out, bitmap_threshold, universe));
        self.all = NeighborSet::new(all, bitmap_threshold, universe);
        self.multiplicity = multiplicity;
    }

    /// Number of edges, either direction, joining this vertex to `neighbor`
    pub fn multiplicity_of(&self, neighbor: u32) -> u32 {
        self.all
            .position(neighbor)
            .map_or(0, |i| self.multiplicity[i])
    }
}

/// Collapse a sorted list into distinct values and their counts
fn run_lengths(sorted: &[u32]) -> (Vec<u32>, Vec<u32>) {
    let mut values = Vec::new();
    let mut counts: Vec<u32> = Vec::new();
    for &v in sorted {
        if values.last() == Some(&v) {
            if let Some(c) = counts.last_mut() {
                *c += 1;
            }
        } else {
            values.push(v);
            counts.push(1);
        }
    }
    (values, counts)
}

/// Which raw list a collection pass fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collect {
    Out,
    In { bitmap_threshold: usize },
}

/// Gathers neighbor ids in one superstep
#[derive(Debug, Clone, Copy)]
pub struct CollectNeighbors {
    target: Collect,
}

impl CollectNeighbors {
    /// Ids sent against the edges reach the edge source
    pub fn outgoing() -> Self {
        Self {
            target: Collect::Out,
        }
    }

    /// Ids sent along the edges reach the edge target; indexes the sets
    /// afterwards
    pub fn incoming(bitmap_threshold: usize) -> Self {
        Self {
            target: Collect::In { bitmap_threshold },
        }
    }
}

impl VertexProgram for CollectNeighbors {
    type Value = LccValue;
    type Message = u32;
    type Reduced = Vec<u32>;

    fn name(&self) -> &'static str {
        match self.target {
            Collect::Out => "lcc_collect_out",
            Collect::In { .. } => "lcc_collect_in",
        }
    }

    fn direction(&self) -> EdgeDirection {
        match self.target {
            Collect::Out => EdgeDirection::In,
            Collect::In { .. } => EdgeDirection::Out,
        }
    }

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::AllVertices
    }

    fn send_message(&self, vertex: &LccValue) -> Option<u32> {
        Some(vertex.id)
    }

    fn process_message(&self, message: &u32, _weight: EdgeWeight, _dst: &LccValue) -> Vec<u32> {
        vec![*message]
    }

    fn reduce(&self, total: &mut Vec<u32>, mut partial: Vec<u32>) {
        total.append(&mut partial);
    }

    fn apply(&self, total: Vec<u32>, vertex: &mut LccValue) -> bool {
        match self.target {
            Collect::Out => vertex.raw_out = total,
            Collect::In { .. } => vertex.raw_in = total,
        }
        true
    }

    fn on_superstep_end(&mut self, _superstep: usize, pass: &mut VertexPass<'_, LccValue>) {
        if let Collect::In { bitmap_threshold } = self.target {
            let universe = pass.vertex_count();
            pass.for_each(|_, vertex| vertex.index_neighbors(bitmap_threshold, universe));
        }
    }
}

/// Out-neighbor set of the sending vertex
#[derive(Debug, Clone)]
pub struct NeighborProbe {
    pub sender: u32,
    pub out: Arc<NeighborSet>,
}

/// Counts triangles through every vertex
#[derive(Debug, Clone, Copy, Default)]
pub struct CountTriangles;

impl VertexProgram for CountTriangles {
    type Value = LccValue;
    type Message = NeighborProbe;
    type Reduced = f64;

    fn name(&self) -> &'static str {
        "lcc_count"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Both
    }

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::AllVertices
    }

    fn send_message(&self, vertex: &LccValue) -> Option<NeighborProbe> {
        Some(NeighborProbe {
            sender: vertex.id,
            out: Arc::clone(&vertex.out),
        })
    }

    fn process_message(&self, probe: &NeighborProbe, _weight: EdgeWeight, dst: &LccValue) -> f64 {
        let multiplicity = dst.multiplicity_of(probe.sender);
        if multiplicity == 0 {
            // self-loop
            return 0.0;
        }
        dst.all.intersection_len(&probe.out) as f64 / f64::from(multiplicity)
    }

    fn reduce(&self, total: &mut f64, partial: f64) {
        *total += partial;
    }

    fn apply(&self, total: f64, vertex: &mut LccValue) -> bool {
        vertex.triangles = total.round() as u64;
        let degree = vertex.all.len() as f64;
        vertex.coefficient = if vertex.all.len() > 1 {
            vertex.triangles as f64 / (degree * (degree - 1.0))
        } else {
            0.0
        };
        true
    }
}

/// Clustering coefficient of every vertex
pub async fn local_clustering_coefficient(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
    config: LccConfig,
) -> Result<Vec<f64>, PregelError> {
    let graph = Graph::from_topology(topology, LccValue::new);
    let outcome = runtime
        .run(CollectNeighbors::outgoing(), graph, Iterations::Fixed(1))
        .await?;
    let outcome = runtime
        .run(
            CollectNeighbors::incoming(config.bitmap_threshold),
            outcome.graph,
            Iterations::Fixed(1),
        )
        .await?;
    let outcome = runtime
        .run(CountTriangles, outcome.graph, Iterations::Fixed(1))
        .await?;

    Ok(outcome
        .graph
        .into_values()
        .into_iter()
        .map(|v| v.coefficient)
        .collect())
}
