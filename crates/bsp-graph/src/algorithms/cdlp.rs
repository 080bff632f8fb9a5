//! Community detection by label propagation
//!
//! Every superstep each vertex adopts the most frequent label among its
//! neighbors' labels and its own, ties going to the smallest label. Labels
//! travel along both edge directions, so a pair joined by edges both ways
//! counts twice.

use std::cmp::Reverse;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::pregel::{
    ActivityPolicy, EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime,
    Topology, VertexId, VertexProgram,
};

/// Label frequency table
///
/// Most vertices see one distinct label once propagation settles, so the
/// table stays allocation-free until a second distinct label shows up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelHistogram {
    #[default]
    Empty,
    Single {
        label: VertexId,
        count: u32,
    },
    Multi(FxHashMap<VertexId, u32>),
}

impl LabelHistogram {
    /// Histogram holding one occurrence of `label`
    pub fn single(label: VertexId) -> Self {
        LabelHistogram::Single { label, count: 1 }
    }

    pub fn record(&mut self, label: VertexId) {
        self.record_n(label, 1);
    }

    fn record_n(&mut self, label: VertexId, n: u32) {
        match self {
            LabelHistogram::Empty => *self = LabelHistogram::Single { label, count: n },
            LabelHistogram::Single { label: seen, count } if *seen == label => *count += n,
            LabelHistogram::Single { label: seen, count } => {
                let mut counts = FxHashMap::default();
                counts.insert(*seen, *count);
                counts.insert(label, n);
                *self = LabelHistogram::Multi(counts);
            }
            LabelHistogram::Multi(counts) => *counts.entry(label).or_insert(0) += n,
        }
    }

    /// Add every occurrence recorded in `other`
    pub fn merge(&mut self, other: LabelHistogram) {
        match other {
            LabelHistogram::Empty => {}
            LabelHistogram::Single { label, count } => self.record_n(label, count),
            LabelHistogram::Multi(counts) => {
                if matches!(self, LabelHistogram::Empty) {
                    *self = LabelHistogram::Multi(counts);
                } else {
                    for (label, count) in counts {
                        self.record_n(label, count);
                    }
                }
            }
        }
    }

    /// Number of distinct labels
    pub fn distinct(&self) -> usize {
        match self {
            LabelHistogram::Empty => 0,
            LabelHistogram::Single { .. } => 1,
            LabelHistogram::Multi(counts) => counts.len(),
        }
    }

    pub fn count(&self, label: VertexId) -> u32 {
        match self {
            LabelHistogram::Empty => 0,
            LabelHistogram::Single { label: seen, count } => {
                if *seen == label {
                    *count
                } else {
                    0
                }
            }
            LabelHistogram::Multi(counts) => counts.get(&label).copied().unwrap_or(0),
        }
    }

    /// Most frequent label, smallest on ties
    ///
    /// # Panics
    ///
    /// On an empty histogram; apply always records the vertex's own label
    /// first, so an empty one means the engine broke its contract.
    pub fn majority(&self) -> VertexId {
        match self {
            LabelHistogram::Empty => panic!("majority of an empty label histogram"),
            LabelHistogram::Single { label, .. } => *label,
            LabelHistogram::Multi(counts) => counts
                .iter()
                .max_by_key(|(label, count)| (**count, Reverse(**label)))
                .map(|(label, _)| *label)
                .expect("multi-label histogram holds at least two labels"),
        }
    }
}

/// CDLP vertex program
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPropagation;

impl VertexProgram for LabelPropagation {
    type Value = VertexId;
    type Message = VertexId;
    type Reduced = LabelHistogram;

    fn name(&self) -> &'static str {
        "cdlp"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Both
    }

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::AllVertices
    }

    fn send_message(&self, label: &VertexId) -> Option<VertexId> {
        Some(*label)
    }

    fn process_message(&self, message: &VertexId, _weight: EdgeWeight, _dst: &VertexId) -> LabelHistogram {
        LabelHistogram::single(*message)
    }

    fn reduce(&self, total: &mut LabelHistogram, partial: LabelHistogram) {
        total.merge(partial);
    }

    fn apply(&self, mut total: LabelHistogram, label: &mut VertexId) -> bool {
        total.record(*label);
        let next = total.majority();
        let changed = next != *label;
        *label = next;
        changed
    }
}

/// Community label of every vertex after `iterations` supersteps
pub async fn community_detection(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
    iterations: usize,
) -> Result<Vec<VertexId>, PregelError> {
    let graph = Graph::from_topology(topology, |v| v);
    let outcome = runtime
        .run(LabelPropagation, graph, Iterations::Fixed(iterations))
        .await?;
    Ok(outcome.graph.into_values())
}
