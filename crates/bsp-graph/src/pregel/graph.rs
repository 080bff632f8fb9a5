//! Graph storage for the BSP engine
//!
//! [`Topology`] is the immutable part: vertex count, out- and in-adjacency in
//! CSR form with optional weights, and the contiguous-block partitioning.
//! [`Graph`] pairs a shared topology with one property value and one
//! [`VertexState`] per vertex, so several programs with different value
//! types can run over the same loaded edges.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;

use super::error::PregelError;
use super::program::EdgeDirection;
use super::vertex::{VertexId, VertexState};

/// Scalar edge weight
pub type EdgeWeight = f64;

/// Weight reported for edges of an unweighted graph
pub const DEFAULT_EDGE_WEIGHT: EdgeWeight = 1.0;

/// One direction of adjacency in CSR form
#[derive(Debug, Clone)]
struct Adjacency {
    offsets: Vec<usize>, // [V+1] vertex -> edge start
    neighbors: Vec<u32>, // [E]
    weights: Option<Vec<EdgeWeight>>,
}

impl Adjacency {
    /// Counting-sort the edge list by `key`'s first component.
    fn build(
        vertex_count: usize,
        edges: &[(u32, u32, EdgeWeight)],
        weighted: bool,
        key: impl Fn(&(u32, u32, EdgeWeight)) -> (u32, u32),
    ) -> Self {
        let mut offsets = vec![0usize; vertex_count + 1];
        for edge in edges {
            offsets[key(edge).0 as usize + 1] += 1;
        }
        for i in 0..vertex_count {
            offsets[i + 1] += offsets[i];
        }

        let mut neighbors = vec![0u32; edges.len()];
        let mut weights = weighted.then(|| vec![0.0; edges.len()]);
        let mut cursor = offsets.clone();

        for edge in edges {
            let (from, to) = key(edge);
            let slot = cursor[from as usize];
            neighbors[slot] = to;
            if let Some(ws) = &mut weights {
                ws[slot] = edge.2;
            }
            cursor[from as usize] += 1;
        }

        Self {
            offsets,
            neighbors,
            weights,
        }
    }

    #[inline]
    fn degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    fn edges(&self, v: usize) -> impl Iterator<Item = (VertexId, EdgeWeight)> + '_ {
        let weights = self.weights.as_deref();
        (self.offsets[v]..self.offsets[v + 1]).map(move |i| {
            (
                VertexId(self.neighbors[i]),
                weights.map_or(DEFAULT_EDGE_WEIGHT, |w| w[i]),
            )
        })
    }
}

/// Immutable directed graph topology
#[derive(Debug, Clone)]
pub struct Topology {
    vertex_count: usize,
    outbound: Adjacency,
    inbound: Adjacency,
    partitions: usize,
    block: usize,
}

impl Topology {
    /// Number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of directed edges, duplicates included
    pub fn edge_count(&self) -> usize {
        self.outbound.neighbors.len()
    }

    /// Whether edges carry explicit weights
    pub fn is_weighted(&self) -> bool {
        self.outbound.weights.is_some()
    }

    /// Smallest edge weight, `None` for a graph without edges
    pub fn min_weight(&self) -> Option<EdgeWeight> {
        match &self.outbound.weights {
            Some(ws) => ws.iter().copied().reduce(EdgeWeight::min),
            None if self.edge_count() > 0 => Some(DEFAULT_EDGE_WEIGHT),
            None => None,
        }
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.outbound.degree(v.index())
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.inbound.degree(v.index())
    }

    /// Edges leaving `v` as `(target, weight)`
    pub fn out_edges(&self, v: VertexId) -> impl Iterator<Item = (VertexId, EdgeWeight)> + '_ {
        self.outbound.edges(v.index())
    }

    /// Edges entering `v` as `(source, weight)`
    pub fn in_edges(&self, v: VertexId) -> impl Iterator<Item = (VertexId, EdgeWeight)> + '_ {
        self.inbound.edges(v.index())
    }

    /// Edges over which `v` receives messages of a program traversing
    /// `direction`, as `(sender, weight)`.
    ///
    /// `Out` messages travel source to target, so they arrive over in-edges;
    /// `In` messages travel target to source and arrive over out-edges.
    pub fn incoming(
        &self,
        v: VertexId,
        direction: EdgeDirection,
    ) -> impl Iterator<Item = (VertexId, EdgeWeight)> + '_ {
        let (first, second) = match direction {
            EdgeDirection::Out => (&self.inbound, None),
            EdgeDirection::In => (&self.outbound, None),
            EdgeDirection::Both => (&self.inbound, Some(&self.outbound)),
        };
        std::iter::once(first)
            .chain(second)
            .flat_map(move |adjacency| adjacency.edges(v.index()))
    }

    /// Number of partitions
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Vertices per partition (the last one may be shorter)
    #[inline]
    pub fn partition_len(&self) -> usize {
        self.block
    }

    /// Partition that owns `v`
    #[inline]
    pub fn owner(&self, v: VertexId) -> usize {
        v.index() / self.block
    }

    /// Vertex index range owned by `partition`
    pub fn partition_range(&self, partition: usize) -> Range<usize> {
        let start = (partition * self.block).min(self.vertex_count);
        let end = (start + self.block).min(self.vertex_count);
        start..end
    }

    /// Same edges split into a different number of partitions
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self.block = block_len(self.vertex_count, self.partitions);
        self
    }
}

fn block_len(vertex_count: usize, partitions: usize) -> usize {
    vertex_count.div_ceil(partitions).max(1)
}

/// Accumulates edges and produces a [`Topology`]
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    vertex_count: usize,
    edges: Vec<(u32, u32, EdgeWeight)>,
    weighted: bool,
    partitions: usize,
}

impl GraphBuilder {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            weighted: false,
            partitions: 1,
        }
    }

    /// Set the number of partitions
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    /// Reserve space for `additional` edges
    pub fn reserve(&mut self, additional: usize) {
        self.edges.reserve(additional);
    }

    /// Add an unweighted edge
    pub fn add_edge(&mut self, src: VertexId, dst: VertexId) -> Result<&mut Self, PregelError> {
        self.push(src, dst, DEFAULT_EDGE_WEIGHT)
    }

    /// Add a weighted edge; the topology becomes weighted
    ///
    /// Weights must be finite.
    pub fn add_weighted_edge(
        &mut self,
        src: VertexId,
        dst: VertexId,
        weight: EdgeWeight,
    ) -> Result<&mut Self, PregelError> {
        if !weight.is_finite() {
            return Err(PregelError::config_error(format!(
                "edge {} -> {} has non-finite weight {weight}",
                src.external(),
                dst.external()
            )));
        }
        self.weighted = true;
        self.push(src, dst, weight)
    }

    fn push(
        &mut self,
        src: VertexId,
        dst: VertexId,
        weight: EdgeWeight,
    ) -> Result<&mut Self, PregelError> {
        for v in [src, dst] {
            if v.index() >= self.vertex_count {
                return Err(PregelError::VertexOutOfRange {
                    vertex_id: v,
                    vertex_count: self.vertex_count,
                });
            }
        }
        self.edges.push((src.0, dst.0, weight));
        Ok(self)
    }

    /// Build both CSR directions
    pub fn build(self) -> Topology {
        let n = self.vertex_count;
        let (outbound, inbound) = rayon::join(
            || Adjacency::build(n, &self.edges, self.weighted, |&(s, d, _)| (s, d)),
            || Adjacency::build(n, &self.edges, self.weighted, |&(s, d, _)| (d, s)),
        );

        Topology {
            vertex_count: n,
            outbound,
            inbound,
            partitions: self.partitions,
            block: block_len(n, self.partitions),
        }
    }
}

/// Topology plus one property value and activity state per vertex
#[derive(Debug, Clone)]
pub struct Graph<V> {
    pub(super) topology: Arc<Topology>,
    pub(super) values: Vec<V>,
    pub(super) states: Vec<VertexState>,
}

impl<V> Graph<V> {
    /// Allocate per-vertex buffers, every vertex starting `Active`
    pub fn from_topology(topology: Arc<Topology>, init: impl Fn(VertexId) -> V) -> Self {
        let n = topology.vertex_count();
        let values = (0..n as u32).map(|v| init(VertexId(v))).collect();
        Self {
            topology,
            values,
            states: vec![VertexState::Active; n],
        }
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn vertex_count(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, v: VertexId) -> &V {
        &self.values[v.index()]
    }

    pub fn value_mut(&mut self, v: VertexId) -> &mut V {
        &mut self.values[v.index()]
    }

    pub fn set_value(&mut self, v: VertexId, value: V) {
        self.values[v.index()] = value;
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Release the engine buffers, keeping only the property values
    pub fn into_values(self) -> Vec<V> {
        self.values
    }

    pub fn state(&self, v: VertexId) -> VertexState {
        self.states[v.index()]
    }

    pub fn activate(&mut self, v: VertexId) {
        self.states[v.index()] = VertexState::Active;
    }

    pub fn set_all(&mut self, state: VertexState) {
        self.states.fill(state);
    }

    pub fn active_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_active()).count()
    }

    /// Whole-graph pass over the property values
    pub fn pass(&mut self) -> VertexPass<'_, V> {
        VertexPass {
            values: &mut self.values,
            block: self.topology.partition_len(),
        }
    }
}

/// Apply-reduce over every vertex, partition by partition
///
/// Handed to [`VertexProgram`](super::VertexProgram) hooks between
/// supersteps. Each partition folds its own vertices; partition results are
/// then combined in partition order, so a floating-point reduction gives the
/// same answer on every run with the same partition count.
pub struct VertexPass<'a, V> {
    values: &'a mut [V],
    block: usize,
}

impl<V: Send> VertexPass<'_, V> {
    pub fn vertex_count(&self) -> usize {
        self.values.len()
    }

    /// Run `map` on every vertex and fold the results with `combine`
    pub fn apply_reduce<R, F, C>(&mut self, identity: R, map: F, combine: C) -> R
    where
        R: Clone + Send + Sync,
        F: Fn(VertexId, &mut V) -> R + Sync,
        C: Fn(R, R) -> R + Sync,
    {
        let block = self.block;
        let partials: Vec<R> = self
            .values
            .par_chunks_mut(block)
            .enumerate()
            .map(|(partition, chunk)| {
                let base = partition * block;
                chunk
                    .iter_mut()
                    .enumerate()
                    .fold(identity.clone(), |acc, (offset, value)| {
                        combine(acc, map(VertexId((base + offset) as u32), value))
                    })
            })
            .collect();
        partials.into_iter().fold(identity, &combine)
    }

    /// Run `f` on every vertex
    pub fn for_each<F>(&mut self, f: F)
    where
        F: Fn(VertexId, &mut V) + Sync,
    {
        self.apply_reduce((), |v, value| f(v, value), |(), ()| ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(builder: &mut GraphBuilder, list: &[(u32, u32)]) {
        for &(s, d) in list {
            builder.add_edge(VertexId(s), VertexId(d)).unwrap();
        }
    }

    #[test]
    fn test_build_csr_both_directions() {
        let mut builder = GraphBuilder::new(4);
        edges(&mut builder, &[(0, 1), (0, 2), (1, 2), (2, 0)]);
        let topology = builder.build();

        assert_eq!(topology.vertex_count(), 4);
        assert_eq!(topology.edge_count(), 4);
        assert_eq!(topology.out_degree(VertexId(0)), 2);
        assert_eq!(topology.in_degree(VertexId(2)), 2);
        assert_eq!(topology.out_degree(VertexId(3)), 0);

        let targets: Vec<_> = topology.out_edges(VertexId(0)).map(|(v, _)| v.0).collect();
        assert_eq!(targets, vec![1, 2]);
        let sources: Vec<_> = topology.in_edges(VertexId(2)).map(|(v, _)| v.0).collect();
        assert_eq!(sources, vec![0, 1]);
    }

    #[test]
    fn test_unweighted_edges_report_default_weight() {
        let mut builder = GraphBuilder::new(2);
        edges(&mut builder, &[(0, 1)]);
        let topology = builder.build();

        assert!(!topology.is_weighted());
        assert_eq!(topology.min_weight(), Some(DEFAULT_EDGE_WEIGHT));
        let (_, w) = topology.out_edges(VertexId(0)).next().unwrap();
        assert_eq!(w, DEFAULT_EDGE_WEIGHT);
    }

    #[test]
    fn test_weighted_edges_follow_both_directions() {
        let mut builder = GraphBuilder::new(3);
        builder
            .add_weighted_edge(VertexId(0), VertexId(1), 2.5)
            .unwrap()
            .add_weighted_edge(VertexId(2), VertexId(1), 0.5)
            .unwrap();
        let topology = builder.build();

        assert!(topology.is_weighted());
        assert_eq!(topology.min_weight(), Some(0.5));
        let incoming: Vec<_> = topology.in_edges(VertexId(1)).collect();
        assert_eq!(incoming, vec![(VertexId(0), 2.5), (VertexId(2), 0.5)]);
    }

    #[test]
    fn test_out_of_range_edge_is_rejected() {
        let mut builder = GraphBuilder::new(2);
        let err = builder.add_edge(VertexId(0), VertexId(2)).unwrap_err();
        assert!(matches!(
            err,
            PregelError::VertexOutOfRange {
                vertex_id: VertexId(2),
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn test_incoming_by_direction() {
        let mut builder = GraphBuilder::new(3);
        edges(&mut builder, &[(0, 1), (1, 2)]);
        let topology = builder.build();
        let senders = |direction| -> Vec<u32> {
            topology
                .incoming(VertexId(1), direction)
                .map(|(v, _)| v.0)
                .collect()
        };

        assert_eq!(senders(EdgeDirection::Out), vec![0]);
        assert_eq!(senders(EdgeDirection::In), vec![2]);
        assert_eq!(senders(EdgeDirection::Both), vec![0, 2]);
    }

    #[test]
    fn test_non_finite_weight_is_rejected() {
        let mut builder = GraphBuilder::new(2);
        for weight in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = builder
                .add_weighted_edge(VertexId(0), VertexId(1), weight)
                .unwrap_err();
            assert!(err.is_config());
        }
        builder.add_weighted_edge(VertexId(0), VertexId(1), -2.5).unwrap();

        let topology = builder.build();
        assert_eq!(topology.edge_count(), 1);
        assert_eq!(topology.min_weight(), Some(-2.5));
    }

    #[test]
    fn test_partition_owner_and_ranges() {
        let topology = GraphBuilder::new(10).with_partitions(3).build();

        assert_eq!(topology.partition_len(), 4);
        assert_eq!(topology.owner(VertexId(0)), 0);
        assert_eq!(topology.owner(VertexId(4)), 1);
        assert_eq!(topology.owner(VertexId(9)), 2);
        assert_eq!(topology.partition_range(2), 8..10);

        let covered: usize = (0..topology.partitions())
            .map(|p| topology.partition_range(p).len())
            .sum();
        assert_eq!(covered, 10);
    }

    #[test]
    fn test_more_partitions_than_vertices() {
        let topology = GraphBuilder::new(2).with_partitions(8).build();
        assert_eq!(topology.partition_len(), 1);
        assert_eq!(topology.partition_range(5), 2..2);
    }

    #[test]
    fn test_graph_state_helpers() {
        let topology = Arc::new(GraphBuilder::new(3).build());
        let mut graph = Graph::from_topology(topology, |v| v.0 * 10);

        assert_eq!(graph.active_count(), 3);
        graph.set_all(VertexState::Halted);
        graph.activate(VertexId(1));
        assert_eq!(graph.active_count(), 1);
        assert_eq!(*graph.value(VertexId(2)), 20);

        graph.set_value(VertexId(2), 7);
        assert_eq!(graph.into_values(), vec![0, 10, 7]);
    }

    #[test]
    fn test_apply_reduce_visits_every_vertex_once() {
        let topology = Arc::new(GraphBuilder::new(7).with_partitions(3).build());
        let mut graph = Graph::from_topology(topology, |_| 0u32);

        let visited = graph.pass().apply_reduce(
            0usize,
            |v, value| {
                *value = v.0 + 1;
                1
            },
            |a, b| a + b,
        );

        assert_eq!(visited, 7);
        assert_eq!(graph.values(), &[1, 2, 3, 4, 5, 6, 7]);
    }
}
