//! PageRank with dangling-mass redistribution
//!
//! Degrees come from two one-superstep counting passes. The power iteration
//! then runs a fixed number of supersteps; after each one a whole-graph
//! pass resets vertices without in-edges and sums the score held by
//! vertices without out-edges, which is spread evenly in the next
//! superstep. Scores sum to one after every superstep.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pregel::{
    ActivityPolicy, EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime,
    Topology, VertexPass, VertexProgram,
};

/// Damping factor used when none is given
pub const DEFAULT_DAMPING_FACTOR: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRankConfig {
    pub damping_factor: f64,
    pub iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: DEFAULT_DAMPING_FACTOR,
            iterations: 20,
        }
    }
}

impl PageRankConfig {
    pub fn validate(&self) -> Result<(), PregelError> {
        if !(0.0..=1.0).contains(&self.damping_factor) {
            return Err(PregelError::config_error(format!(
                "damping factor must lie in [0, 1], got {}",
                self.damping_factor
            )));
        }
        Ok(())
    }
}

/// Score plus the degrees the update rule needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRankValue {
    pub score: f64,
    pub out_degree: u32,
    pub in_degree: u32,
}

/// Counts edges per vertex in one superstep
///
/// Every vertex sends 1 against `direction`'s flow; whoever receives sums
/// them. Sending along `In` lands one message per out-edge at the edge
/// source, so it yields out-degrees; `Out` yields in-degrees.
#[derive(Debug, Clone, Copy)]
pub struct DegreeCount {
    direction: EdgeDirection,
}

impl DegreeCount {
    pub fn out_degrees() -> Self {
        Self {
            direction: EdgeDirection::In,
        }
    }

    pub fn in_degrees() -> Self {
        Self {
            direction: EdgeDirection::Out,
        }
    }
}

impl VertexProgram for DegreeCount {
    type Value = PageRankValue;
    type Message = u32;
    type Reduced = u32;

    fn name(&self) -> &'static str {
        match self.direction {
            EdgeDirection::In => "out_degree",
            _ => "in_degree",
        }
    }

    fn direction(&self) -> EdgeDirection {
        self.direction
    }

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::AllVertices
    }

    fn send_message(&self, _vertex: &PageRankValue) -> Option<u32> {
        Some(1)
    }

    fn process_message(&self, message: &u32, _weight: EdgeWeight, _dst: &PageRankValue) -> u32 {
        *message
    }

    fn reduce(&self, total: &mut u32, partial: u32) {
        *total += partial;
    }

    fn apply(&self, total: u32, vertex: &mut PageRankValue) -> bool {
        match self.direction {
            EdgeDirection::In => vertex.out_degree = total,
            _ => vertex.in_degree = total,
        }
        true
    }
}

/// Damped power iteration over precomputed degrees
#[derive(Debug, Clone)]
pub struct PageRank {
    damping: f64,
    vertex_count: f64,
    /// Total score held by vertices without out-edges
    dangling_mass: f64,
}

impl PageRank {
    pub fn new(damping: f64, vertex_count: usize) -> Self {
        Self {
            damping,
            vertex_count: vertex_count as f64,
            dangling_mass: 0.0,
        }
    }

    pub fn dangling_mass(&self) -> f64 {
        self.dangling_mass
    }

    /// Score of a vertex nobody links to
    fn unlinked_score(&self) -> f64 {
        (1.0 - self.damping) / self.vertex_count
            + self.damping * self.dangling_mass / self.vertex_count
    }
}

impl VertexProgram for PageRank {
    type Value = PageRankValue;
    type Message = f64;
    type Reduced = f64;

    fn name(&self) -> &'static str {
        "pagerank"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Out
    }

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::AllVertices
    }

    fn send_message(&self, vertex: &PageRankValue) -> Option<f64> {
        (vertex.out_degree > 0).then(|| vertex.score / f64::from(vertex.out_degree))
    }

    fn process_message(&self, message: &f64, _weight: EdgeWeight, _dst: &PageRankValue) -> f64 {
        *message
    }

    fn reduce(&self, total: &mut f64, partial: f64) {
        *total += partial;
    }

    fn apply(&self, total: f64, vertex: &mut PageRankValue) -> bool {
        let n = self.vertex_count;
        vertex.score =
            (1.0 - self.damping) / n + self.damping * (total + self.dangling_mass / n);
        true
    }

    fn on_start(&mut self, pass: &mut VertexPass<'_, PageRankValue>) {
        let initial = 1.0 / self.vertex_count;
        let dangling = pass.apply_reduce(
            0usize,
            |_, vertex| {
                vertex.score = initial;
                usize::from(vertex.out_degree == 0)
            },
            |a, b| a + b,
        );
        self.dangling_mass = dangling as f64 / self.vertex_count;
    }

    fn on_superstep_end(&mut self, _superstep: usize, pass: &mut VertexPass<'_, PageRankValue>) {
        let reset = self.unlinked_score();
        self.dangling_mass = pass.apply_reduce(
            0.0,
            |_, vertex| {
                if vertex.in_degree == 0 {
                    vertex.score = reset;
                }
                if vertex.out_degree == 0 {
                    vertex.score
                } else {
                    0.0
                }
            },
            |a, b| a + b,
        );
    }
}

/// PageRank score of every vertex
pub async fn pagerank(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
    config: PageRankConfig,
) -> Result<Vec<f64>, PregelError> {
    config.validate()?;
    let n = topology.vertex_count();
    if n == 0 {
        return Ok(Vec::new());
    }

    let graph = Graph::from_topology(topology, |_| PageRankValue::default());
    let outcome = runtime
        .run(DegreeCount::out_degrees(), graph, Iterations::Fixed(1))
        .await?;
    let outcome = runtime
        .run(DegreeCount::in_degrees(), outcome.graph, Iterations::Fixed(1))
        .await?;
    let outcome = runtime
        .run(
            PageRank::new(config.damping_factor, n),
            outcome.graph,
            Iterations::Fixed(config.iterations),
        )
        .await?;

    Ok(outcome
        .graph
        .into_values()
        .into_iter()
        .map(|v| v.score)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pregel::{GraphBuilder, PregelConfig, VertexId};

    fn topology(n: usize, edges: &[(u32, u32)]) -> Arc<Topology> {
        let mut builder = GraphBuilder::new(n).with_partitions(3);
        for &(s, d) in edges {
            builder.add_edge(VertexId(s), VertexId(d)).unwrap();
        }
        Arc::new(builder.build())
    }

    fn runtime() -> PregelRuntime {
        PregelRuntime::with_config(PregelConfig::default().with_parallelism(2)).unwrap()
    }

    fn config(iterations: usize) -> PageRankConfig {
        PageRankConfig {
            iterations,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_degrees() {
        let topo = topology(4, &[(0, 1), (0, 2), (1, 2), (3, 3)]);
        let runtime = runtime();
        let graph = Graph::from_topology(topo, |_| PageRankValue::default());

        let outcome = runtime
            .run(DegreeCount::out_degrees(), graph, Iterations::Fixed(1))
            .await
            .unwrap();
        let outcome = runtime
            .run(DegreeCount::in_degrees(), outcome.graph, Iterations::Fixed(1))
            .await
            .unwrap();

        let degrees: Vec<(u32, u32)> = outcome
            .graph
            .values()
            .iter()
            .map(|v| (v.out_degree, v.in_degree))
            .collect();
        assert_eq!(degrees, vec![(2, 0), (1, 1), (0, 2), (1, 1)]);
    }

    #[tokio::test]
    async fn test_scores_sum_to_one_every_superstep() {
        // 3 is dangling, 0 has no in-edges, 4 is isolated
        let topo = topology(5, &[(0, 1), (1, 2), (2, 1), (2, 3), (1, 3)]);
        let runtime = runtime();

        for iterations in 0..8 {
            let scores = pagerank(&runtime, topo.clone(), config(iterations))
                .await
                .unwrap();
            let total: f64 = scores.iter().sum();
            assert!((total - 1.0).abs() < 1e-12, "sum {total} after {iterations}");
        }
    }

    #[tokio::test]
    async fn test_isolated_vertex_gets_teleport_and_dangling_share() {
        let topo = topology(4, &[(0, 1), (1, 2), (2, 0)]);
        let d = DEFAULT_DAMPING_FACTOR;

        // cycle vertices settle at equal scores; mass held by the isolated vertex
        // after k supersteps follows s' = (1 - d)/4 + d * s/4
        let scores = pagerank(&runtime(), topo, config(30)).await.unwrap();
        let fixed_point = (1.0 - d) / (4.0 - d);

        assert!((scores[3] - fixed_point).abs() < 1e-9);
        assert!(scores[3] >= (1.0 - d) / 4.0);
        assert!((scores[0] - scores[1]).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_symmetric_cycle_is_uniform() {
        let topo = topology(3, &[(0, 1), (1, 2), (2, 0)]);
        let scores = pagerank(&runtime(), topo, config(10)).await.unwrap();
        for s in scores {
            assert!((s - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn test_invalid_damping_factor() {
        let topo = topology(2, &[(0, 1)]);
        let err = pagerank(
            &runtime(),
            topo,
            PageRankConfig {
                damping_factor: 1.5,
                iterations: 3,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PregelError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let topo = topology(0, &[]);
        let scores = pagerank(&runtime(), topo, config(5)).await.unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_initial_dangling_mass() {
        let topo = topology(4, &[(0, 1)]);
        let mut graph = Graph::from_topology(topo, |v| PageRankValue {
            out_degree: u32::from(v.0 == 0),
            ..Default::default()
        });
        let mut program = PageRank::new(0.85, 4);
        program.on_start(&mut graph.pass());

        assert!((program.dangling_mass() - 0.75).abs() < 1e-15);
        assert!(graph.values().iter().all(|v| v.score == 0.25));
    }
}
