//! Weakly connected components
//!
//! Min-label propagation over both edge directions. At the fixed point each
//! component is labelled with its smallest vertex id.

use std::sync::Arc;

use crate::pregel::{
    EdgeDirection, EdgeWeight, Graph, Iterations, PregelError, PregelRuntime, Topology,
    VertexId, VertexProgram,
};

/// Current label and the label last announced to neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WccValue {
    pub label: VertexId,
    pub previous: Option<VertexId>,
}

impl WccValue {
    /// Fresh vertex labelled with its own id
    pub fn new(id: VertexId) -> Self {
        Self {
            label: id,
            previous: None,
        }
    }
}

/// WCC vertex program
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedComponents;

impl VertexProgram for ConnectedComponents {
    type Value = WccValue;
    type Message = VertexId;
    type Reduced = VertexId;

    fn name(&self) -> &'static str {
        "wcc"
    }

    fn direction(&self) -> EdgeDirection {
        EdgeDirection::Both
    }

    fn send_message(&self, vertex: &WccValue) -> Option<VertexId> {
        (vertex.previous != Some(vertex.label)).then_some(vertex.label)
    }

    fn process_message(&self, message: &VertexId, _weight: EdgeWeight, _dst: &WccValue) -> VertexId {
        *message
    }

    fn reduce(&self, total: &mut VertexId, partial: VertexId) {
        *total = (*total).min(partial);
    }

    fn apply(&self, total: VertexId, vertex: &mut WccValue) -> bool {
        vertex.previous = Some(vertex.label);
        vertex.label = vertex.label.min(total);
        vertex.previous != Some(vertex.label)
    }
}

/// Component label of every vertex
pub async fn weakly_connected_components(
    runtime: &PregelRuntime,
    topology: Arc<Topology>,
) -> Result<Vec<VertexId>, PregelError> {
    let graph = Graph::from_topology(topology, WccValue::new);
    let outcome = runtime
        .run(ConnectedComponents, graph, Iterations::UntilConverged)
        .await?;
    Ok(outcome
        .graph
        .into_values()
        .into_iter()
        .map(|v| v.label)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pregel::{GraphBuilder, PregelConfig};

    fn topology(n: usize, edges: &[(u32, u32)]) -> Arc<Topology> {
        let mut builder = GraphBuilder::new(n).with_partitions(2);
        for &(s, d) in edges {
            builder.add_edge(VertexId(s), VertexId(d)).unwrap();
        }
        Arc::new(builder.build())
    }

    fn runtime() -> PregelRuntime {
        PregelRuntime::with_config(PregelConfig::default().with_parallelism(2)).unwrap()
    }

    fn ids(labels: &[VertexId]) -> Vec<u32> {
        labels.iter().map(|v| v.0).collect()
    }

    #[tokio::test]
    async fn test_components_take_minimum_id() {
        // {0,3,4} via mixed directions, {1,5}, {2} isolated
        let topo = topology(6, &[(3, 0), (3, 4), (5, 1)]);
        let labels = weakly_connected_components(&runtime(), topo).await.unwrap();

        assert_eq!(ids(&labels), vec![0, 1, 2, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_edge_direction_is_ignored() {
        // 4 -> 3 -> 2 -> 1 -> 0 chain pointing at the minimum
        let topo = topology(5, &[(4, 3), (3, 2), (2, 1), (1, 0)]);
        let labels = weakly_connected_components(&runtime(), topo).await.unwrap();

        assert!(labels.iter().all(|l| *l == VertexId(0)));
    }

    #[test]
    fn test_rerun_from_converged_labels_changes_nothing() {
        let topo = topology(5, &[(1, 2), (2, 4), (3, 0)]);
        let runtime = runtime();

        let mut graph = Graph::from_topology(topo.clone(), WccValue::new);
        runtime
            .run_blocking(&mut ConnectedComponents, &mut graph, Iterations::UntilConverged)
            .unwrap();
        let converged: Vec<VertexId> = graph.values().iter().map(|v| v.label).collect();

        let mut again = Graph::from_topology(topo, |v| WccValue::new(converged[v.index()]));
        let stats = runtime
            .run_blocking(&mut ConnectedComponents, &mut again, Iterations::UntilConverged)
            .unwrap();
        let rerun: Vec<VertexId> = again.values().iter().map(|v| v.label).collect();

        assert_eq!(ids(&converged), vec![0, 1, 1, 0, 1]);
        assert_eq!(rerun, converged);
        assert_eq!(stats.supersteps, 1);
    }
}
