//! The vertex-program contract
//!
//! A superstep runs four phases in order:
//!
//! 1. **send**: every eligible vertex calls [`VertexProgram::send_message`]
//!    on the property snapshot left by the previous superstep.
//! 2. **process + reduce**: for each destination, every message arriving
//!    over an incoming edge goes through [`VertexProgram::process_message`]
//!    and the partials are folded with [`VertexProgram::reduce`].
//! 3. **apply**: vertices that received at least one message call
//!    [`VertexProgram::apply`]; the returned flag decides whether they stay
//!    active.
//! 4. **hook**: [`VertexProgram::on_superstep_end`] may run whole-graph
//!    passes before the next superstep.

use serde::{Deserialize, Serialize};

use super::graph::{EdgeWeight, VertexPass};

/// Which way messages travel along a directed edge `(u, v)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// From `u` to `v`
    Out,
    /// From `v` to `u`
    In,
    /// Both ways
    Both,
}

/// Which vertices run the send phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityPolicy {
    /// Every vertex, every superstep
    AllVertices,
    /// Only vertices whose value changed in the previous apply
    #[default]
    ActiveOnly,
}

/// How long a run lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Iterations {
    /// Exactly this many supersteps, fewer if the active set empties
    Fixed(usize),
    /// Until a superstep sends no message
    UntilConverged,
}

/// A vertex-centric BSP computation
///
/// `reduce` must be associative and commutative. `apply` may mutate only
/// the vertex it is given. Callbacks take `&self`; per-run global state the
/// program owns (a frontier depth, a dangling mass) changes only in the
/// `&mut self` hooks, which run between supersteps.
pub trait VertexProgram: Send + Sync {
    /// Per-vertex property
    type Value: Send + Sync;
    /// Value sent along an edge
    type Message: Send + Sync;
    /// Per-destination accumulator
    type Reduced: Send;

    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    fn direction(&self) -> EdgeDirection;

    fn activity(&self) -> ActivityPolicy {
        ActivityPolicy::ActiveOnly
    }

    /// `None` when the vertex has nothing to send this superstep
    fn send_message(&self, vertex: &Self::Value) -> Option<Self::Message>;

    /// Turn one message arriving over one edge into a partial result
    fn process_message(
        &self,
        message: &Self::Message,
        weight: EdgeWeight,
        destination: &Self::Value,
    ) -> Self::Reduced;

    fn reduce(&self, total: &mut Self::Reduced, partial: Self::Reduced);

    /// Fold the reduced total into the vertex; `true` if the value changed
    fn apply(&self, total: Self::Reduced, vertex: &mut Self::Value) -> bool;

    /// Runs once before the first superstep
    fn on_start(&mut self, _pass: &mut VertexPass<'_, Self::Value>) {}

    /// Runs after every superstep's apply phase
    fn on_superstep_end(&mut self, _superstep: usize, _pass: &mut VertexPass<'_, Self::Value>) {}
}
