//! Vertex identifiers and activity state
//!
//! Vertices are addressed by dense 0-based indices inside the engine.
//! Input files, command-line arguments and output use 1-based identifiers;
//! the conversion happens only at those boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense 0-based vertex index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Convert a 1-based external identifier, `None` for 0 or overflow
    pub fn from_external(external: u64) -> Option<Self> {
        let index = external.checked_sub(1)?;
        u32::try_from(index).ok().map(VertexId)
    }

    /// 1-based identifier used in files and output
    pub fn external(self) -> u64 {
        u64::from(self.0) + 1
    }

    /// Position in per-vertex arrays
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for VertexId {
    fn from(index: u32) -> Self {
        VertexId(index)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a vertex takes part in the next superstep's send phase
///
/// Under [`ActivityPolicy::ActiveOnly`](super::ActivityPolicy) only
/// `Active` vertices send; a vertex becomes `Active` again when its value
/// changes during apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexState {
    #[default]
    Active,
    Halted,
}

impl VertexState {
    pub fn is_active(&self) -> bool {
        matches!(self, VertexState::Active)
    }

    /// State after apply reported `changed`
    pub fn after_apply(changed: bool) -> Self {
        if changed {
            VertexState::Active
        } else {
            VertexState::Halted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_round_trip() {
        let id = VertexId::from_external(1).unwrap();
        assert_eq!(id, VertexId(0));
        assert_eq!(id.external(), 1);
        assert_eq!(VertexId(41).external(), 42);
    }

    #[test]
    fn test_external_zero_is_rejected() {
        assert_eq!(VertexId::from_external(0), None);
        assert_eq!(VertexId::from_external(u64::MAX), None);
    }

    #[test]
    fn test_vertex_id_ordering() {
        let mut ids = vec![VertexId(3), VertexId(1), VertexId(2)];
        ids.sort();
        assert_eq!(ids, vec![VertexId(1), VertexId(2), VertexId(3)]);
    }

    #[test]
    fn test_vertex_state_default_is_active() {
        assert_eq!(VertexState::default(), VertexState::Active);
        assert!(VertexState::Active.is_active());
        assert!(!VertexState::Halted.is_active());
    }

    #[test]
    fn test_after_apply() {
        assert_eq!(VertexState::after_apply(true), VertexState::Active);
        assert_eq!(VertexState::after_apply(false), VertexState::Halted);
    }
}
