//! Configuration for a bounds-checking session

use serde::{Deserialize, Serialize};

use crate::datastructures::bitset::CAPACITY;

/// Bounds checker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Record which source expression produced each fact
    pub track_provenance: bool,
    /// Spanning-vector budget of each polytope (at most 32)
    pub max_polytope_vectors: usize,
    /// Reject a fact whose negation is already implied
    pub contradiction_precheck: bool,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            track_provenance: false,
            max_polytope_vectors: CAPACITY,
            contradiction_precheck: true,
        }
    }
}

impl BoundsConfig {
    /// Polytope budget clamped to what a `BitSet32` can index.
    pub fn polytope_capacity(&self) -> usize {
        self.max_polytope_vectors.min(CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoundsConfig::default();
        assert!(!config.track_provenance);
        assert!(config.contradiction_precheck);
        assert_eq!(config.polytope_capacity(), 32);
    }

    #[test]
    fn test_capacity_is_clamped() {
        let config = BoundsConfig {
            max_polytope_vectors: 100,
            ..BoundsConfig::default()
        };
        assert_eq!(config.polytope_capacity(), 32);
    }
}
