//! Hash-consing table for canonical nodes
//!
//! Every node the normalizer builds goes through [`NodeCache::internalize`].
//! The bucket for the node's structural hash is scanned for a node that
//! compares equal; if one exists it is returned and the fresh value is
//! dropped. Reference identity therefore implies value equality for every
//! node handed out by one cache.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::node::{Node, Term};

/// Interning statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct nodes stored
    pub nodes: usize,
    /// Lookups answered with an existing node
    pub hits: usize,
    /// Non-empty hash buckets
    pub buckets: usize,
}

#[derive(Debug, Default)]
pub struct NodeCache {
    buckets: FxHashMap<u64, Vec<Node>>,
    nodes: usize,
    hits: usize,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance equal to `fresh`, storing `fresh` if this
    /// is the first time the value is seen.
    pub fn internalize<T: Term>(&mut self, fresh: T) -> Rc<T> {
        let bucket = self.buckets.entry(fresh.hash_code()).or_default();
        for stored in bucket.iter() {
            if let Some(existing) = T::from_node(stored) {
                if existing.compare(&fresh).is_eq() {
                    self.hits += 1;
                    return Rc::clone(existing);
                }
            }
        }
        let shared = Rc::new(fresh);
        bucket.push(T::into_node(Rc::clone(&shared)));
        self.nodes += 1;
        shared
    }

    pub fn len(&self) -> usize {
        self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            nodes: self.nodes,
            hits: self.hits,
            buckets: self.buckets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::node::{SumGroup, VariableReference};

    #[test]
    fn test_internalize_returns_shared_instance() {
        let mut cache = NodeCache::new();
        let a = cache.internalize(SumGroup::new(vec![], 5, 1));
        let b = cache.internalize(SumGroup::new(vec![], 5, 2));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(b.id, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_distinct_values_are_kept_apart() {
        let mut cache = NodeCache::new();
        let a = cache.internalize(SumGroup::new(vec![], 5, 1));
        let b = cache.internalize(SumGroup::new(vec![], 6, 2));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_same_hash_different_kind() {
        let mut cache = NodeCache::new();
        // A variable in slot 0 and the zero sum hash alike.
        let var = cache.internalize(VariableReference::new("a", 0));
        let sum = cache.internalize(SumGroup::new(vec![], 0, 1));
        assert_eq!(var.slot, 0);
        assert!(sum.is_zero());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().buckets, 1);
    }
}
