//! Bounds checking: canonical linear facts and what follows from them
//!
//! The pipeline is:
//!
//! ```text
//! Expr ──lower──▶ OrGroup / SumGroup ──insert──▶ KnownConstraints ──check──▶ bool
//!                       (interned)                     │
//!                                                      └─▶ ConvexNDVolume
//! ```
//!
//! All nodes are built through one [`NormalizerState`] per session, so equal
//! values are the same `Rc`. A [`KnownConstraints`] holds the facts of one
//! control-flow path; [`KnownConstraints::fork`] copies it for a branch.

pub mod cache;
pub mod config;
pub mod contradictions;
pub mod known;
pub mod lower;
pub mod mapping;
pub mod node;
pub mod normalizer;
pub mod volume;

pub use cache::{CacheStats, NodeCache};
pub use config::BoundsConfig;
pub use contradictions::{
    check_and_group, check_or_group, find_contradictions, find_contradictions_with,
    insert_and_group,
};
pub use known::{CheckResult, KnownConstraints};
pub use mapping::{map_and_group, map_or_group, map_sum_group, SlotMapping};
pub use node::{
    AndGroup, Node, NodeArray, NodeKind, OrGroup, ProductGroup, PropertyReference, SumGroup,
    Term, VariableReference,
};
pub use normalizer::{NormalizerState, ProvenanceMap};
pub use volume::{BoundsEdge, BoundsFace, ConvexNDVolume};

pub use crate::diagnostics::BoundsError;

/// Result type of the bounds checker
pub type Result<T> = std::result::Result<T, BoundsError>;
