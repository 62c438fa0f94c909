//! Zen bounds checker
//!
//! Decides, with exact rational arithmetic only, whether a linear fact
//! follows from a set of known linear facts and whether a set of facts
//! contradicts itself. Refinement predicates ("where" clauses) are
//! normalized into a canonical disjunctive form, facts are eliminated
//! incrementally, and a convex polytope takes over when elimination alone
//! cannot decide.
//!
//! # Architecture
//!
//! ```text
//! Predicate text → Lexer → Parser → Expr → Normalizer → OrGroup
//!                                                          ↓
//!                               KnownConstraints ← SumGroup facts
//!                                      ↓
//!                                ConvexNDVolume
//! ```
//!
//! # Example
//!
//! ```
//! use zen::bounds::{KnownConstraints, NormalizerState};
//!
//! let mut state = NormalizerState::new();
//! state.use_identifier_mapping("a", 1);
//! state.use_identifier_mapping("b", 2);
//!
//! let mut known = KnownConstraints::new();
//! let fact = zen::normalize_expression(&mut state, "a - b").unwrap();
//! assert!(known.insert_sum_group(&fact).unwrap());
//!
//! let query = zen::normalize_expression(&mut state, "a - b + 1").unwrap();
//! assert!(known.check_sum_group(&query).unwrap().is_true);
//! ```

pub mod ast;
pub mod bounds;
pub mod common;
pub mod datastructures;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod zmath;

// Re-exports for convenience
pub use ast::{Expr, Predicate};
pub use bounds::{KnownConstraints, NormalizerState, OrGroup, SumGroup};
pub use diagnostics::{BoundsError, PredicateError, SourceFile};

use std::rc::Rc;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse predicate text into an expression tree
pub fn parse_predicate(source: &str) -> miette::Result<Predicate> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens, source)
}

/// Parse a boolean predicate and normalize it into an OrGroup
pub fn normalize_predicate(state: &mut NormalizerState, source: &str) -> miette::Result<Rc<OrGroup>> {
    let predicate = parse_predicate(source)?;
    Ok(state.normalize_to_or_group(&predicate.expr))
}

/// Parse an arithmetic expression and normalize it into a SumGroup
pub fn normalize_expression(state: &mut NormalizerState, source: &str) -> miette::Result<Rc<SumGroup>> {
    let predicate = parse_predicate(source)?;
    let sum = state.normalize_to_sum_group(&predicate.expr)?;
    Ok(sum)
}
