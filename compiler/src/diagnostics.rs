//! Diagnostic reporting
//!
//! Two error families live here:
//! - [`PredicateError`]: lexical and syntax errors in predicate text, with
//!   source labels for miette's fancy renderer.
//! - [`BoundsError`]: failures of the normalizer and the constraint engine.
//!
//! A contradiction or an unprovable fact is never an error. Those are plain
//! `Ok(false)` answers from the constraint store.

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source text for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Errors produced while reading predicate text
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PredicateError {
    #[error("Unexpected character '{found}'")]
    #[diagnostic(code(lex::invalid_character))]
    InvalidCharacter {
        found: String,
        #[label("not part of any token")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of predicate")]
    #[diagnostic(
        code(parse::unexpected_eof),
        help("the predicate ends in the middle of an expression")
    )]
    UnexpectedEof {
        #[label("expected more tokens")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

/// Errors of the normalizer and the constraint engine
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum BoundsError {
    // === Normalization ===
    #[error("Cannot normalize {shape} into a linear sum")]
    #[diagnostic(
        code(bounds::cannot_normalize),
        help("only numbers, identifiers, property accesses, +, - and * have an arithmetic normal form")
    )]
    CannotNormalize { shape: String },

    #[error("Operator `{op}` has no arithmetic normal form")]
    #[diagnostic(code(bounds::unsupported_operator))]
    UnsupportedOperator { op: String },

    #[error("Malformed integer literal `{text}`")]
    #[diagnostic(
        code(bounds::malformed_literal),
        help("literals must fit in a signed 64-bit integer")
    )]
    MalformedLiteral { text: String },

    #[error("Identifier `{name}` has no slot")]
    #[diagnostic(
        code(bounds::unknown_identifier),
        help("register the identifier with `use_identifier_mapping` before normalizing")
    )]
    UnknownIdentifier { name: String },

    // === Internal invariants ===
    #[error("Matrix sizes are not compatible: {lhs_rows}x{lhs_cols} and {rhs_rows}x{rhs_cols}")]
    #[diagnostic(code(bounds::matrix_shape))]
    MatrixShape {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("Not enough basis vectors to create face: needed {needed}, supplied {supplied}")]
    #[diagnostic(code(bounds::geometry))]
    NotEnoughBasisVectors { needed: usize, supplied: usize },

    #[error("Polytope is limited to {limit} spanning vectors")]
    #[diagnostic(code(bounds::polytope_capacity))]
    PolytopeCapacity { limit: usize },
}

impl BoundsError {
    /// Internal invariant violations indicate a bookkeeping bug rather than a
    /// problem with the checked program.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            BoundsError::MatrixShape { .. } | BoundsError::NotEnoughBasisVectors { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_conversion() {
        let span: SourceSpan = Span::new(3, 7).into();
        assert_eq!(span.offset(), 3);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn test_error_messages() {
        let err = BoundsError::NotEnoughBasisVectors {
            needed: 2,
            supplied: 1,
        };
        assert_eq!(
            err.to_string(),
            "Not enough basis vectors to create face: needed 2, supplied 1"
        );
        assert!(err.is_internal());
        assert!(!BoundsError::UnsupportedOperator { op: "/".into() }.is_internal());
    }
}
