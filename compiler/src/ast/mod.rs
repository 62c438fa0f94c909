//! Abstract Syntax Tree for predicates
//!
//! A predicate is a single expression: arithmetic over integer literals,
//! identifiers and property accesses, compared with relational operators and
//! combined with boolean connectives. Every node carries a [`NodeId`]; the
//! parser records the matching source span per id.

use crate::common::{NodeId, Span};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed predicate with its span table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predicate {
    pub expr: Expr,
    /// Source span of every node, keyed by node id
    #[serde(skip)]
    pub node_spans: FxHashMap<NodeId, Span>,
}

impl Predicate {
    pub fn span_of(&self, id: NodeId) -> Option<Span> {
        self.node_spans.get(&id).copied()
    }
}

// ==================== EXPRESSIONS ====================

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Literal { id: NodeId, value: Literal },
    /// Free identifier
    Path { id: NodeId, name: String },
    /// Property access: `base.field`
    Field {
        id: NodeId,
        base: Box<Expr>,
        field: String,
    },
    /// Binary operation
    Binary {
        id: NodeId,
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    Unary {
        id: NodeId,
        op: UnaryOp,
        expr: Box<Expr>,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Path { id, .. }
            | Expr::Field { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Unary { id, .. } => *id,
        }
    }

    /// Dotted name of an identifier or property chain (`x.len`), if the
    /// expression is one.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Path { name, .. } => Some(name.clone()),
            Expr::Field { base, field, .. } => {
                base.dotted_name().map(|base| format!("{base}.{field}"))
            }
            _ => None,
        }
    }

    /// Short description of the node kind, for error messages
    pub fn shape(&self) -> String {
        match self {
            Expr::Literal {
                value: Literal::Int(_),
                ..
            } => "integer literal".to_string(),
            Expr::Literal {
                value: Literal::Bool(_),
                ..
            } => "boolean literal".to_string(),
            Expr::Path { .. } => "identifier".to_string(),
            Expr::Field { .. } => "property access".to_string(),
            Expr::Binary { op, .. } => format!("binary `{op}`"),
            Expr::Unary { op, .. } => format!("unary `{op}`"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => write!(f, "{value}"),
            Expr::Path { name, .. } => write!(f, "{name}"),
            Expr::Field { base, field, .. } => write!(f, "{base}.{field}"),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({left} {op} {right})"),
            Expr::Unary { op, expr, .. } => write!(f, "{op}{expr}"),
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    /// Integer digits as written (underscores allowed)
    Int(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(text) => write!(f, "{text}"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
