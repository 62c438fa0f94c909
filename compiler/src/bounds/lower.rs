//! Lowering expression trees into canonical forms
//!
//! Arithmetic lowers to a [`SumGroup`]; comparisons and boolean connectives
//! lower to an [`OrGroup`] of facts `sum >= 0`:
//!
//! | predicate  | fact(s)                       |
//! |------------|-------------------------------|
//! | `l < r`    | `r - l - 1 >= 0`              |
//! | `l <= r`   | `r - l >= 0`                  |
//! | `l > r`    | `l - r - 1 >= 0`              |
//! | `l >= r`   | `l - r >= 0`                  |
//! | `l == r`   | `l - r >= 0 && r - l >= 0`    |
//! | `l != r`   | negation of `l == r`          |
//!
//! A relational operand that does not lower to a sum makes the whole
//! comparison unconstrained instead of failing.

use std::rc::Rc;

use tracing::trace;

use super::node::{Node, OrGroup, SumGroup};
use super::normalizer::NormalizerState;
use super::Result;
use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::diagnostics::BoundsError;

impl NormalizerState {
    /// Lower an arithmetic expression.
    pub fn normalize_to_sum_group(&mut self, expr: &Expr) -> Result<Rc<SumGroup>> {
        match expr {
            Expr::Literal {
                value: Literal::Int(text),
                ..
            } => {
                let value = parse_integer(text)?;
                Ok(self.constant(value))
            }
            Expr::Path { .. } | Expr::Field { .. } => {
                let factor = self.factor_of(expr)?;
                Ok(self.factor_sum(factor))
            }
            Expr::Unary {
                op: UnaryOp::Neg,
                expr: inner,
                ..
            } => {
                let inner = self.normalize_to_sum_group(inner)?;
                Ok(self.negate_sum(&inner))
            }
            Expr::Unary { op, .. } => Err(BoundsError::UnsupportedOperator {
                op: op.to_string(),
            }),
            Expr::Binary {
                op, left, right, ..
            } => {
                let combine = match op {
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => *op,
                    other => {
                        return Err(BoundsError::UnsupportedOperator {
                            op: other.to_string(),
                        })
                    }
                };
                let left = self.normalize_to_sum_group(left)?;
                let right = self.normalize_to_sum_group(right)?;
                Ok(match combine {
                    BinaryOp::Add => self.add_sums(&left, &right, 0),
                    BinaryOp::Sub => self.subtract_sums(&left, &right, 0),
                    _ => self.multiply_sums(&left, &right),
                })
            }
            Expr::Literal { .. } => Err(BoundsError::CannotNormalize {
                shape: expr.shape(),
            }),
        }
    }

    /// Lower a boolean expression. Never fails: shapes without a boolean
    /// reading are unconstrained.
    pub fn normalize_to_or_group(&mut self, expr: &Expr) -> Rc<OrGroup> {
        match expr {
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
                ..
            } => {
                let left = self.normalize_to_or_group(left);
                let right = self.normalize_to_or_group(right);
                self.combine_or_groups(&left, &right)
            }
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
                ..
            } => {
                let left = self.normalize_to_or_group(left);
                let right = self.normalize_to_or_group(right);
                self.combine_or_groups_with_and(&left, &right)
            }
            Expr::Binary {
                op, left, right, ..
            } if op.is_comparison() => self.comparison(expr, *op, left, right),
            Expr::Unary {
                op: UnaryOp::Not,
                expr: inner,
                ..
            } => {
                let inner = self.normalize_to_or_group(inner);
                self.not_or_group(&inner)
            }
            Expr::Literal {
                value: Literal::Bool(true),
                ..
            } => self.unconstrained(),
            Expr::Literal {
                value: Literal::Bool(false),
                ..
            } => self.unsatisfiable(),
            _ => self.unconstrained(),
        }
    }

    fn comparison(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> Rc<OrGroup> {
        let (left, right) = match (
            self.normalize_to_sum_group(left),
            self.normalize_to_sum_group(right),
        ) {
            (Ok(left), Ok(right)) => (left, right),
            (Err(err), _) | (_, Err(err)) => {
                trace!(%expr, %err, "relational operand did not normalize");
                return self.unconstrained();
            }
        };

        let result = match op {
            BinaryOp::Lt => {
                let fact = self.subtract_sums(&right, &left, -1);
                self.fact(fact)
            }
            BinaryOp::Le => {
                let fact = self.subtract_sums(&right, &left, 0);
                self.fact(fact)
            }
            BinaryOp::Gt => {
                let fact = self.subtract_sums(&left, &right, -1);
                self.fact(fact)
            }
            BinaryOp::Ge => {
                let fact = self.subtract_sums(&left, &right, 0);
                self.fact(fact)
            }
            BinaryOp::Eq => self.equality(&left, &right),
            BinaryOp::Ne => {
                let equal = self.equality(&left, &right);
                self.not_or_group(&equal)
            }
            _ => self.unconstrained(),
        };

        if self.is_tracking_provenance() {
            for and in &result.ands {
                self.record_provenance(and.id, expr);
                for sum in &and.sums {
                    self.record_provenance(sum.id, expr);
                }
            }
        }
        result
    }

    /// A variable or property factor. Properties take the slot registered
    /// for their dotted path, or slot 0.
    fn factor_of(&mut self, expr: &Expr) -> Result<Node> {
        match expr {
            Expr::Path { name, .. } => {
                let slot = self
                    .slot_of(name)
                    .ok_or_else(|| BoundsError::UnknownIdentifier { name: name.clone() })?;
                Ok(self.variable(name.clone(), slot))
            }
            Expr::Field { base, field, .. } => {
                let owner = self.factor_of(base)?;
                let slot = expr
                    .dotted_name()
                    .and_then(|path| self.slot_of(&path))
                    .unwrap_or(0);
                Ok(self.property(owner, field.clone(), slot))
            }
            other => Err(BoundsError::CannotNormalize {
                shape: other.shape(),
            }),
        }
    }
}

fn parse_integer(text: &str) -> Result<i64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits
        .parse::<i64>()
        .map_err(|_| BoundsError::MalformedLiteral {
            text: text.to_string(),
        })
}
