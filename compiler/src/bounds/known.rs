//! Incremental store of known linear facts
//!
//! Every fact `sum >= 0` is a column vector over the factor arrays seen so far
//! (row 0 is the constant). The store keeps a square transformation matrix
//! `T` and a list of columns. Writing `v` for a fact's vector, `w = T v`
//! expresses the fact in the current basis: row 0 of `w` is a constant and
//! row `i` the coefficient of column `i - 1`. A bound column stands for a
//! known fact, so a transformed vector with a non-negative constant and
//! non-negative coefficients on bound columns is implied.
//!
//! Inserting a fact either binds a fresh column and row-reduces `T` on it,
//! confirms the fact is already implied, marks a column as forced to zero,
//! rebinds a column to a tighter fact, or hands the combination over to the
//! [`ConvexNDVolume`] when no pivot exists.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::config::BoundsConfig;
use super::node::{NodeArray, SumGroup};
use super::volume::ConvexNDVolume;
use super::Result;
use crate::diagnostics::BoundsError;
use crate::zmath::{Matrix, Rational};

/// Answer of [`KnownConstraints::check_sum_group`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub is_true: bool,
}

#[derive(Debug, Clone, Default)]
struct Column {
    fact: Option<Rc<SumGroup>>,
    /// The bound fact is known to be exactly zero
    is_zero: bool,
}

#[derive(Debug, Clone)]
struct RowEntry {
    index: usize,
    factors: Rc<NodeArray>,
}

/// Known facts of one control-flow path
#[derive(Debug, Clone)]
pub struct KnownConstraints {
    columns: Vec<Column>,
    /// Factor array id to matrix row
    rows: FxHashMap<u32, RowEntry>,
    transform: Matrix,
    volume: ConvexNDVolume,
    /// The fact `1 >= 0`, axis of the constant row inside the volume
    unit: Rc<SumGroup>,
    config: BoundsConfig,
}

impl Default for KnownConstraints {
    fn default() -> Self {
        Self::new()
    }
}

impl KnownConstraints {
    pub fn new() -> Self {
        Self::with_config(&BoundsConfig::default())
    }

    pub fn with_config(config: &BoundsConfig) -> Self {
        Self {
            columns: Vec::new(),
            rows: FxHashMap::default(),
            transform: Matrix::identity(1),
            volume: ConvexNDVolume::with_capacity(config.polytope_capacity()),
            unit: Rc::new(SumGroup::new(Vec::new(), 1, 0)),
            config: config.clone(),
        }
    }

    /// Independent copy for exploring one branch. Term nodes are shared.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn config(&self) -> &BoundsConfig {
        &self.config
    }

    pub fn volume(&self) -> &ConvexNDVolume {
        &self.volume
    }

    /// Facts currently bound to a column.
    pub fn bound_facts(&self) -> impl Iterator<Item = &Rc<SumGroup>> + '_ {
        self.columns.iter().filter_map(|column| column.fact.as_ref())
    }

    /// Row for `factors`, allocating a fresh row and column on first sight.
    fn ensure_row(&mut self, factors: &Rc<NodeArray>) -> usize {
        if let Some(entry) = self.rows.get(&factors.id) {
            return entry.index;
        }
        let index = self.transform.rows();
        self.columns.push(Column::default());
        self.rows.insert(
            factors.id,
            RowEntry {
                index,
                factors: Rc::clone(factors),
            },
        );
        self.transform.resize(index + 1, index + 1);
        trace!(%factors, index, "new product row");
        index
    }

    fn build_vector(&self, offset: i64, entries: &[(usize, Rational)]) -> Matrix {
        let mut vector = Matrix::new(self.transform.cols(), 1);
        vector.set(0, 0, Rational::from_integer(offset));
        for &(index, coefficient) in entries {
            vector.set(index, 0, coefficient);
        }
        vector
    }

    /// Whether a transformed vector is implied by what is known.
    fn check_column_vector(&self, transformed: &Matrix) -> Result<bool> {
        let constant = transformed.get(0, 0);
        let mut violated = constant.is_negative();
        let mut pairs = Vec::new();

        for row in 1..transformed.rows() {
            let entry = transformed.get(row, 0);
            if entry.is_zero() {
                continue;
            }
            let column = &self.columns[row - 1];
            let Some(fact) = &column.fact else {
                return Ok(false);
            };
            if column.is_zero {
                continue;
            }
            if entry.is_negative() {
                violated = true;
                if !self.volume.tracks(fact) {
                    return Ok(false);
                }
            }
            pairs.push((Rc::clone(fact), entry));
        }

        if !violated {
            return Ok(true);
        }
        if constant.is_negative() && !self.volume.tracks(&self.unit) {
            return Ok(false);
        }
        if !constant.is_zero() {
            pairs.push((Rc::clone(&self.unit), constant));
        }
        self.volume.is_bounded(&pairs)
    }

    /// Whether `fact >= 0` follows from the known facts. A fact over a
    /// product never seen before is never implied.
    pub fn check_sum_group(&self, fact: &SumGroup) -> Result<CheckResult> {
        let mut entries = Vec::with_capacity(fact.products.len());
        for product in &fact.products {
            match self.rows.get(&product.factors.id) {
                Some(entry) => entries.push((entry.index, product.coefficient)),
                None => return Ok(CheckResult { is_true: false }),
            }
        }
        let vector = self.build_vector(fact.offset, &entries);
        let transformed = self.transform.multiply(&vector)?;
        let is_true = self.check_column_vector(&transformed)?;
        trace!(%fact, is_true, "checked fact");
        Ok(CheckResult { is_true })
    }

    /// Add `fact >= 0`.
    ///
    /// Returns `Ok(false)` when the fact contradicts what is already known;
    /// the store is left unchanged in that case. A product seen for the
    /// first time lands on an unbound column, so such a fact is never
    /// rejected and row allocation only happens on the accepting path.
    pub fn insert_sum_group(&mut self, fact: &Rc<SumGroup>) -> Result<bool> {
        let entries: Vec<(usize, Rational)> = fact
            .products
            .iter()
            .map(|product| (self.ensure_row(&product.factors), product.coefficient))
            .collect();
        let vector = self.build_vector(fact.offset, &entries);
        let transformed = self.transform.multiply(&vector)?;

        if self.config.contradiction_precheck {
            // !(fact >= 0) is -fact - 1 >= 0
            let mut negated = vector.clone();
            negated.scale(Rational::MINUS_ONE);
            negated.set(0, 0, (negated.get(0, 0) - Rational::ONE).simplify());
            let negated = self.transform.multiply(&negated)?;
            if self.check_column_vector(&negated)? {
                debug!(%fact, "fact contradicts the known facts");
                return Ok(false);
            }
        }

        let blank = (1..transformed.rows()).find(|&row| {
            self.columns[row - 1].fact.is_none() && !transformed.get(row, 0).is_zero()
        });
        if let Some(pivot) = blank {
            self.columns[pivot - 1] = Column {
                fact: Some(Rc::clone(fact)),
                is_zero: false,
            };
            self.pivot(pivot, &transformed);
            debug!(%fact, column = pivot - 1, "fact bound to a new column");
            return Ok(true);
        }

        let constant = transformed.get(0, 0);
        let mut negatives = Vec::new();
        let mut positives = Vec::new();
        for row in 1..transformed.rows() {
            let entry = transformed.get(row, 0);
            if entry.is_zero() || self.columns[row - 1].is_zero {
                continue;
            }
            if entry.is_negative() {
                negatives.push(row);
            } else {
                positives.push(row);
            }
        }

        if negatives.is_empty() && !constant.is_negative() {
            debug!(%fact, "fact already implied");
            return Ok(true);
        }
        if positives.is_empty() && constant.is_negative() {
            debug!(%fact, "fact is negative under the known facts");
            return Ok(false);
        }
        if let ([zero], []) = (negatives.as_slice(), positives.as_slice()) {
            if constant.is_zero() {
                self.columns[zero - 1].is_zero = true;
                debug!(%fact, column = zero - 1, "column forced to zero");
                return Ok(true);
            }
        }
        if let [positive] = positives.as_slice() {
            if !constant.is_positive() {
                let positive = *positive;
                self.columns[positive - 1] = Column {
                    fact: Some(Rc::clone(fact)),
                    is_zero: false,
                };
                self.pivot(positive, &transformed);
                debug!(%fact, column = positive - 1, "column rebound to a tighter fact");
                return Ok(true);
            }
        }

        self.extrude(fact, &transformed)
    }

    /// Make column `pivot` the basis direction of the fact whose transformed
    /// vector is `transformed`.
    fn pivot(&mut self, pivot: usize, transformed: &Matrix) {
        let pivot_value = transformed.get(pivot, 0);
        for row in 0..transformed.rows() {
            let entry = transformed.get(row, 0);
            if row == pivot || entry.is_zero() {
                continue;
            }
            let scalar = (entry / pivot_value).simplify().negate();
            self.transform.add_row_to_row(pivot, row, scalar);
        }
        self.transform
            .scale_row(pivot, pivot_value.invert().simplify());
        trace!(pivot, "row reduced");
    }

    fn extrude(&mut self, fact: &Rc<SumGroup>, transformed: &Matrix) -> Result<bool> {
        let mut pairs = Vec::new();
        for row in 1..transformed.rows() {
            let entry = transformed.get(row, 0);
            let column = &self.columns[row - 1];
            if entry.is_zero() || column.is_zero {
                continue;
            }
            if let Some(bound) = &column.fact {
                pairs.push((Rc::clone(bound), entry));
            }
        }
        let constant = transformed.get(0, 0);
        if !constant.is_zero() {
            pairs.push((Rc::clone(&self.unit), constant));
        }

        let mut volume = self.volume.clone();
        match volume.extrude(&pairs) {
            Ok(()) => {}
            Err(BoundsError::PolytopeCapacity { limit }) => {
                warn!(%fact, limit, "polytope is full, fact dropped");
                return Ok(true);
            }
            Err(err) => return Err(err),
        }

        // -1 >= 0 being derivable means the facts have no common solution.
        let never = [(Rc::clone(&self.unit), Rational::MINUS_ONE)];
        if volume.is_bounded(&never)? {
            debug!(%fact, "fact makes the known facts infeasible");
            return Ok(false);
        }

        debug!(%fact, dimensions = volume.dimensions(), "fact added to the polytope");
        self.volume = volume;
        Ok(true)
    }
}

impl fmt::Display for KnownConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Columns:")?;
        for column in &self.columns {
            match &column.fact {
                Some(fact) if column.is_zero => writeln!(f, "{fact} (zero)")?,
                Some(fact) => writeln!(f, "{fact}")?,
                None => writeln!(f, "nil")?,
            }
        }

        let mut rows: Vec<&RowEntry> = self.rows.values().collect();
        rows.sort_by_key(|entry| entry.index);
        writeln!(f)?;
        writeln!(f, "Column Vector Product Types:")?;
        for entry in rows {
            writeln!(f, "{}", entry.factors)?;
        }

        writeln!(f)?;
        writeln!(f, "Transform:")?;
        write!(f, "{}", self.transform)?;

        if self.volume.dimensions() > 0 {
            writeln!(f)?;
            write!(f, "{}", self.volume)?;
        }
        Ok(())
    }
}
