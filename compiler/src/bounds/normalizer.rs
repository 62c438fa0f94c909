//! Normalization session and the algebra on canonical forms
//!
//! A [`NormalizerState`] owns everything one checking session shares: the
//! node cache, the id counter, the identifier slot table and the optional
//! provenance map. All node construction goes through it, so every result is
//! interned and two equal values built anywhere in the session are the same
//! `Rc`.
//!
//! # Canonical forms
//!
//! - Products are merged by factor array and zero coefficients are dropped,
//!   so a SumGroup never holds two products over the same array.
//! - AndGroups and OrGroups are sorted and deduplicated.
//! - The empty OrGroup means "no constraint". `||` with it stays
//!   unconstrained, `&&` with it is the other operand, and its negation is the
//!   unsatisfiable group `-1 >= 0`.
//!
//! # Negation
//!
//! Over the integers `!(s >= 0)` is `-s - 1 >= 0`. De Morgan turns the
//! negation of a conjunction into a disjunction of negated facts, and the
//! negation of a disjunction into the conjunction of its negated clauses.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::cache::{CacheStats, NodeCache};
use super::config::BoundsConfig;
use super::node::{
    compare_rc, AndGroup, Node, NodeArray, OrGroup, ProductGroup, PropertyReference, SumGroup,
    VariableReference,
};
use crate::ast::Expr;
use crate::common::IdGenerator;
use crate::zmath::Rational;

/// Fact id to the expression that produced it
pub type ProvenanceMap = FxHashMap<u32, Expr>;

/// Per-session normalization context
#[derive(Debug)]
pub struct NormalizerState {
    cache: NodeCache,
    ids: IdGenerator,
    identifiers: FxHashMap<String, i64>,
    provenance: Option<ProvenanceMap>,
}

impl Default for NormalizerState {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizerState {
    pub fn new() -> Self {
        Self {
            cache: NodeCache::new(),
            ids: IdGenerator::new(),
            identifiers: FxHashMap::default(),
            provenance: None,
        }
    }

    pub fn with_config(config: &BoundsConfig) -> Self {
        let mut state = Self::new();
        if config.track_provenance {
            state.start_provenance();
        }
        state
    }

    /// Bind a free identifier (or a dotted property path) to a slot.
    pub fn use_identifier_mapping(&mut self, name: impl Into<String>, slot: i64) {
        self.identifiers.insert(name.into(), slot);
    }

    pub fn slot_of(&self, name: &str) -> Option<i64> {
        self.identifiers.get(name).copied()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn next_id(&mut self) -> u32 {
        self.ids.next_raw()
    }

    // ==================== PROVENANCE ====================

    /// Start recording which expression produced each fact. Restarting
    /// discards what was recorded so far.
    pub fn start_provenance(&mut self) {
        self.provenance = Some(ProvenanceMap::default());
    }

    /// Stop recording and hand back the collected map.
    pub fn stop_provenance(&mut self) -> ProvenanceMap {
        self.provenance.take().unwrap_or_default()
    }

    pub fn is_tracking_provenance(&self) -> bool {
        self.provenance.is_some()
    }

    pub fn provenance_of(&self, id: u32) -> Option<&Expr> {
        self.provenance.as_ref().and_then(|map| map.get(&id))
    }

    /// Keeps the first expression seen for an id; no-op when not tracking.
    pub(crate) fn record_provenance(&mut self, id: u32, expr: &Expr) {
        if let Some(map) = self.provenance.as_mut() {
            map.entry(id).or_insert_with(|| expr.clone());
        }
    }

    // ==================== CONSTRUCTORS ====================

    pub fn variable(&mut self, name: impl Into<String>, slot: i64) -> Node {
        Node::Variable(self.cache.internalize(VariableReference::new(name, slot)))
    }

    pub fn property(&mut self, owner: Node, name: impl Into<String>, slot: i64) -> Node {
        Node::Property(self.cache.internalize(PropertyReference::new(owner, name, slot)))
    }

    /// Sorts the factors; duplicates are kept (`a*a`).
    pub fn node_array(&mut self, mut factors: Vec<Node>) -> Rc<NodeArray> {
        factors.sort_by(|a, b| a.compare(b));
        let id = self.next_id();
        self.cache.internalize(NodeArray::new(factors, id))
    }

    /// `None` for a zero coefficient.
    pub fn product(
        &mut self,
        factors: Rc<NodeArray>,
        coefficient: Rational,
    ) -> Option<Rc<ProductGroup>> {
        let coefficient = coefficient.simplify();
        if coefficient.is_zero() {
            return None;
        }
        Some(self.cache.internalize(ProductGroup::new(factors, coefficient)))
    }

    /// Build a SumGroup from unordered `(factors, coefficient)` terms,
    /// merging equal factor arrays and dropping zero results.
    pub fn sum_group(&mut self, mut terms: Vec<(Rc<NodeArray>, Rational)>, offset: i64) -> Rc<SumGroup> {
        terms.sort_by(|a, b| compare_rc(&a.0, &b.0));

        let mut merged: Vec<(Rc<NodeArray>, Rational)> = Vec::with_capacity(terms.len());
        for (factors, coefficient) in terms {
            if let Some((last, acc)) = merged.last_mut() {
                if compare_rc(last, &factors).is_eq() {
                    *acc = (*acc + coefficient).simplify();
                    continue;
                }
            }
            merged.push((factors, coefficient));
        }

        let products = merged
            .into_iter()
            .filter_map(|(factors, coefficient)| self.product(factors, coefficient))
            .collect();
        let id = self.next_id();
        self.cache.internalize(SumGroup::new(products, offset, id))
    }

    pub fn constant(&mut self, offset: i64) -> Rc<SumGroup> {
        self.sum_group(Vec::new(), offset)
    }

    /// `1 * factor`
    pub fn factor_sum(&mut self, factor: Node) -> Rc<SumGroup> {
        let factors = self.node_array(vec![factor]);
        self.sum_group(vec![(factors, Rational::ONE)], 0)
    }

    pub fn and_group(&mut self, mut sums: Vec<Rc<SumGroup>>) -> Rc<AndGroup> {
        sums.sort_by(compare_rc);
        sums.dedup_by(|a, b| compare_rc(a, b).is_eq());
        let id = self.next_id();
        self.cache.internalize(AndGroup::new(sums, id))
    }

    pub fn or_group(&mut self, mut ands: Vec<Rc<AndGroup>>) -> Rc<OrGroup> {
        ands.sort_by(compare_rc);
        ands.dedup_by(|a, b| compare_rc(a, b).is_eq());
        let id = self.next_id();
        self.cache.internalize(OrGroup::new(ands, id))
    }

    /// The single fact `sum >= 0`.
    pub fn fact(&mut self, sum: Rc<SumGroup>) -> Rc<OrGroup> {
        let and = self.and_group(vec![sum]);
        self.or_group(vec![and])
    }

    /// The empty OrGroup.
    pub fn unconstrained(&mut self) -> Rc<OrGroup> {
        self.or_group(Vec::new())
    }

    /// `-1 >= 0`
    pub fn unsatisfiable(&mut self) -> Rc<OrGroup> {
        let never = self.constant(-1);
        self.fact(never)
    }

    // ==================== ARITHMETIC ====================

    /// Concatenate two factor arrays into one sorted array.
    pub fn multiply_arrays(&mut self, a: &NodeArray, b: &NodeArray) -> Rc<NodeArray> {
        let factors = a.factors.iter().chain(&b.factors).cloned().collect();
        self.node_array(factors)
    }

    /// `a + b + extra_offset`
    pub fn add_sums(&mut self, a: &SumGroup, b: &SumGroup, extra_offset: i64) -> Rc<SumGroup> {
        let terms = a
            .products
            .iter()
            .chain(&b.products)
            .map(|p| (Rc::clone(&p.factors), p.coefficient))
            .collect();
        self.sum_group(terms, a.offset + b.offset + extra_offset)
    }

    /// `a - b + extra_offset`
    pub fn subtract_sums(&mut self, a: &SumGroup, b: &SumGroup, extra_offset: i64) -> Rc<SumGroup> {
        let negated = self.negate_sum(b);
        self.add_sums(a, &negated, extra_offset)
    }

    pub fn negate_sum(&mut self, a: &SumGroup) -> Rc<SumGroup> {
        let terms = a
            .products
            .iter()
            .map(|p| (Rc::clone(&p.factors), p.coefficient.negate()))
            .collect();
        self.sum_group(terms, -a.offset)
    }

    /// Distribute `a * b`, including the cross terms with each constant.
    pub fn multiply_sums(&mut self, a: &SumGroup, b: &SumGroup) -> Rc<SumGroup> {
        let mut terms = Vec::with_capacity(
            a.products.len() * b.products.len() + a.products.len() + b.products.len(),
        );
        for pa in &a.products {
            for pb in &b.products {
                let factors = self.multiply_arrays(&pa.factors, &pb.factors);
                terms.push((factors, pa.coefficient * pb.coefficient));
            }
        }
        if b.offset != 0 {
            for pa in &a.products {
                terms.push((Rc::clone(&pa.factors), pa.coefficient.scale(b.offset)));
            }
        }
        if a.offset != 0 {
            for pb in &b.products {
                terms.push((Rc::clone(&pb.factors), pb.coefficient.scale(a.offset)));
            }
        }
        self.sum_group(terms, a.offset * b.offset)
    }

    /// `!(a >= 0)`, i.e. `-a - 1`.
    pub fn not_sum(&mut self, a: &SumGroup) -> Rc<SumGroup> {
        let negated = self.negate_sum(a);
        let minus_one = self.constant(-1);
        self.add_sums(&negated, &minus_one, 0)
    }

    // ==================== BOOLEAN ====================

    /// Union of two conjunctions.
    pub fn combine_and_groups(&mut self, a: &AndGroup, b: &AndGroup) -> Rc<AndGroup> {
        let sums = a.sums.iter().chain(&b.sums).cloned().collect();
        self.and_group(sums)
    }

    /// `a || b`
    pub fn combine_or_groups(&mut self, a: &Rc<OrGroup>, b: &Rc<OrGroup>) -> Rc<OrGroup> {
        if a.is_unconstrained() {
            return Rc::clone(a);
        }
        if b.is_unconstrained() {
            return Rc::clone(b);
        }
        let ands = a.ands.iter().chain(&b.ands).cloned().collect();
        self.or_group(ands)
    }

    /// `a && b`, distributing into disjunctive normal form.
    pub fn combine_or_groups_with_and(&mut self, a: &Rc<OrGroup>, b: &Rc<OrGroup>) -> Rc<OrGroup> {
        if a.is_unconstrained() {
            return Rc::clone(b);
        }
        if b.is_unconstrained() {
            return Rc::clone(a);
        }
        let mut ands = Vec::with_capacity(a.ands.len() * b.ands.len());
        for x in &a.ands {
            for y in &b.ands {
                ands.push(self.combine_and_groups(x, y));
            }
        }
        self.or_group(ands)
    }

    /// One singleton clause `-s - 1 >= 0` per fact of `a`.
    pub fn not_and_group(&mut self, a: &AndGroup) -> Rc<OrGroup> {
        if a.sums.is_empty() {
            return self.unsatisfiable();
        }
        let ands = a
            .sums
            .iter()
            .map(|sum| {
                let negated = self.not_sum(sum);
                self.and_group(vec![negated])
            })
            .collect();
        self.or_group(ands)
    }

    /// Conjunction of the negation of every clause.
    pub fn not_or_group(&mut self, a: &OrGroup) -> Rc<OrGroup> {
        let mut clauses = a.ands.iter();
        let Some(first) = clauses.next() else {
            return self.unsatisfiable();
        };
        let mut result = self.not_and_group(first);
        for clause in clauses {
            let negated = self.not_and_group(clause);
            result = self.combine_or_groups_with_and(&result, &negated);
        }
        result
    }

    /// `left == right` as the pair `left - right >= 0`, `right - left >= 0`.
    /// A difference that is identically zero is unconstrained.
    pub fn equality(&mut self, left: &SumGroup, right: &SumGroup) -> Rc<OrGroup> {
        let joined = self.subtract_sums(left, right, 0);
        if joined.is_zero() {
            return self.unconstrained();
        }
        let negated = self.negate_sum(&joined);
        let (first, second) = if compare_rc(&joined, &negated).is_le() {
            (joined, negated)
        } else {
            (negated, joined)
        };
        let and = self.and_group(vec![first, second]);
        self.or_group(vec![and])
    }
}
