//! Canonical term nodes
//!
//! Linear-arithmetic terms in normal form:
//!
//! ```text
//! OrGroup   := AndGroup || AndGroup || ...      (sorted, deduplicated)
//! AndGroup  := SumGroup && SumGroup && ...      (each means "sum >= 0")
//! SumGroup  := ProductGroup + ... + offset      (sorted by factor array)
//! ProductGroup := coefficient * NodeArray
//! NodeArray := factor * factor * ...            (sorted)
//! factor    := VariableReference | PropertyReference
//! ```
//!
//! Nodes are immutable and shared through [`Rc`]. Every node computes its
//! structural hash once at construction; together with [`Term::compare`] this
//! is what the [`NodeCache`](super::cache::NodeCache) uses to hand out one
//! shared instance per distinct value. The `id` fields are provenance and
//! diagnostic labels only and never take part in hashing or ordering.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHasher;
use std::hash::Hasher;

use crate::zmath::Rational;

/// Stable discriminant used to order nodes of different kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Variable = 0,
    Property = 1,
    Product = 2,
    Array = 3,
    Sum = 4,
    And = 5,
    Or = 6,
}

/// Fold `value` into a running structural hash.
pub fn join_hash(acc: u64, value: u64) -> u64 {
    (17u64 * 13)
        .wrapping_add(acc)
        .wrapping_mul(13)
        .wrapping_add(value)
}

fn hash_str(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

/// Behaviour shared by every node type.
pub trait Term: fmt::Display + Sized {
    const KIND: NodeKind;

    /// Structural hash, computed at construction.
    fn hash_code(&self) -> u64;

    /// Total order over values of this node type.
    fn compare(&self, other: &Self) -> Ordering;

    fn into_node(this: Rc<Self>) -> Node;

    fn from_node(node: &Node) -> Option<&Rc<Self>>;
}

/// Order two shared nodes, short-circuiting on identity.
pub fn compare_rc<T: Term>(a: &Rc<T>, b: &Rc<T>) -> Ordering {
    if Rc::ptr_eq(a, b) {
        Ordering::Equal
    } else {
        a.compare(b)
    }
}

fn compare_seq<T: Term>(a: &[Rc<T>], b: &[Rc<T>]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| compare_rc(x, y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ==================== NODE ====================

/// Any canonical node.
#[derive(Debug, Clone)]
pub enum Node {
    Variable(Rc<VariableReference>),
    Property(Rc<PropertyReference>),
    Product(Rc<ProductGroup>),
    Array(Rc<NodeArray>),
    Sum(Rc<SumGroup>),
    And(Rc<AndGroup>),
    Or(Rc<OrGroup>),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Variable(_) => NodeKind::Variable,
            Node::Property(_) => NodeKind::Property,
            Node::Product(_) => NodeKind::Product,
            Node::Array(_) => NodeKind::Array,
            Node::Sum(_) => NodeKind::Sum,
            Node::And(_) => NodeKind::And,
            Node::Or(_) => NodeKind::Or,
        }
    }

    pub fn hash_code(&self) -> u64 {
        match self {
            Node::Variable(n) => n.hash_code(),
            Node::Property(n) => n.hash_code(),
            Node::Product(n) => n.hash_code(),
            Node::Array(n) => n.hash_code(),
            Node::Sum(n) => n.hash_code(),
            Node::And(n) => n.hash_code(),
            Node::Or(n) => n.hash_code(),
        }
    }

    /// Kind first, then the per-kind order.
    pub fn compare(&self, other: &Node) -> Ordering {
        match (self, other) {
            (Node::Variable(a), Node::Variable(b)) => compare_rc(a, b),
            (Node::Property(a), Node::Property(b)) => compare_rc(a, b),
            (Node::Product(a), Node::Product(b)) => compare_rc(a, b),
            (Node::Array(a), Node::Array(b)) => compare_rc(a, b),
            (Node::Sum(a), Node::Sum(b)) => compare_rc(a, b),
            (Node::And(a), Node::And(b)) => compare_rc(a, b),
            (Node::Or(a), Node::Or(b)) => compare_rc(a, b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.compare(other).is_eq()
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Variable(n) => write!(f, "{n}"),
            Node::Property(n) => write!(f, "{n}"),
            Node::Product(n) => write!(f, "{n}"),
            Node::Array(n) => write!(f, "{n}"),
            Node::Sum(n) => write!(f, "{n}"),
            Node::And(n) => write!(f, "{n}"),
            Node::Or(n) => write!(f, "{n}"),
        }
    }
}

// ==================== FACTORS ====================

/// A free identifier bound to a slot.
#[derive(Debug)]
pub struct VariableReference {
    pub name: String,
    pub slot: i64,
    hash: u64,
}

impl VariableReference {
    pub fn new(name: impl Into<String>, slot: i64) -> Self {
        Self {
            name: name.into(),
            slot,
            hash: slot as u64,
        }
    }
}

impl Term for VariableReference {
    const KIND: NodeKind = NodeKind::Variable;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.slot.cmp(&other.slot)
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Variable(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Variable(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `owner.name`, where the owner is itself a factor.
#[derive(Debug)]
pub struct PropertyReference {
    pub owner: Node,
    pub name: String,
    pub slot: i64,
    hash: u64,
}

impl PropertyReference {
    pub fn new(owner: Node, name: impl Into<String>, slot: i64) -> Self {
        let name = name.into();
        let hash = join_hash(
            join_hash(slot as u64, hash_str(&name)),
            owner.hash_code(),
        );
        Self {
            owner,
            name,
            slot,
            hash,
        }
    }
}

impl Term for PropertyReference {
    const KIND: NodeKind = NodeKind::Property;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.slot
            .cmp(&other.slot)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.owner.compare(&other.owner))
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Property(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Property(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

// ==================== PRODUCTS ====================

/// Sorted factors of one product term. The empty array is the unit product.
#[derive(Debug)]
pub struct NodeArray {
    pub factors: Vec<Node>,
    pub id: u32,
    hash: u64,
}

impl NodeArray {
    /// `factors` must already be sorted by [`Node::compare`].
    pub fn new(factors: Vec<Node>, id: u32) -> Self {
        let hash = factors
            .iter()
            .fold(0, |acc, factor| join_hash(acc, factor.hash_code()));
        Self { factors, id, hash }
    }
}

impl Term for NodeArray {
    const KIND: NodeKind = NodeKind::Array;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.factors.len().cmp(&other.factors.len()).then_with(|| {
            self.factors
                .iter()
                .zip(&other.factors)
                .map(|(a, b)| a.compare(b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Array(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Array(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for NodeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return f.write_str("1");
        }
        write_joined(f, &self.factors, "*")
    }
}

/// `coefficient * factors`. The coefficient is kept simplified and nonzero.
#[derive(Debug)]
pub struct ProductGroup {
    pub factors: Rc<NodeArray>,
    pub coefficient: Rational,
    hash: u64,
}

impl ProductGroup {
    pub fn new(factors: Rc<NodeArray>, coefficient: Rational) -> Self {
        let coefficient = coefficient.simplify();
        let hash = join_hash(
            join_hash(coefficient.numerator as u64, coefficient.denominator as u64),
            factors.hash_code(),
        );
        Self {
            factors,
            coefficient,
            hash,
        }
    }
}

impl Term for ProductGroup {
    const KIND: NodeKind = NodeKind::Product;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        compare_rc(&self.factors, &other.factors)
            .then_with(|| self.coefficient.compare(&other.coefficient))
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Product(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Product(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for ProductGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient.is_one() {
            write!(f, "{}", self.factors)
        } else {
            write!(f, "{}*{}", self.coefficient, self.factors)
        }
    }
}

// ==================== SUMS ====================

/// `products + offset`; in constraint position it asserts `>= 0`.
#[derive(Debug)]
pub struct SumGroup {
    pub products: Vec<Rc<ProductGroup>>,
    pub offset: i64,
    pub id: u32,
    hash: u64,
}

impl SumGroup {
    /// `products` must be sorted by factor array, with distinct arrays and
    /// nonzero coefficients.
    pub fn new(products: Vec<Rc<ProductGroup>>, offset: i64, id: u32) -> Self {
        let hash = products
            .iter()
            .fold(offset as u64, |acc, product| join_hash(acc, product.hash_code()));
        Self {
            products,
            offset,
            id,
            hash,
        }
    }

    /// No products and a zero offset.
    pub fn is_zero(&self) -> bool {
        self.products.is_empty() && self.offset == 0
    }
}

impl Term for SumGroup {
    const KIND: NodeKind = NodeKind::Sum;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.products
            .len()
            .cmp(&other.products.len())
            .then_with(|| self.offset.cmp(&other.offset))
            .then_with(|| compare_seq(&self.products, &other.products))
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Sum(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Sum(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for SumGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.products, " + ")?;
        if self.offset != 0 || self.products.is_empty() {
            if !self.products.is_empty() {
                f.write_str(" + ")?;
            }
            write!(f, "{}", self.offset)?;
        }
        Ok(())
    }
}

// ==================== BOOLEAN GROUPS ====================

/// Conjunction of `sum >= 0` facts. Empty means no constraint.
#[derive(Debug)]
pub struct AndGroup {
    pub sums: Vec<Rc<SumGroup>>,
    pub id: u32,
    hash: u64,
}

impl AndGroup {
    /// `sums` must be sorted and free of duplicates.
    pub fn new(sums: Vec<Rc<SumGroup>>, id: u32) -> Self {
        let hash = sums
            .iter()
            .fold(0, |acc, sum| join_hash(acc, sum.hash_code()));
        Self { sums, id, hash }
    }
}

impl Term for AndGroup {
    const KIND: NodeKind = NodeKind::And;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        compare_seq(&self.sums, &other.sums)
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::And(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::And(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for AndGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sums.is_empty() {
            return f.write_str("true");
        }
        write_joined(f, &self.sums, " && ")
    }
}

/// Disjunction of conjunctions. Empty means no constraint.
#[derive(Debug)]
pub struct OrGroup {
    pub ands: Vec<Rc<AndGroup>>,
    pub id: u32,
    hash: u64,
}

impl OrGroup {
    /// `ands` must be sorted and free of duplicates.
    pub fn new(ands: Vec<Rc<AndGroup>>, id: u32) -> Self {
        let hash = ands
            .iter()
            .fold(0, |acc, and| join_hash(acc, and.hash_code()));
        Self { ands, id, hash }
    }

    /// The "no constraint" group.
    pub fn is_unconstrained(&self) -> bool {
        self.ands.is_empty()
    }
}

impl Term for OrGroup {
    const KIND: NodeKind = NodeKind::Or;

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn compare(&self, other: &Self) -> Ordering {
        compare_seq(&self.ands, &other.ands)
    }

    fn into_node(this: Rc<Self>) -> Node {
        Node::Or(this)
    }

    fn from_node(node: &Node) -> Option<&Rc<Self>> {
        match node {
            Node::Or(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for OrGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ands.is_empty() {
            return f.write_str("true");
        }
        write_joined(f, &self.ands, " || ")
    }
}
