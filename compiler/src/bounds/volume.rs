//! Convex cone of coefficient vectors known to be non-negative
//!
//! Every axis of the volume is a fact (a [`SumGroup`] known to be `>= 0`). A
//! point is a vector of coefficients over those axes, standing for the linear
//! combination of the facts. The volume keeps the conic hull of its spanning
//! vectors: one unit vector per axis plus every vector added by
//! [`ConvexNDVolume::extrude`]. Any point inside the hull is a non-negative
//! combination of known facts and therefore itself non-negative.
//!
//! The hull is stored by its faces. Each face has an inward normal (every
//! spanning vector has a non-negative dot product with it), the set of
//! spanning vectors lying on it, and edges to the faces it shares at least
//! `dimensions - 2` spanning vectors with. A point is inside iff it is on the
//! non-negative side of every face. A volume without faces is the whole space.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::node::{compare_rc, SumGroup};
use super::Result;
use crate::datastructures::bitset::{BitSet32, CAPACITY};
use crate::diagnostics::BoundsError;
use crate::zmath::{Matrix, Rational};

/// Link between two faces sharing the spanning vectors in `basis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsEdge {
    pub basis: BitSet32,
    pub from: usize,
    pub to: usize,
}

/// One bounding half-space `normal . x >= 0`.
#[derive(Debug, Clone)]
pub struct BoundsFace {
    pub normal: Matrix,
    /// Spanning vectors orthogonal to `normal`
    pub basis: BitSet32,
    pub edges: Vec<BoundsEdge>,
}

#[derive(Debug, Clone)]
pub struct ConvexNDVolume {
    axes: Vec<Rc<SumGroup>>,
    vectors: Vec<Matrix>,
    faces: Vec<BoundsFace>,
    capacity: usize,
}

impl Default for ConvexNDVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvexNDVolume {
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    /// A volume holding at most `capacity` spanning vectors (clamped to 32).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            axes: Vec::new(),
            vectors: Vec::new(),
            faces: Vec::new(),
            capacity: capacity.min(CAPACITY),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Rc<SumGroup>] {
        &self.axes
    }

    pub fn vectors(&self) -> &[Matrix] {
        &self.vectors
    }

    pub fn faces(&self) -> &[BoundsFace] {
        &self.faces
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tracks(&self, sum: &Rc<SumGroup>) -> bool {
        self.axis_of(sum).is_some()
    }

    fn axis_of(&self, sum: &Rc<SumGroup>) -> Option<usize> {
        self.axes
            .iter()
            .position(|axis| compare_rc(axis, sum).is_eq())
    }

    /// Add an axis for `sum`.
    ///
    /// Existing vectors and normals get a zero coordinate on the new axis, so
    /// every existing face now also contains the new unit vector. The new face
    /// `x_new >= 0` contains every vector but the new unit vector.
    pub fn extend_dimension(&mut self, sum: Rc<SumGroup>) -> Result<usize> {
        if self.vectors.len() >= self.capacity {
            return Err(BoundsError::PolytopeCapacity {
                limit: self.capacity,
            });
        }

        let axis = self.dimensions();
        let dimensions = axis + 1;
        for vector in &mut self.vectors {
            vector.resize(dimensions, 1);
            vector.set(axis, 0, Rational::ZERO);
        }
        for face in &mut self.faces {
            face.normal.resize(dimensions, 1);
            face.normal.set(axis, 0, Rational::ZERO);
        }

        let mut unit = Matrix::new(dimensions, 1);
        unit.set(axis, 0, Rational::ONE);
        self.vectors.push(unit.clone());
        let index = self.vectors.len() - 1;
        for face in &mut self.faces {
            face.basis.insert(index);
        }

        let basis = (0..index).collect();
        self.faces.push(BoundsFace {
            normal: unit,
            basis,
            edges: Vec::new(),
        });
        self.axes.push(sum);
        self.rebuild_edges();

        trace!(axis, dimensions, "volume gained an axis");
        Ok(axis)
    }

    /// Coefficient vector for `pairs`, or `None` when a fact the volume does
    /// not know about has a negative coefficient. Unknown facts with a
    /// positive coefficient only add a non-negative amount and are dropped.
    fn extract_vector(&self, pairs: &[(Rc<SumGroup>, Rational)]) -> Option<Matrix> {
        let mut point = Matrix::new(self.dimensions(), 1);
        for (sum, coefficient) in pairs {
            match self.axis_of(sum) {
                Some(axis) => {
                    let value = (point.get(axis, 0) + *coefficient).simplify();
                    point.set(axis, 0, value);
                }
                None if coefficient.is_negative() => return None,
                None => {}
            }
        }
        Some(point)
    }

    /// Whether the combination `sum(coefficient * fact)` is known to be
    /// non-negative.
    pub fn is_bounded(&self, pairs: &[(Rc<SumGroup>, Rational)]) -> Result<bool> {
        let Some(point) = self.extract_vector(pairs) else {
            return Ok(false);
        };
        for face in &self.faces {
            if face.normal.dot(&point)?.is_negative() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Record that the combination `sum(coefficient * fact)` is non-negative.
    ///
    /// Facts not yet tracked become new axes. The combination joins the
    /// spanning vectors; faces that cut it off are replaced by faces through
    /// the new vector and the ridges on the horizon.
    pub fn extrude(&mut self, pairs: &[(Rc<SumGroup>, Rational)]) -> Result<()> {
        if self.is_bounded(pairs)? {
            trace!("extrusion already inside the volume");
            return Ok(());
        }

        let mut fresh: Vec<&Rc<SumGroup>> = Vec::new();
        for (sum, coefficient) in pairs {
            if !coefficient.is_zero()
                && !self.tracks(sum)
                && !fresh.iter().any(|seen| compare_rc(seen, sum).is_eq())
            {
                fresh.push(sum);
            }
        }
        if self.vectors.len() + fresh.len() + 1 > self.capacity {
            return Err(BoundsError::PolytopeCapacity {
                limit: self.capacity,
            });
        }
        for sum in fresh {
            self.extend_dimension(Rc::clone(sum))?;
        }

        let Some(vector) = self.extract_vector(pairs) else {
            return Ok(());
        };
        let dots = self
            .faces
            .iter()
            .map(|face| face.normal.dot(&vector))
            .collect::<Result<Vec<_>>>()?;
        if !dots.iter().any(Rational::is_negative) {
            return Ok(());
        }

        self.vectors.push(vector);
        let new_index = self.vectors.len() - 1;
        let visible: Vec<bool> = dots.iter().map(Rational::is_negative).collect();

        let old_faces = std::mem::take(&mut self.faces);
        let mut faces: Vec<BoundsFace> = Vec::with_capacity(old_faces.len() + 1);
        for (face, dot) in old_faces.iter().zip(&dots) {
            if dot.is_negative() {
                continue;
            }
            let mut kept = face.clone();
            if dot.is_zero() {
                kept.basis.insert(new_index);
            }
            faces.push(kept);
        }

        let dimensions = self.dimensions();
        if dimensions >= 2 {
            for (index, face) in old_faces.iter().enumerate() {
                if !visible[index] {
                    continue;
                }
                for edge in face.edges.iter().filter(|edge| !visible[edge.to]) {
                    for mut seed in edge.basis.subsets(dimensions - 2) {
                        seed.insert(new_index);
                        if faces
                            .iter()
                            .any(|face| seed.intersection(&face.basis) == seed)
                        {
                            continue;
                        }
                        if let Some(candidate) = self.face_from_bitset(&seed)? {
                            if !faces.iter().any(|face| face.basis == candidate.basis) {
                                faces.push(candidate);
                            }
                        }
                    }
                }
            }
        }

        trace!(
            removed = visible.iter().filter(|v| **v).count(),
            faces = faces.len(),
            "volume extruded"
        );
        self.faces = faces;
        self.rebuild_edges();
        Ok(())
    }

    /// The face through the spanning vectors in `seed`.
    ///
    /// The normal is the generalized cross product of those vectors, turned so
    /// every spanning vector lies on its non-negative side (ties broken by a
    /// non-negative component sum). Returns `None` when the vectors are
    /// linearly dependent or when spanning vectors lie on both sides, in which
    /// case the hyperplane does not bound the volume.
    pub fn face_from_bitset(&self, seed: &BitSet32) -> Result<Option<BoundsFace>> {
        let members: Vec<Matrix> = seed.iter().map(|i| self.vectors[i].clone()).collect();
        let mut normal = Matrix::orthogonal_vector(&members, self.dimensions())?;
        if normal.is_zero() {
            return Ok(None);
        }

        let dots = self
            .vectors
            .iter()
            .map(|vector| normal.dot(vector))
            .collect::<Result<Vec<_>>>()?;
        let positive = dots.iter().any(Rational::is_positive);
        let negative = dots.iter().any(Rational::is_negative);
        if positive && negative {
            return Ok(None);
        }
        if negative || (!positive && normal.sum().is_negative()) {
            normal.scale(Rational::MINUS_ONE);
        }

        let basis = dots
            .iter()
            .enumerate()
            .filter(|(_, dot)| dot.is_zero())
            .map(|(index, _)| index)
            .collect();
        Ok(Some(BoundsFace {
            normal,
            basis,
            edges: Vec::new(),
        }))
    }

    fn rebuild_edges(&mut self) {
        let min_shared = self.dimensions().saturating_sub(2);
        let bases: Vec<BitSet32> = self.faces.iter().map(|face| face.basis.clone()).collect();
        for (from, face) in self.faces.iter_mut().enumerate() {
            face.edges.clear();
            for (to, other) in bases.iter().enumerate() {
                if from == to {
                    continue;
                }
                let shared = face.basis.intersection(other);
                if shared.len() >= min_shared {
                    face.edges.push(BoundsEdge {
                        basis: shared,
                        from,
                        to,
                    });
                }
            }
        }
    }
}

fn write_vector(f: &mut fmt::Formatter<'_>, vector: &Matrix) -> fmt::Result {
    f.write_str("[")?;
    for row in 0..vector.rows() {
        if row > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", vector.get(row, 0))?;
    }
    f.write_str("]")
}

impl fmt::Display for ConvexNDVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ConvexNDVolume: {} dimensions, {} vectors",
            self.dimensions(),
            self.vectors.len()
        )?;
        writeln!(f, "Axes:")?;
        for (index, axis) in self.axes.iter().enumerate() {
            writeln!(f, "  {index}: {axis}")?;
        }
        writeln!(f, "Vectors:")?;
        for (index, vector) in self.vectors.iter().enumerate() {
            write!(f, "  {index}: ")?;
            write_vector(f, vector)?;
            writeln!(f)?;
        }
        writeln!(f, "Faces:")?;
        for (index, face) in self.faces.iter().enumerate() {
            write!(f, "  {index}: normal ")?;
            write_vector(f, &face.normal)?;
            writeln!(f, " basis {}", face.basis)?;
            for edge in &face.edges {
                writeln!(f, "    edge {} -> {}", edge.basis, edge.to)?;
            }
        }
        Ok(())
    }
}
