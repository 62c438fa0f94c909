//! Dense, resizable matrices of [`Rational`] entries
//!
//! Storage is row-major with a power-of-two row and column capacity so the
//! constraint store can grow the transformation matrix one row/column pair at
//! a time without reallocating on every step. Growing seeds the new cells as
//! an identity extension: a new diagonal cell is 1, every other new cell 0.
//!
//! Column vectors are plain `n x 1` matrices.

use std::fmt;

use super::rational::Rational;
use crate::diagnostics::BoundsError;

/// Smallest power of two that is `>= value` (0 stays 0).
pub fn pow_of_two(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        value.next_power_of_two()
    }
}

#[derive(Debug, Clone)]
pub struct Matrix {
    data: Vec<Rational>,
    rows: usize,
    cols: usize,
    row_capacity: usize,
    col_capacity: usize,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        let row_capacity = pow_of_two(rows);
        let col_capacity = pow_of_two(cols);
        Self {
            data: vec![Rational::ZERO; row_capacity * col_capacity],
            rows,
            cols,
            row_capacity,
            col_capacity,
        }
    }

    /// A `size x size` identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::new(size, size);
        matrix.initialize_identity();
        matrix
    }

    /// Build from row-major entries. Returns a shape error if `data` does not
    /// hold exactly `rows * cols` values.
    pub fn with_data(rows: usize, cols: usize, data: &[Rational]) -> Result<Self, BoundsError> {
        if data.len() != rows * cols {
            return Err(BoundsError::MatrixShape {
                lhs_rows: rows,
                lhs_cols: cols,
                rhs_rows: data.len(),
                rhs_cols: 1,
            });
        }
        let mut matrix = Self::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                matrix.set(row, col, data[row * cols + col]);
            }
        }
        Ok(matrix)
    }

    /// Build from row-major integer entries.
    pub fn from_integers(rows: usize, cols: usize, data: &[i64]) -> Result<Self, BoundsError> {
        let values: Vec<Rational> = data.iter().map(|&v| Rational::from_integer(v)).collect();
        Self::with_data(rows, cols, &values)
    }

    /// A column vector holding `values`.
    pub fn column(values: &[Rational]) -> Self {
        let mut matrix = Self::new(values.len(), 1);
        for (row, value) in values.iter().enumerate() {
            matrix.set(row, 0, *value);
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.col_capacity + col
    }

    pub fn get(&self, row: usize, col: usize) -> Rational {
        self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Rational) {
        let index = self.index(row, col);
        self.data[index] = value;
    }

    /// Overwrite the visible area with the identity.
    pub fn initialize_identity(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let value = if row == col {
                    Rational::ONE
                } else {
                    Rational::ZERO
                };
                self.set(row, col, value);
            }
        }
    }

    /// Change the visible shape.
    ///
    /// Shrinking keeps the retained cells. Growing keeps the cells that were
    /// visible and seeds every newly exposed cell as an identity extension.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows > self.row_capacity || cols > self.col_capacity {
            let row_capacity = pow_of_two(rows).max(self.row_capacity);
            let col_capacity = pow_of_two(cols).max(self.col_capacity);
            let mut data = vec![Rational::ZERO; row_capacity * col_capacity];
            for row in 0..self.rows.min(rows) {
                for col in 0..self.cols.min(cols) {
                    data[row * col_capacity + col] = self.get(row, col);
                }
            }
            self.data = data;
            self.row_capacity = row_capacity;
            self.col_capacity = col_capacity;
        }

        let (old_rows, old_cols) = (self.rows, self.cols);
        self.rows = rows;
        self.cols = cols;
        for row in 0..rows {
            for col in 0..cols {
                if row >= old_rows || col >= old_cols {
                    let value = if row == col {
                        Rational::ONE
                    } else {
                        Rational::ZERO
                    };
                    self.set(row, col, value);
                }
            }
        }
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix, BoundsError> {
        if self.cols != other.rows {
            return Err(BoundsError::MatrixShape {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other.rows,
                rhs_cols: other.cols,
            });
        }
        let mut result = Matrix::new(self.rows, other.cols);
        for row in 0..self.rows {
            for col in 0..other.cols {
                let mut acc = Rational::ZERO;
                for k in 0..self.cols {
                    acc = (acc + self.get(row, k) * other.get(k, col)).simplify();
                }
                result.set(row, col, acc);
            }
        }
        Ok(result)
    }

    pub fn scale(&mut self, scalar: Rational) {
        for row in 0..self.rows {
            self.scale_row(row, scalar);
        }
    }

    /// Row `row` as a `1 x cols` matrix.
    pub fn row(&self, row: usize) -> Matrix {
        let mut result = Matrix::new(1, self.cols);
        for col in 0..self.cols {
            result.set(0, col, self.get(row, col));
        }
        result
    }

    pub fn scale_row(&mut self, row: usize, scalar: Rational) {
        for col in 0..self.cols {
            let value = (self.get(row, col) * scalar).simplify();
            self.set(row, col, value);
        }
    }

    /// `to += from * scalar`
    pub fn add_row_to_row(&mut self, from: usize, to: usize, scalar: Rational) {
        for col in 0..self.cols {
            let value = (self.get(to, col) + self.get(from, col) * scalar).simplify();
            self.set(to, col, value);
        }
    }

    /// Entry-wise product summed over two matrices of the same shape.
    pub fn dot(&self, other: &Matrix) -> Result<Rational, BoundsError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(BoundsError::MatrixShape {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other.rows,
                rhs_cols: other.cols,
            });
        }
        let mut acc = Rational::ZERO;
        for row in 0..self.rows {
            for col in 0..self.cols {
                acc = (acc + self.get(row, col) * other.get(row, col)).simplify();
            }
        }
        Ok(acc)
    }

    /// Sum of all visible entries.
    pub fn sum(&self) -> Rational {
        let mut acc = Rational::ZERO;
        for row in 0..self.rows {
            for col in 0..self.cols {
                acc = (acc + self.get(row, col)).simplify();
            }
        }
        acc
    }

    /// True when every visible entry is zero.
    pub fn is_zero(&self) -> bool {
        (0..self.rows).all(|row| (0..self.cols).all(|col| self.get(row, col).is_zero()))
    }

    /// Determinant by cofactor expansion along the first row.
    pub fn determinant(&self) -> Result<Rational, BoundsError> {
        if self.rows != self.cols {
            return Err(BoundsError::MatrixShape {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: self.cols,
                rhs_cols: self.rows,
            });
        }
        let rows: Vec<Vec<Rational>> = (0..self.rows)
            .map(|row| (0..self.cols).map(|col| self.get(row, col)).collect())
            .collect();
        Ok(cofactor_determinant(&rows))
    }

    /// Generalized cross product of `vectors` in `dimensions`-space.
    ///
    /// Uses the first `dimensions - 1` column vectors. Component `i` is
    /// `(-1)^i` times the determinant of the matrix built from those vectors
    /// with row `i` removed, so the result is orthogonal to every input.
    pub fn orthogonal_vector(vectors: &[Matrix], dimensions: usize) -> Result<Matrix, BoundsError> {
        let needed = dimensions.saturating_sub(1);
        if vectors.len() < needed {
            return Err(BoundsError::NotEnoughBasisVectors {
                needed,
                supplied: vectors.len(),
            });
        }
        let vectors = &vectors[..needed];
        if let Some(short) = vectors.iter().find(|v| v.rows < dimensions) {
            return Err(BoundsError::MatrixShape {
                lhs_rows: dimensions,
                lhs_cols: needed,
                rhs_rows: short.rows,
                rhs_cols: short.cols,
            });
        }

        let mut result = Matrix::new(dimensions, 1);
        for skipped in 0..dimensions {
            let minor: Vec<Vec<Rational>> = (0..dimensions)
                .filter(|&row| row != skipped)
                .map(|row| vectors.iter().map(|v| v.get(row, 0)).collect())
                .collect();
            let mut value = cofactor_determinant(&minor);
            if skipped % 2 == 1 {
                value = value.negate();
            }
            result.set(skipped, 0, value.simplify());
        }
        Ok(result)
    }
}

impl PartialEq for Matrix {
    /// Shapes must match and every visible entry must be equal by value.
    fn eq(&self, other: &Matrix) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && (0..self.rows).all(|row| {
                (0..self.cols).all(|col| {
                    self.get(row, col).compare(&other.get(row, col)).is_eq()
                })
            })
    }
}

impl Eq for Matrix {}

fn cofactor_determinant(rows: &[Vec<Rational>]) -> Rational {
    match rows.len() {
        0 => Rational::ONE,
        1 => rows[0][0],
        2 => (rows[0][0] * rows[1][1] - rows[0][1] * rows[1][0]).simplify(),
        size => {
            let mut acc = Rational::ZERO;
            for col in 0..size {
                let pivot = rows[0][col];
                if pivot.is_zero() {
                    continue;
                }
                let minor: Vec<Vec<Rational>> = rows[1..]
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|&(c, _)| c != col)
                            .map(|(_, v)| *v)
                            .collect()
                    })
                    .collect();
                let term = (pivot * cofactor_determinant(&minor)).simplify();
                acc = if col % 2 == 0 { acc + term } else { acc - term }.simplify();
            }
            acc
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            write!(f, "[")?;
            for col in 0..self.cols {
                if col > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(row, col))?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(rows: usize, cols: usize, data: &[i64]) -> Matrix {
        Matrix::from_integers(rows, cols, data).unwrap()
    }

    fn column(values: &[i64]) -> Matrix {
        ints(values.len(), 1, values)
    }

    #[test]
    fn test_pow_of_two() {
        assert_eq!(pow_of_two(0), 0);
        assert_eq!(pow_of_two(1), 1);
        assert_eq!(pow_of_two(2), 2);
        assert_eq!(pow_of_two(3), 4);
        assert_eq!(pow_of_two(9), 16);
    }

    #[test]
    fn test_resize_extends_identity() {
        let mut m = Matrix::new(3, 3);
        m.resize(4, 4);
        let expected = ints(
            4,
            4,
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
        );
        assert_eq!(m.to_string(), expected.to_string());
    }

    #[test]
    fn test_shrink_then_grow() {
        let mut m = ints(2, 2, &[-1, 2, 3, 4]);
        m.resize(2, 1);
        assert_eq!(m.cols(), 1);
        m.resize(4, 4);
        let expected = ints(
            4,
            4,
            &[-1, 0, 0, 0, 3, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1],
        );
        assert_eq!(m.to_string(), expected.to_string());
    }

    #[test]
    fn test_multiply() {
        let a = ints(2, 3, &[1, 2, 3, 4, 5, 6]);
        let b = ints(3, 1, &[1, 0, -1]);
        let product = a.multiply(&b).unwrap();
        assert_eq!(product.to_string(), column(&[-2, -2]).to_string());
    }

    #[test]
    fn test_multiply_shape_error() {
        let a = Matrix::identity(2);
        let b = Matrix::identity(3);
        assert!(matches!(
            a.multiply(&b),
            Err(BoundsError::MatrixShape { lhs_cols: 2, rhs_rows: 3, .. })
        ));
    }

    #[test]
    fn test_row_addition() {
        let mut m = Matrix::identity(3);
        m.add_row_to_row(0, 1, Rational::from_integer(-1));
        m.add_row_to_row(0, 2, Rational::from_integer(2));
        m.scale_row(0, Rational::from_integer(-2));
        assert_eq!(
            m.to_string(),
            ints(3, 3, &[-2, 0, 0, -1, 1, 0, 2, 0, 1]).to_string()
        );

        m.add_row_to_row(1, 0, Rational::from_integer(-1));
        m.scale_row(1, Rational::from_integer(-1));
        assert_eq!(
            m.to_string(),
            ints(3, 3, &[-1, -1, 0, 1, -1, 0, 2, 0, 1]).to_string()
        );
    }

    #[test]
    fn test_row_and_scale() {
        let mut m = ints(2, 2, &[1, 2, 3, 4]);
        assert_eq!(m.row(1).to_string(), "[3, 4]\n");
        m.scale(Rational::new(1, 2));
        assert_eq!(m.get(0, 0), Rational::new(1, 2));
        assert_eq!(m.get(1, 1), Rational::from_integer(2));
    }

    #[test]
    fn test_dot_and_sum() {
        let a = column(&[1, 2, 3]);
        let b = column(&[4, -5, 6]);
        assert_eq!(a.dot(&b).unwrap(), Rational::from_integer(12));
        assert_eq!(b.sum(), Rational::from_integer(5));
        assert!(a.dot(&column(&[1])).is_err());
    }

    #[test]
    fn test_determinant() {
        let m = ints(3, 3, &[2, 0, 1, 1, 3, 2, 1, 1, 2]);
        assert_eq!(m.determinant().unwrap(), Rational::from_integer(6));
        assert_eq!(Matrix::identity(4).determinant().unwrap(), Rational::ONE);
    }

    #[test]
    fn test_orthogonal_vector_2d() {
        let v = Matrix::orthogonal_vector(&[column(&[1, 1])], 2).unwrap();
        assert_eq!(v.to_string(), column(&[1, -1]).to_string());

        let v = Matrix::orthogonal_vector(&[column(&[-2, 3])], 2).unwrap();
        assert_eq!(v.to_string(), column(&[3, 2]).to_string());
    }

    #[test]
    fn test_orthogonal_vector_3d() {
        let basis = [column(&[1, 0, 0]), column(&[0, 1, 0])];
        let v = Matrix::orthogonal_vector(&basis, 3).unwrap();
        assert_eq!(v.to_string(), column(&[0, 0, 1]).to_string());

        let basis = [column(&[1, 2, 3]), column(&[-1, 0, 4])];
        let v = Matrix::orthogonal_vector(&basis, 3).unwrap();
        for b in &basis {
            assert!(v.dot(b).unwrap().is_zero());
        }
    }

    #[test]
    fn test_orthogonal_vector_not_enough_vectors() {
        let err = Matrix::orthogonal_vector(&[column(&[1, 0, 0])], 3).unwrap_err();
        assert_eq!(
            err,
            BoundsError::NotEnoughBasisVectors {
                needed: 2,
                supplied: 1
            }
        );
    }
}
