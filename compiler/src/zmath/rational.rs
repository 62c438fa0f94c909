//! Exact fractions over `i64`
//!
//! Arithmetic operators do not reduce their results. Call
//! [`Rational::simplify`] before relying on the reduced form; the matrix
//! routines do this after every row operation.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Greatest common divisor of `|a|` and `|b|`.
///
/// Returns 0 when either argument is 0, which makes [`Rational::simplify`]
/// clamp degenerate values to `-1`, `0` or `1`.
pub fn gcd(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    let mut a = a.unsigned_abs();
    let mut b = b.unsigned_abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a as i64
}

/// A fraction `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational::new(0, 1);
    pub const ONE: Rational = Rational::new(1, 1);
    pub const MINUS_ONE: Rational = Rational::new(-1, 1);

    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn from_integer(value: i64) -> Self {
        Self::new(value, 1)
    }

    /// Reduce by the gcd and move the sign onto the numerator.
    ///
    /// A zero numerator or denominator clamps the other side to its sign.
    pub fn simplify(self) -> Self {
        let mut divisor = gcd(self.numerator, self.denominator);
        if self.denominator < 0 {
            divisor = -divisor;
        }
        if divisor != 0 {
            Self::new(self.numerator / divisor, self.denominator / divisor)
        } else {
            Self::new(self.numerator.signum(), self.denominator.signum().abs())
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_one(&self) -> bool {
        self.numerator == self.denominator
    }

    /// -1, 0 or 1 according to the sign of the value.
    pub fn sign(&self) -> i64 {
        self.numerator.signum() * self.denominator.signum()
    }

    pub fn is_negative(&self) -> bool {
        self.sign() < 0
    }

    pub fn is_positive(&self) -> bool {
        self.sign() > 0
    }

    pub fn negate(self) -> Self {
        Self::new(-self.numerator, self.denominator)
    }

    /// Swap numerator and denominator. Must not be called on zero.
    pub fn invert(self) -> Self {
        Self::new(self.denominator, self.numerator)
    }

    pub fn abs(self) -> Self {
        Self::new(self.numerator.abs(), self.denominator.abs())
    }

    /// Multiply by an integer scalar.
    pub fn scale(self, scalar: i64) -> Self {
        Self::new(self.numerator * scalar, self.denominator)
    }

    /// Total order by value.
    pub fn compare(&self, other: &Rational) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        let raw = lhs.cmp(&rhs);
        if (self.denominator < 0) != (other.denominator < 0) {
            raw.reverse()
        } else {
            raw
        }
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational::new(
            self.numerator * rhs.denominator + rhs.numerator * self.denominator,
            self.denominator * rhs.denominator,
        )
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        Rational::new(
            self.numerator * rhs.denominator - rhs.numerator * self.denominator,
            self.denominator * rhs.denominator,
        )
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational::new(
            self.numerator * rhs.numerator,
            self.denominator * rhs.denominator,
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    fn div(self, rhs: Rational) -> Rational {
        Rational::new(
            self.numerator * rhs.denominator,
            self.denominator * rhs.numerator,
        )
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        self.negate()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 0 {
            write!(f, "NaN{}", self.numerator)
        } else if self.numerator == 0 {
            write!(f, "0")
        } else if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(-12, 18), 6);
        assert_eq!(gcd(7, 7), 7);
        assert_eq!(gcd(0, 5), 0);
        assert_eq!(gcd(5, 0), 0);
    }

    #[test]
    fn test_simplify() {
        assert_eq!(Rational::new(4, 8).simplify(), Rational::new(1, 2));
        assert_eq!(Rational::new(4, -8).simplify(), Rational::new(-1, 2));
        assert_eq!(Rational::new(-4, -8).simplify(), Rational::new(1, 2));
        assert_eq!(Rational::new(0, 7).simplify(), Rational::new(0, 1));
        assert_eq!(Rational::new(0, -7).simplify(), Rational::new(0, 1));
        assert_eq!(Rational::new(5, 0).simplify(), Rational::new(1, 0));
    }

    #[test]
    fn test_arithmetic_is_not_reduced() {
        let half = Rational::new(1, 2);
        assert_eq!(half + half, Rational::new(4, 4));
        assert!((half + half).is_one());
        assert_eq!((half + half).simplify(), Rational::ONE);
        assert_eq!((half - half).simplify(), Rational::ZERO);
        assert_eq!((half * Rational::new(2, 3)).simplify(), Rational::new(1, 3));
        assert_eq!((half / Rational::new(3, 4)).simplify(), Rational::new(2, 3));
    }

    #[test]
    fn test_sign_and_invert() {
        let r = Rational::new(-3, 4);
        assert!(r.is_negative());
        assert_eq!(r.invert(), Rational::new(4, -3));
        assert!(r.invert().is_negative());
        assert_eq!(r.invert().simplify(), Rational::new(-4, 3));
        assert_eq!(r.abs(), Rational::new(3, 4));
        assert_eq!(-r, Rational::new(3, 4));
        assert_eq!(Rational::new(3, -4).sign(), -1);
    }

    #[test]
    fn test_compare() {
        assert_eq!(Rational::new(1, 2).compare(&Rational::new(2, 3)), Ordering::Less);
        assert_eq!(Rational::new(2, 4).compare(&Rational::new(1, 2)), Ordering::Equal);
        assert_eq!(Rational::new(1, -2).compare(&Rational::new(0, 1)), Ordering::Less);
        assert_eq!(Rational::new(-1, -2).compare(&Rational::new(1, 3)), Ordering::Greater);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rational::new(3, 0).to_string(), "NaN3");
        assert_eq!(Rational::new(0, 5).to_string(), "0");
        assert_eq!(Rational::new(7, 1).to_string(), "7");
        assert_eq!(Rational::new(-2, 3).to_string(), "-2/3");
    }
}
