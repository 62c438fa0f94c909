//! Exact arithmetic for the bounds checker
//!
//! Everything here works over [`Rational`] values built from 64-bit integers.
//! There is no floating point anywhere in the constraint engine: a fact is
//! either proven with exact arithmetic or it is not proven at all.

pub mod matrix;
pub mod rational;

pub use matrix::Matrix;
pub use rational::{gcd, Rational};
