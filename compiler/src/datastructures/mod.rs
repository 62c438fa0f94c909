//! Small fixed-width containers used by the polytope bookkeeping

pub mod bitset;

pub use bitset::BitSet32;
