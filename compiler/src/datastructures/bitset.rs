//! A set of integers in `0..32` packed into one `u32`
//!
//! The cardinality is cached. Single-element updates keep the cache exact;
//! bulk operations (union, intersection) mark it dirty and the next call to
//! [`BitSet32::len`] recounts.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};

const DIRTY_SIZE: u32 = u32::MAX;

/// Number of members a [`BitSet32`] can hold.
pub const CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct BitSet32 {
    data: u32,
    size: Cell<u32>,
}

impl BitSet32 {
    pub fn new() -> Self {
        Self {
            data: 0,
            size: Cell::new(0),
        }
    }

    pub fn from_bits(data: u32) -> Self {
        Self {
            data,
            size: Cell::new(DIRTY_SIZE),
        }
    }

    /// Insert `index`. Returns true if it was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        debug_assert!(index < CAPACITY, "BitSet32 index {index} out of range");
        let mask = 1u32 << index;
        if self.data & mask != 0 {
            return false;
        }
        self.data |= mask;
        let size = self.size.get();
        if size != DIRTY_SIZE {
            self.size.set(size + 1);
        }
        true
    }

    /// Remove `index`. Returns true if it was present.
    pub fn remove(&mut self, index: usize) -> bool {
        debug_assert!(index < CAPACITY, "BitSet32 index {index} out of range");
        let mask = 1u32 << index;
        if self.data & mask == 0 {
            return false;
        }
        self.data &= !mask;
        let size = self.size.get();
        if size != DIRTY_SIZE {
            self.size.set(size - 1);
        }
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        index < CAPACITY && self.data & (1u32 << index) != 0
    }

    pub fn union_with(&mut self, other: &BitSet32) {
        self.data |= other.data;
        self.size.set(DIRTY_SIZE);
    }

    pub fn intersect_with(&mut self, other: &BitSet32) {
        self.data &= other.data;
        self.size.set(DIRTY_SIZE);
    }

    pub fn intersection(&self, other: &BitSet32) -> BitSet32 {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    pub fn clear(&mut self) {
        self.data = 0;
        self.size.set(0);
    }

    pub fn bits(&self) -> u32 {
        self.data
    }

    pub fn len(&self) -> usize {
        let mut size = self.size.get();
        if size == DIRTY_SIZE {
            size = self.data.count_ones();
            self.size.set(size);
        }
        size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data == 0
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let data = self.data;
        (0..CAPACITY).filter(move |&index| data & (1u32 << index) != 0)
    }

    /// Visit members in ascending order until `callback` returns false.
    pub fn for_each(&self, mut callback: impl FnMut(usize) -> bool) {
        for index in self.iter() {
            if !callback(index) {
                break;
            }
        }
    }

    /// Visit every subset with `subset_size` members.
    ///
    /// A set with no more than `subset_size` members yields only itself.
    /// Otherwise subsets are produced by deciding the lowest undecided member
    /// first, with the "leave it out" branch explored before the "take it"
    /// branch.
    pub fn for_each_subset(&self, subset_size: usize, mut callback: impl FnMut(&BitSet32)) {
        if subset_size >= self.len() {
            callback(self);
            return;
        }
        Self::subsets_rec(BitSet32::new(), self.data, subset_size, &mut callback);
    }

    /// Every subset with `subset_size` members, in [`Self::for_each_subset`] order.
    pub fn subsets(&self, subset_size: usize) -> Vec<BitSet32> {
        let mut out = Vec::new();
        self.for_each_subset(subset_size, |subset| out.push(subset.clone()));
        out
    }

    fn subsets_rec(
        current: BitSet32,
        remaining: u32,
        target: usize,
        callback: &mut impl FnMut(&BitSet32),
    ) {
        let have = current.len();
        if have == target {
            callback(&current);
            return;
        }
        if remaining == 0 {
            return;
        }
        let lowest = remaining.trailing_zeros() as usize;
        let rest = remaining & (remaining - 1);
        if have + rest.count_ones() as usize >= target {
            Self::subsets_rec(current.clone(), rest, target, callback);
        }
        let mut taken = current;
        taken.insert(lowest);
        Self::subsets_rec(taken, rest, target, callback);
    }
}

impl Default for BitSet32 {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BitSet32 {
    fn eq(&self, other: &BitSet32) -> bool {
        self.data == other.data
    }
}

impl Eq for BitSet32 {}

impl Hash for BitSet32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl FromIterator<usize> for BitSet32 {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet32::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl fmt::Display for BitSet32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, index) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}
