//! # Dense Handle Sets
//!
//! [`BitSet`] stores a set of handles as a bit vector ([`vob::Vob`]). Terminal sets
//! and lookahead-class configuration sets are both small dense ranges, which is
//! the case bit vectors are good at.
//!
//! Sets of the same kind may have been created with different universe sizes
//! (for instance after deserialization); every binary operation first grows the
//! shorter operand, so mixing them is safe.

use crate::index::{Idx, Lrc, Terminal};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use vob::Vob;

/// A set of handles backed by a bit vector
pub struct BitSet<I> {
    bits: Vob,
    _marker: PhantomData<I>,
}

/// A set of terminals
pub type TerminalSet = BitSet<Terminal>;

/// A set of lookahead-class configurations
pub type LrcSet = BitSet<Lrc>;

impl<I: Idx> BitSet<I> {
    /// Create an empty set able to hold handles below `universe` without growing
    #[must_use]
    pub fn empty(universe: usize) -> Self {
        Self {
            bits: Vob::from_elem(false, universe),
            _marker: PhantomData,
        }
    }

    /// Create the set of every handle below `universe`
    #[must_use]
    pub fn full(universe: usize) -> Self {
        Self {
            bits: Vob::from_elem(true, universe),
            _marker: PhantomData,
        }
    }

    /// Create a set containing a single handle
    #[must_use]
    pub fn singleton(universe: usize, element: I) -> Self {
        let mut set = Self::empty(universe);
        set.insert(element);
        set
    }

    /// Create a set from an iterator of handles
    pub fn from_iter_in(universe: usize, elements: impl IntoIterator<Item = I>) -> Self {
        let mut set = Self::empty(universe);
        for element in elements {
            set.insert(element);
        }
        set
    }

    fn grow(&mut self, len: usize) {
        if self.bits.len() < len {
            self.bits.resize(len, false);
        }
    }

    /// Add a handle. Returns `true` if it was not present.
    pub fn insert(&mut self, element: I) -> bool {
        let index = element.index();
        self.grow(index + 1);
        let fresh = !self.contains(element);
        self.bits.set(index, true);
        fresh
    }

    /// Remove a handle. Returns `true` if it was present.
    pub fn remove(&mut self, element: I) -> bool {
        let present = self.contains(element);
        if present {
            self.bits.set(element.index(), false);
        }
        present
    }

    /// Membership test
    #[must_use]
    pub fn contains(&self, element: I) -> bool {
        self.bits.get(element.index()).unwrap_or(false)
    }

    /// Number of handles in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.iter_set_bits(..).count()
    }

    /// Whether the set has no element
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter_set_bits(..).next().is_none()
    }

    /// Smallest handle of the set
    #[must_use]
    pub fn first(&self) -> Option<I> {
        self.bits.iter_set_bits(..).next().map(I::new)
    }

    /// Iterate the handles in ascending order
    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.bits.iter_set_bits(..).map(I::new)
    }

    /// In-place union. Returns `true` if `self` changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        self.grow(other.bits.len());
        if other.bits.len() == self.bits.len() {
            return self.bits.or(&other.bits);
        }
        let mut changed = false;
        for index in other.bits.iter_set_bits(..) {
            changed |= !self.bits.get(index).unwrap_or(false);
            self.bits.set(index, true);
        }
        changed
    }

    /// In-place intersection. Returns `true` if `self` changed.
    pub fn intersect_with(&mut self, other: &Self) -> bool {
        if other.bits.len() == self.bits.len() {
            return self.bits.and(&other.bits);
        }
        let removed: Vec<usize> = self
            .bits
            .iter_set_bits(..)
            .filter(|&index| !other.bits.get(index).unwrap_or(false))
            .collect();
        for &index in &removed {
            self.bits.set(index, false);
        }
        !removed.is_empty()
    }

    /// In-place difference. Returns `true` if `self` changed.
    pub fn subtract(&mut self, other: &Self) -> bool {
        let removed: Vec<usize> = other
            .bits
            .iter_set_bits(..)
            .filter(|&index| self.bits.get(index).unwrap_or(false))
            .collect();
        for &index in &removed {
            self.bits.set(index, false);
        }
        !removed.is_empty()
    }

    /// `self ∪ other`
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// `self ∩ other`
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// `self − other`
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    /// Whether every element of `self` is in `other`
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits
            .iter_set_bits(..)
            .all(|index| other.bits.get(index).unwrap_or(false))
    }

    /// Whether `self` and `other` share no element
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        !self
            .bits
            .iter_set_bits(..)
            .any(|index| other.bits.get(index).unwrap_or(false))
    }
}

impl<I> Clone for BitSet<I> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            _marker: PhantomData,
        }
    }
}

impl<I: Idx> Default for BitSet<I> {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl<I: Idx> PartialEq for BitSet<I> {
    fn eq(&self, other: &Self) -> bool {
        self.bits.iter_set_bits(..).eq(other.bits.iter_set_bits(..))
    }
}

impl<I: Idx> Eq for BitSet<I> {}

impl<I: Idx> Hash for BitSet<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for index in self.bits.iter_set_bits(..) {
            index.hash(state);
        }
    }
}

impl<I: Idx> fmt::Debug for BitSet<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<I: Idx> FromIterator<I> for BitSet<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::from_iter_in(0, iter)
    }
}

#[cfg(feature = "serialize")]
impl<I: Idx> serde::Serialize for BitSet<I> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.bits.iter_set_bits(..))
    }
}

#[cfg(feature = "serialize")]
impl<'de, I: Idx> serde::Deserialize<'de> for BitSet<I> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements: Vec<usize> = serde::Deserialize::deserialize(deserializer)?;
        Ok(elements.into_iter().map(I::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(universe: usize, elements: &[usize]) -> TerminalSet {
        TerminalSet::from_iter_in(universe, elements.iter().map(|&i| Terminal::new(i)))
    }

    #[test]
    fn set_algebra() {
        let a = set(8, &[1, 2, 5]);
        let b = set(8, &[2, 3]);
        assert_eq!(a.union(&b), set(8, &[1, 2, 3, 5]));
        assert_eq!(a.intersection(&b), set(8, &[2]));
        assert_eq!(a.difference(&b), set(8, &[1, 5]));
        assert!(set(8, &[2]).is_subset(&a));
        assert!(!b.is_subset(&a));
        assert!(set(8, &[0, 7]).is_disjoint(&a));
    }

    #[test]
    fn mixed_universe_sizes() {
        let mut small = set(2, &[1]);
        let large = set(10, &[1, 9]);
        assert!(small.union_with(&large));
        assert_eq!(small, set(10, &[1, 9]));
        let mut large = set(10, &[0, 1, 9]);
        assert!(large.intersect_with(&set(2, &[1])));
        assert_eq!(large, set(2, &[1]));
        assert!(!large.subtract(&set(20, &[15])));
    }

    #[test]
    fn equality_ignores_capacity() {
        assert_eq!(set(3, &[0]), set(30, &[0]));
        assert!(TerminalSet::empty(5).is_empty());
        assert_eq!(TerminalSet::full(3).len(), 3);
        assert_eq!(set(4, &[3, 1]).first(), Some(Terminal::new(1)));
    }

    #[test]
    fn change_reporting() {
        let mut a = set(4, &[0]);
        assert!(a.insert(Terminal::new(2)));
        assert!(!a.insert(Terminal::new(2)));
        assert!(a.remove(Terminal::new(0)));
        assert!(!a.remove(Terminal::new(0)));
        assert!(!a.union_with(&set(4, &[2])));
    }

    #[test]
    fn change_reporting_across_universes() {
        let mut a = set(4, &[1]);
        assert!(!a.union_with(&set(2, &[1])));
        assert!(a.union_with(&set(2, &[0])));
        assert!(!a.union_with(&set(4, &[0, 1])));
        assert!(a.union_with(&set(6, &[5])));
        assert_eq!(a, set(6, &[0, 1, 5]));
        assert!(!a.intersect_with(&set(6, &[0, 1, 5])));
        assert!(a.intersect_with(&set(6, &[5])));
        assert_eq!(TerminalSet::full(70).len(), 70);
        assert!(TerminalSet::full(70).contains(Terminal::new(69)));
        assert!(!TerminalSet::empty(70).contains(Terminal::new(69)));
    }
}
