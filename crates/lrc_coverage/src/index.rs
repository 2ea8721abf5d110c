//! # Typed Handles
//!
//! Every entity the analysis touches is referred to by a dense integer handle.
//! Handles are assigned by whoever builds the upstream tables, are contiguous
//! from zero, and index directly into the vectors the explorers own.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dense index usable as a vector offset and as a bitset element.
pub trait Idx: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Create a handle from its raw position
    fn new(index: usize) -> Self;

    /// Raw position of the handle
    fn index(self) -> usize;
}

macro_rules! define_index {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
            #[cfg_attr(feature = "serialize", serde(transparent))]
            pub struct $name(u32);

            impl $name {
                /// Create a handle from its raw position
                ///
                /// # Panics
                ///
                /// Panics if `index` does not fit in 32 bits.
                #[must_use]
                pub fn from_usize(index: usize) -> Self {
                    Self(u32::try_from(index).expect(concat!(stringify!($name), " index overflow")))
                }

                /// Raw position of the handle
                #[must_use]
                pub const fn as_usize(self) -> usize {
                    self.0 as usize
                }
            }

            impl Idx for $name {
                #[inline]
                fn new(index: usize) -> Self {
                    Self::from_usize(index)
                }

                #[inline]
                fn index(self) -> usize {
                    self.as_usize()
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "#{}", self.0)
                }
            }
        )*
    };
}

define_index! {
    /// A terminal symbol of the grammar
    Terminal;
    /// A nonterminal symbol of the grammar
    Nonterminal;
    /// A production of the grammar
    Production;
    /// A state of the base LR(1) automaton
    Lr1;
    /// A lookahead-class configuration: an LR(1) state paired with one class
    Lrc;
    /// A shift or goto transition of the base automaton
    Transition;
    /// A node of the reachable-reduction graph
    Node;
    /// A node of the cost tree (a transition leaf or a binary join)
    TreeNode;
    /// An encoded (tree node, pre class, post class) cost cell
    Cell;
}

/// Iterate over every handle of a dense index space.
pub fn all<I: Idx>(count: usize) -> impl DoubleEndedIterator<Item = I> + ExactSizeIterator {
    (0..count).map(I::new)
}
