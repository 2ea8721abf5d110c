//! # Lrc Prefix Index
//!
//! For every lookahead-class configuration reachable from a start state, a
//! representative path back to the start configuration.
//!
//! The index is built by a breadth-first sweep over the successor relation,
//! seeded from the first configuration of every start state. A configuration
//! is assigned the first time a wave reaches it and never again; later
//! arrivals are dropped, so the stored path is *a* shortest witness, not the
//! only one.

use crate::bitset::LrcSet;
use crate::index::{Idx, Lrc, all};
use crate::upstream::{Automaton, LookaheadClasses};
use std::rc::Rc;

/// Inverse of the predecessor relation over configurations
#[derive(Debug, Clone)]
pub struct Successors {
    table: Vec<LrcSet>,
}

impl Successors {
    /// Invert `predecessors` once for the whole run
    #[must_use]
    pub fn build<L: LookaheadClasses + ?Sized>(classes: &L) -> Self {
        let count = classes.lrc_count();
        let mut table = vec![LrcSet::empty(count); count];
        for lrc in all::<Lrc>(count) {
            for pred in classes.predecessors(lrc).iter() {
                table[pred.index()].insert(lrc);
            }
        }
        Self { table }
    }

    /// Direct successors of one configuration
    #[must_use]
    pub fn of(&self, lrc: Lrc) -> &LrcSet {
        &self.table[lrc.index()]
    }

    /// Union of the successors of every configuration in `set`
    #[must_use]
    pub fn image(&self, set: &LrcSet) -> LrcSet {
        let mut result = LrcSet::empty(self.table.len());
        for lrc in set.iter() {
            result.union_with(&self.table[lrc.index()]);
        }
        result
    }
}

/// Union of the predecessors of every configuration in `set`
#[must_use]
pub fn predecessor_image<L: LookaheadClasses + ?Sized>(classes: &L, set: &LrcSet) -> LrcSet {
    let mut result = LrcSet::empty(classes.lrc_count());
    for lrc in set.iter() {
        result.union_with(classes.predecessors(lrc));
    }
    result
}

/// Single-assignment table of paths from start configurations
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    paths: Vec<Option<Rc<[Lrc]>>>,
}

impl PrefixIndex {
    /// Sweep the successor relation from every start configuration
    pub fn build<A>(automaton: &A, successors: &Successors) -> Self
    where
        A: Automaton + LookaheadClasses + ?Sized,
    {
        let mut paths: Vec<Option<Rc<[Lrc]>>> = vec![None; automaton.lrc_count()];
        let mut wave = Vec::new();

        for state in all(automaton.state_count()) {
            if automaton.is_entry(state) {
                let seed = automaton.first_lrc(state);
                if paths[seed.index()].is_none() {
                    paths[seed.index()] = Some(Rc::from([seed]));
                    wave.push(seed);
                }
            }
        }

        while !wave.is_empty() {
            let mut next = Vec::new();
            for parent in wave {
                let Some(parent_path) = paths[parent.index()].clone() else {
                    continue;
                };
                for child in successors.of(parent).iter() {
                    let slot = &mut paths[child.index()];
                    if slot.is_none() {
                        let mut path = Vec::with_capacity(parent_path.len() + 1);
                        path.push(child);
                        path.extend_from_slice(&parent_path);
                        *slot = Some(Rc::from(path));
                        next.push(child);
                    }
                }
            }
            wave = next;
        }

        let index = Self { paths };
        log::debug!(
            "prefix index: {} of {} configurations reachable",
            index.reachable_count(),
            index.paths.len()
        );
        index
    }

    /// Full path `[lrc, parent, ..., start configuration]`
    #[must_use]
    pub fn path(&self, lrc: Lrc) -> Option<&[Lrc]> {
        self.paths.get(lrc.index())?.as_deref()
    }

    /// Ancestors of `lrc`, nearest first; empty for a start configuration
    #[must_use]
    pub fn prefix(&self, lrc: Lrc) -> Option<&[Lrc]> {
        self.path(lrc).map(|path| &path[1..])
    }

    #[must_use]
    pub fn is_reachable(&self, lrc: Lrc) -> bool {
        self.path(lrc).is_some()
    }

    /// Number of configurations with a path
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.paths.iter().filter(|path| path.is_some()).count()
    }
}
