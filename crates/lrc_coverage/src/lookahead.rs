//! # Lookahead Coverage
//!
//! The central traversal: discover every reachable (configuration, rejected
//! terminal) pair once, against a "still interesting" invariant shared by the
//! whole exploration.
//!
//! ## Status
//!
//! Each path carries the terminals it has already *accepted* (shifted at some
//! node along the path) and a coverage-tree node holding the terminals proven
//! *rejected* along the path and those *committed*: still reachable as a
//! rejection deeper down, and not resolved yet.
//!
//! ## Fixpoint
//!
//! Two running sets per graph node, seeded from the node's potential-reject
//! sets, only ever shrink:
//!
//! - `before[n]` loses the terminals rejected by every path that reaches `n`;
//! - `after[n]` loses the terminals a path reaching `n` takes charge of
//!   exploring beyond it.
//!
//! A transition whose arrival removes nothing from `before[n]` and claims
//! nothing from `after[n]` is not expanded. Each expansion strictly shrinks one
//! of the running sets, so the traversal reaches a fixpoint even though the
//! graph has cycles.
//!
//! ## Post-pass
//!
//! [`LookaheadCoverage::measure_lookaheads`] folds the trees bottom-up into the
//! terminals each subtree resolves; [`LookaheadCoverage::enum_sentences`] hands
//! every leaf to sentence synthesis.

use crate::bitset::TerminalSet;
use crate::config::Scheduling;
use crate::error::{CoverageError, Explorer, Result};
use crate::index::{Idx, Lrc, Node, all};
use crate::suffix::Suffix;
use crate::upstream::{LookaheadClasses, ReachTransition, ReductionGraph};
use std::collections::VecDeque;
use std::rc::Rc;

/// Node of a lookahead-coverage tree
#[derive(Debug, Clone)]
pub struct LookaheadTreeNode {
    pub node: Node,
    pub depth: usize,
    /// Terminals still reachable as a rejection and not resolved on this path
    pub committed: TerminalSet,
    /// Terminals rejected along this path
    pub rejected: TerminalSet,
    /// Reduction path from the entry node to this node
    pub suffix: Rc<Suffix>,
    pub children: Vec<usize>,
}

/// Aggregate counts of one exploration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LookaheadStats {
    /// Terminals resolved inside each entry's own tree, summed over entries
    pub direct: usize,
    /// Terminals committed at an entry but resolved by another entry's tree
    pub indirect: usize,
    /// Committed terminals left unresolved below their node, over all nodes
    pub unresolved: usize,
    /// Leaves with a non-empty rejected set
    pub sentences: usize,
    /// Tree nodes over all entries
    pub nodes: usize,
    /// Arrivals cut by the fixpoint rule
    pub pruned: usize,
}

impl LookaheadStats {
    /// Quantity both schedules must agree on
    #[must_use]
    pub const fn total(&self) -> usize {
        self.direct + self.indirect
    }
}

#[derive(Debug)]
struct Status {
    accepted: TerminalSet,
    index: usize,
}

/// Coverage trees, one per entry configuration
#[derive(Debug, Clone)]
pub struct LookaheadCoverage {
    arena: Vec<LookaheadTreeNode>,
    roots: Vec<(Lrc, usize)>,
    before: Vec<TerminalSet>,
    after: Vec<TerminalSet>,
    pruned: usize,
}

impl LookaheadCoverage {
    /// Explore every entry configuration with the given schedule
    pub fn explore<U>(upstream: &U, scheduling: Scheduling) -> Self
    where
        U: LookaheadClasses + ReductionGraph + ?Sized,
    {
        let count = upstream.node_count();
        let mut coverage = Self {
            arena: Vec::new(),
            roots: Vec::new(),
            before: all::<Node>(count)
                .map(|n| upstream.potential_reject_before(n).clone())
                .collect(),
            after: all::<Node>(count)
                .map(|n| upstream.potential_reject_after(n).clone())
                .collect(),
            pruned: 0,
        };

        for &(lrc, root) in upstream.initial() {
            let status = coverage.root(upstream, lrc, root);
            coverage.roots.push((lrc, status.index));
            log::debug!(
                "lookahead coverage: entry {lrc:?} rejects {:?}, commits {:?}",
                coverage.arena[status.index].rejected,
                coverage.arena[status.index].committed
            );

            match scheduling {
                Scheduling::Dfs => {
                    let mut stack = vec![status];
                    while let Some(status) = stack.pop() {
                        let children = coverage.expand(upstream, &status);
                        stack.extend(children.into_iter().rev());
                    }
                }
                Scheduling::Bfs => {
                    let mut queue = VecDeque::from([status]);
                    while let Some(status) = queue.pop_front() {
                        queue.extend(coverage.expand(upstream, &status));
                    }
                }
            }
        }

        log::info!(
            "lookahead coverage ({scheduling:?}): {} tree nodes, {} arrivals pruned",
            coverage.arena.len(),
            coverage.pruned
        );
        coverage
    }

    fn root<U>(&mut self, upstream: &U, lrc: Lrc, root: Node) -> Status
    where
        U: LookaheadClasses + ReductionGraph + ?Sized,
    {
        let state = upstream.lr1_of(lrc);
        let lookahead = upstream.lookahead(lrc);
        let accepted = upstream.shift_on(state).intersection(lookahead);
        let rejected = upstream.reject(state).intersection(lookahead);
        let mut committed = upstream.potential_reject_after(root).difference(&accepted);
        committed.subtract(&rejected);

        self.arena.push(LookaheadTreeNode {
            node: root,
            depth: 0,
            committed,
            rejected,
            suffix: Suffix::top(lrc, root),
            children: Vec::new(),
        });
        Status {
            accepted,
            index: self.arena.len() - 1,
        }
    }

    fn expand<U>(&mut self, upstream: &U, status: &Status) -> Vec<Status>
    where
        U: ReductionGraph + ?Sized,
    {
        let node = self.arena[status.index].node;
        upstream
            .transitions(node)
            .iter()
            .filter_map(|transition| self.enter(upstream, status, transition))
            .collect()
    }

    /// Follow one transition; `None` if the arrival adds nothing new
    fn enter<U>(
        &mut self,
        upstream: &U,
        status: &Status,
        transition: &ReachTransition,
    ) -> Option<Status>
    where
        U: ReductionGraph + ?Sized,
    {
        let target = transition.target;
        let parent = &self.arena[status.index];

        let mut rejected = upstream
            .immediate_reject(target)
            .difference(&status.accepted);
        rejected.union_with(&parent.rejected);
        let mut accepted = upstream.immediate_accept(target).difference(&rejected);
        accepted.union_with(&status.accepted);

        let before = &self.before[target.index()];
        let shrunk_before = before.difference(&rejected);
        let mut claimed = self.after[target.index()].difference(&accepted);
        claimed.subtract(&rejected);

        if shrunk_before == *before && claimed.is_empty() {
            log::trace!("pruned arrival at {target:?} with rejected {rejected:?}");
            self.pruned += 1;
            return None;
        }

        self.before[target.index()] = shrunk_before;
        self.after[target.index()].subtract(&claimed);

        let mut committed = parent.committed.union(&claimed);
        committed.subtract(&rejected);
        let suffix = Suffix::reduce(
            &parent.suffix,
            target,
            transition.reduction.production,
            transition.depth,
        );
        let depth = parent.depth + 1;

        self.arena.push(LookaheadTreeNode {
            node: target,
            depth,
            committed,
            rejected,
            suffix,
            children: Vec::new(),
        });
        let index = self.arena.len() - 1;
        self.arena[status.index].children.push(index);
        Some(Status { accepted, index })
    }

    /// Bottom-up fold: resolved rejections per subtree, direct and indirect totals
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::UnresolvedRejection`] if an internal node rejects
    /// a terminal none of its children resolves.
    pub fn measure_lookaheads(&self) -> Result<LookaheadStats> {
        let resolved = self.resolve()?;
        let mut stats = LookaheadStats {
            nodes: self.arena.len(),
            pruned: self.pruned,
            ..LookaheadStats::default()
        };

        for (index, node) in self.arena.iter().enumerate() {
            stats.unresolved += node.committed.difference(&resolved[index]).len();
            if node.children.is_empty() && !node.rejected.is_empty() {
                stats.sentences += 1;
            }
        }
        for &(_, root) in &self.roots {
            stats.direct += resolved[root].len();
            stats.indirect += self.arena[root].committed.difference(&resolved[root]).len();
        }

        log::info!(
            "lookahead coverage: {} sentences, {} direct, {} indirect, {} unresolved commitments",
            stats.sentences,
            stats.direct,
            stats.indirect,
            stats.unresolved
        );
        Ok(stats)
    }

    /// Resolved rejected set of every tree node
    fn resolve(&self) -> Result<Vec<TerminalSet>> {
        let mut resolved = vec![TerminalSet::default(); self.arena.len()];
        // Children are always allocated after their parent.
        for index in (0..self.arena.len()).rev() {
            let node = &self.arena[index];
            if node.children.is_empty() {
                resolved[index] = node.rejected.clone();
                continue;
            }
            let mut union = TerminalSet::default();
            for &child in &node.children {
                union.union_with(&resolved[child]);
            }
            if !node.rejected.is_subset(&union) {
                return Err(CoverageError::UnresolvedRejection {
                    node: node.node,
                    rejected: node.rejected.clone(),
                    resolved: union,
                });
            }
            resolved[index] = union;
        }
        Ok(resolved)
    }

    /// Call `f` with the suffix and rejected set of every leaf that rejects something
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn enum_sentences<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&Rc<Suffix>, &TerminalSet) -> Result<()>,
    {
        for &(_, root) in &self.roots {
            let mut stack = vec![root];
            while let Some(index) = stack.pop() {
                let node = &self.arena[index];
                if node.children.is_empty() {
                    if !node.rejected.is_empty() {
                        f(&node.suffix, &node.rejected)?;
                    }
                } else {
                    stack.extend(node.children.iter().rev().copied());
                }
            }
        }
        Ok(())
    }

    /// Run both schedules and require equal direct + indirect totals
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::ScheduleMismatch`] if the totals differ, or any
    /// error of [`Self::measure_lookaheads`].
    pub fn check_schedules<U>(upstream: &U) -> Result<(LookaheadStats, LookaheadStats)>
    where
        U: LookaheadClasses + ReductionGraph + ?Sized,
    {
        let dfs = Self::explore(upstream, Scheduling::Dfs).measure_lookaheads()?;
        let bfs = Self::explore(upstream, Scheduling::Bfs).measure_lookaheads()?;
        if dfs.total() != bfs.total() {
            return Err(CoverageError::ScheduleMismatch {
                explorer: Explorer::Lookahead,
                dfs: dfs.total(),
                bfs: bfs.total(),
            });
        }
        Ok((dfs, bfs))
    }

    /// Roots of the trees, with the entry configuration each one explores
    #[must_use]
    pub fn roots(&self) -> &[(Lrc, usize)] {
        &self.roots
    }

    #[must_use]
    pub fn tree_node(&self, index: usize) -> &LookaheadTreeNode {
        &self.arena[index]
    }

    /// All tree nodes, parents before children
    #[must_use]
    pub fn tree_nodes(&self) -> &[LookaheadTreeNode] {
        &self.arena
    }
}
