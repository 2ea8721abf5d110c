//! # Reduction Coverage
//!
//! Visits every node of the reachable-reduction graph once, from the initial
//! node of every entry configuration, and measures how many distinct reduction
//! paths ("sentences") the resulting first-touch trees contain.
//!
//! ## Policy
//!
//! A target node is expanded the first time any path reaches it. Every
//! traversed transition still creates a tree node: an arrival at an already
//! visited target is a leaf, as is a node with no outgoing transition. Since
//! every reachable node is expanded exactly once whatever the order, the number
//! of leaves does not depend on the schedule, while their depths do.
//!
//! Running the explorer depth-first and breadth-first and comparing the
//! sentence counts ([`ReductionCoverage::check_schedules`]) is a consistency
//! check on the graph and on the explorer.

use crate::config::Scheduling;
use crate::error::{CoverageError, Explorer, Result};
use crate::index::{Idx, Lrc, Node, Production};
use crate::upstream::ReductionGraph;
use std::collections::VecDeque;

/// Node of a reduction-coverage tree
#[derive(Debug, Clone)]
pub struct ReductionTreeNode {
    pub node: Node,
    pub depth: usize,
    /// Reduction and pop depth of the edge from the parent
    pub edge: Option<(Production, usize)>,
    pub children: Vec<usize>,
}

/// Aggregate counts of one exploration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ReductionStats {
    /// Root-to-leaf paths
    pub sentences: usize,
    /// Sum of the depths of all leaves
    pub total_depth: usize,
    /// Graph nodes expanded
    pub expanded: usize,
}

impl ReductionStats {
    #[must_use]
    pub fn average_depth(&self) -> f64 {
        if self.sentences == 0 {
            0.0
        } else {
            self.total_depth as f64 / self.sentences as f64
        }
    }
}

/// First-touch coverage trees, one per entry configuration
#[derive(Debug, Clone)]
pub struct ReductionCoverage {
    arena: Vec<ReductionTreeNode>,
    roots: Vec<(Lrc, usize)>,
    stats: ReductionStats,
}

impl ReductionCoverage {
    /// Explore the whole graph with the given schedule
    pub fn explore<G: ReductionGraph + ?Sized>(graph: &G, scheduling: Scheduling) -> Self {
        let mut explorer = Self {
            arena: Vec::new(),
            roots: Vec::new(),
            stats: ReductionStats::default(),
        };
        let mut visited = vec![false; graph.node_count()];

        for &(lrc, root) in graph.initial() {
            let index = explorer.alloc(root, 0, None);
            explorer.roots.push((lrc, index));
            if visited[root.index()] {
                continue;
            }
            visited[root.index()] = true;

            match scheduling {
                Scheduling::Dfs => {
                    let mut stack = vec![index];
                    while let Some(current) = stack.pop() {
                        let fresh = explorer.expand(graph, current, &mut visited);
                        stack.extend(fresh.into_iter().rev());
                    }
                }
                Scheduling::Bfs => {
                    let mut queue = VecDeque::from([index]);
                    while let Some(current) = queue.pop_front() {
                        queue.extend(explorer.expand(graph, current, &mut visited));
                    }
                }
            }
        }

        for node in &explorer.arena {
            if node.children.is_empty() {
                explorer.stats.sentences += 1;
                explorer.stats.total_depth += node.depth;
            }
        }
        explorer.stats.expanded = visited.iter().filter(|&&v| v).count();

        log::info!(
            "reduction coverage ({scheduling:?}): {} sentences, average depth {:.2}, {} nodes",
            explorer.stats.sentences,
            explorer.stats.average_depth(),
            explorer.stats.expanded
        );
        explorer
    }

    /// Run both schedules and require equal sentence counts
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::ScheduleMismatch`] if the counts differ.
    pub fn check_schedules<G: ReductionGraph + ?Sized>(
        graph: &G,
    ) -> Result<(ReductionStats, ReductionStats)> {
        let dfs = Self::explore(graph, Scheduling::Dfs).stats;
        let bfs = Self::explore(graph, Scheduling::Bfs).stats;
        if dfs.sentences != bfs.sentences {
            return Err(CoverageError::ScheduleMismatch {
                explorer: Explorer::Reduction,
                dfs: dfs.sentences,
                bfs: bfs.sentences,
            });
        }
        Ok((dfs, bfs))
    }

    fn alloc(&mut self, node: Node, depth: usize, edge: Option<(Production, usize)>) -> usize {
        self.arena.push(ReductionTreeNode {
            node,
            depth,
            edge,
            children: Vec::new(),
        });
        self.arena.len() - 1
    }

    /// Create one child per transition; return those whose target was fresh
    fn expand<G: ReductionGraph + ?Sized>(
        &mut self,
        graph: &G,
        index: usize,
        visited: &mut [bool],
    ) -> Vec<usize> {
        let node = self.arena[index].node;
        let depth = self.arena[index].depth;
        let mut fresh = Vec::new();
        for transition in graph.transitions(node) {
            let child = self.alloc(
                transition.target,
                depth + 1,
                Some((transition.reduction.production, transition.depth)),
            );
            self.arena[index].children.push(child);
            let seen = &mut visited[transition.target.index()];
            if !*seen {
                *seen = true;
                fresh.push(child);
            }
        }
        fresh
    }

    #[must_use]
    pub const fn stats(&self) -> ReductionStats {
        self.stats
    }

    /// Roots of the trees, with the entry configuration each one explores
    #[must_use]
    pub fn roots(&self) -> &[(Lrc, usize)] {
        &self.roots
    }

    #[must_use]
    pub fn tree_node(&self, index: usize) -> &ReductionTreeNode {
        &self.arena[index]
    }

    /// Total number of tree nodes over all roots
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
