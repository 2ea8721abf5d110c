//! # Error Types
//!
//! Almost every failure this crate detects is an inconsistency in the upstream
//! tables: a configuration without a path from an entry point, a reduction that
//! does not fit the stack shape it is replayed on, a cost that no word realizes.
//! Such errors carry the sets, states and stack contents needed to locate the
//! defect upstream; there is no recovery path.
//!
//! The DFS/BFS and two-strategy consistency checks are reported through the same
//! type, after the fact.

use crate::bitset::{LrcSet, TerminalSet};
use crate::index::{Lr1, Lrc, Node, Production, Transition, TreeNode};
use crate::upstream::Cost;

/// Result alias used throughout the crate
pub type Result<T, E = CoverageError> = std::result::Result<T, E>;

/// Which explorer a schedule comparison refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Explorer {
    Reduction,
    Lookahead,
}

impl std::fmt::Display for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reduction => f.write_str("reduction coverage"),
            Self::Lookahead => f.write_str("lookahead coverage"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("no configuration of {candidates:?} has a path from an entry configuration")]
    UnreachableConfiguration { candidates: LrcSet },

    #[error("start state {state:?} has no entrypoint")]
    MissingEntrypoint { state: Lr1 },

    #[error("no transition from state {from:?} to state {to:?}")]
    MissingTransition { from: Lr1, to: Lr1 },

    #[error(
        "reduction of {production:?} expects {lrcs:?} on top of the stack\n  stack: {stack:?}\n  pending pops: {pop_buffer:?}\n  pending pushes: {pending_push}"
    )]
    ReduceOutsideTop {
        production: Production,
        lrcs: LrcSet,
        stack: Vec<LrcSet>,
        pop_buffer: Vec<LrcSet>,
        pending_push: usize,
    },

    #[error("narrowing emptied stack layer {layer} (successors of {below:?} miss {above:?})")]
    EmptyNarrowing {
        layer: usize,
        below: LrcSet,
        above: LrcSet,
    },

    #[error("no configuration of layer {layer} follows {previous:?} (candidates {candidates:?})")]
    EmptyLayer {
        layer: usize,
        previous: Lrc,
        candidates: LrcSet,
    },

    #[error("no class of transition {transition:?} realizes pre-class {class} with post-class {post}")]
    UnrealizableCell {
        transition: Transition,
        class: usize,
        post: usize,
    },

    #[error(
        "goto {transition:?} at ({pre}, {post}) costs {cost} but no equation matches (pre {pre_class:?}, post {post_class:?})"
    )]
    NoMatchingEquation {
        transition: Transition,
        pre: usize,
        post: usize,
        cost: Cost,
        pre_class: TerminalSet,
        post_class: TerminalSet,
    },

    #[error("join {node:?} at ({pre}, {post}) costs {cost} but no split of the two sides matches")]
    NoMatchingSplit {
        node: TreeNode,
        pre: usize,
        post: usize,
        cost: Cost,
    },

    #[error("coverage node for {node:?} rejects {rejected:?} but its children only resolve {resolved:?}")]
    UnresolvedRejection {
        node: Node,
        rejected: TerminalSet,
        resolved: TerminalSet,
    },

    #[error("{explorer} disagrees between schedules: dfs {dfs}, bfs {bfs}")]
    ScheduleMismatch {
        explorer: Explorer,
        dfs: usize,
        bfs: usize,
    },

    #[error("stack reconstruction strategies disagree:\n  form:   {form}\n  direct: {direct}")]
    StrategyMismatch { form: String, direct: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serialize")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
