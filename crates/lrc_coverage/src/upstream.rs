//! # Upstream Interfaces
//!
//! The analysis consumes five read-only collaborators. None of them is built
//! here; they describe an automaton that someone else has constructed and that
//! this crate treats as a trusted precondition.
//!
//! - [`Grammar`]: symbol and production identity, display names
//! - [`Automaton`]: the base LR(1) automaton (states, transitions, item sets)
//! - [`LookaheadClasses`]: the lookahead-class refinement (the *Lrc* layer)
//! - [`ReductionGraph`]: the reachable-reduction graph
//! - [`CostTables`]: the tree-shaped reachability cost tables
//!
//! [`Upstream`] bundles all five for the components that need everything.
//! [`crate::tables::Tables`] is an owned implementation of every trait.

use crate::bitset::{LrcSet, TerminalSet};
use crate::index::{Cell, Lr1, Lrc, Node, Nonterminal, Production, Terminal, Transition, TreeNode};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Integer lower bound on the number of terminals needed to realize a cell
pub type Cost = u32;

/// Cost of a cell that no word realizes
pub const UNREACHABLE: Cost = Cost::MAX;

/// A grammar symbol; terminals order before nonterminals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Symbol {
    Terminal(Terminal),
    Nonterminal(Nonterminal),
}

impl Symbol {
    /// The terminal, if this symbol is one
    #[must_use]
    pub const fn terminal(self) -> Option<Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::Nonterminal(_) => None,
        }
    }
}

/// An LR(0) item: a production with a dot position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Item {
    pub production: Production,
    pub dot: u32,
}

/// Endpoints and label of a base-automaton transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TransitionInfo {
    pub source: Lr1,
    pub target: Lr1,
    pub symbol: Symbol,
}

/// A production together with the lookaheads that trigger its reduction
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Reduction {
    pub production: Production,
    pub lookahead: TerminalSet,
}

/// Viable-reduction configuration carried by a reachable-reduction node
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ViableConfig {
    /// Base state on top of the stack at this node
    pub top: Lr1,
    /// Configurations of the deepest original stack frame consistent with this node
    pub lrcs: LrcSet,
}

/// Labeled edge of the reachable-reduction graph
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ReachTransition {
    pub target: Node,
    pub reduction: Reduction,
    /// Number of original stack frames popped below the frontier
    pub depth: usize,
}

/// Shape of a cost-tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Split {
    /// A single base-automaton transition
    Leaf(Transition),
    /// Two adjacent spans, left then right
    Join(TreeNode, TreeNode),
}

/// A non-nullable way to realize a goto: the tree spanning a production's
/// right-hand side, and the lookaheads on which that production reduces
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Equation {
    pub node: TreeNode,
    pub lookahead: TerminalSet,
}

/// All the ways a goto transition can be realized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GotoEquations {
    /// Lookaheads on which a nullable production of the goto symbol reduces
    pub nullable_lookaheads: TerminalSet,
    /// Nullable productions of the goto symbol reducible from the source state
    pub nullable: Vec<Production>,
    /// Non-nullable alternatives, in preference order
    pub non_nullable: Vec<Equation>,
}

/// Correspondence between the classes of two partitions
///
/// `forward[i]` lists the classes of the second partition that intersect
/// class `i` of the first; `backward[j]` is the first class of the first
/// partition intersecting class `j` of the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coercion {
    pub forward: Vec<SmallVec<[usize; 4]>>,
    pub backward: Vec<Option<usize>>,
}

impl Coercion {
    /// Relate two partitions by class intersection
    #[must_use]
    pub fn infix(from: &[TerminalSet], to: &[TerminalSet]) -> Self {
        let forward = from
            .iter()
            .map(|class| {
                to.iter()
                    .enumerate()
                    .filter(|(_, other)| !class.is_disjoint(other))
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        let backward = to
            .iter()
            .map(|class| from.iter().position(|other| !class.is_disjoint(other)))
            .collect();
        Self { forward, backward }
    }
}

/// Vocabulary of the grammar
pub trait Grammar {
    fn terminal_count(&self) -> usize;
    fn nonterminal_count(&self) -> usize;
    fn production_count(&self) -> usize;
    fn terminal_name(&self, terminal: Terminal) -> &str;
    fn nonterminal_name(&self, nonterminal: Nonterminal) -> &str;
    fn lhs(&self, production: Production) -> Nonterminal;
    fn rhs(&self, production: Production) -> &[Symbol];

    fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(t) => self.terminal_name(t),
            Symbol::Nonterminal(n) => self.nonterminal_name(n),
        }
    }
}

/// The base LR(1) automaton
pub trait Automaton {
    fn state_count(&self) -> usize;
    fn transition_count(&self) -> usize;

    /// Symbol labeling every transition into `state`; `None` for start states
    fn incoming(&self, state: Lr1) -> Option<Symbol>;

    /// Start nonterminal of the entry point `state` belongs to
    fn entrypoint(&self, state: Lr1) -> Option<Nonterminal>;

    fn items(&self, state: Lr1) -> &[Item];
    fn outgoing(&self, state: Lr1) -> &[Transition];
    fn transition(&self, transition: Transition) -> TransitionInfo;

    /// Whether `state` is a start state
    fn is_entry(&self, state: Lr1) -> bool {
        self.incoming(state).is_none()
    }

    /// The transition from `source` to `target`, if any
    fn find_transition(&self, source: Lr1, target: Lr1) -> Option<Transition> {
        self.outgoing(source)
            .iter()
            .copied()
            .find(|&tr| self.transition(tr).target == target)
    }
}

/// The lookahead-class refinement of the base automaton
///
/// The configurations of a state are contiguous: class `k` of state `s` is
/// `first_lrc(s) + k`.
pub trait LookaheadClasses {
    fn lrc_count(&self) -> usize;
    fn lr1_of(&self, lrc: Lrc) -> Lr1;
    fn class_index(&self, lrc: Lrc) -> usize;
    fn lookahead(&self, lrc: Lrc) -> &TerminalSet;
    fn predecessors(&self, lrc: Lrc) -> &LrcSet;
    fn first_lrc(&self, state: Lr1) -> Lrc;

    /// Class partition of the lookaheads of `state`
    fn classes(&self, state: Lr1) -> &[TerminalSet];

    /// Terminals `state` shifts
    fn shift_on(&self, state: Lr1) -> &TerminalSet;

    /// Terminals `state` rejects
    fn reject(&self, state: Lr1) -> &TerminalSet;

    fn lrc_of(&self, state: Lr1, class: usize) -> Lrc {
        Lrc::from_usize(self.first_lrc(state).as_usize() + class)
    }
}

/// The reachable-reduction graph
pub trait ReductionGraph {
    fn node_count(&self) -> usize;

    /// Initial node of every entry configuration
    fn initial(&self) -> &[(Lrc, Node)];

    fn config(&self, node: Node) -> &ViableConfig;
    fn transitions(&self, node: Node) -> &[ReachTransition];
    fn immediate_accept(&self, node: Node) -> &TerminalSet;
    fn immediate_reject(&self, node: Node) -> &TerminalSet;
    fn potential_reject_before(&self, node: Node) -> &TerminalSet;
    fn potential_reject_after(&self, node: Node) -> &TerminalSet;
}

/// Query side of the reachability cost tables
pub trait CostTables {
    fn leaf(&self, transition: Transition) -> TreeNode;
    fn split(&self, node: TreeNode) -> Split;
    fn pre_classes(&self, node: TreeNode) -> &[TerminalSet];
    fn post_classes(&self, node: TreeNode) -> &[TerminalSet];
    fn goto_equations(&self, transition: Transition) -> &GotoEquations;
    fn encode(&self, node: TreeNode, pre: usize, post: usize) -> Cell;
    fn cost(&self, cell: Cell) -> Cost;

    fn coercion(&self, from: &[TerminalSet], to: &[TerminalSet]) -> Coercion {
        Coercion::infix(from, to)
    }

    /// Cost of `(node, pre, post)` without keeping the encoded cell
    fn cell_cost(&self, node: TreeNode, pre: usize, post: usize) -> Cost {
        self.cost(self.encode(node, pre, post))
    }
}

/// Everything sentence generation reads
pub trait Upstream: Grammar + Automaton + LookaheadClasses + ReductionGraph + CostTables {}

impl<T> Upstream for T where T: Grammar + Automaton + LookaheadClasses + ReductionGraph + CostTables {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Idx;

    fn class(elements: &[usize]) -> TerminalSet {
        TerminalSet::from_iter_in(4, elements.iter().map(|&i| Terminal::new(i)))
    }

    #[test]
    fn coercion_relates_intersecting_classes() {
        let coarse = vec![class(&[0, 1]), class(&[2, 3])];
        let fine = vec![class(&[0]), class(&[1]), class(&[2]), class(&[3])];
        let coercion = Coercion::infix(&coarse, &fine);
        assert_eq!(coercion.forward[0].as_slice(), &[0, 1]);
        assert_eq!(coercion.forward[1].as_slice(), &[2, 3]);
        assert_eq!(coercion.backward, vec![Some(0), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn coercion_into_a_narrower_partition() {
        let wide = vec![class(&[0]), class(&[1]), class(&[2])];
        let shift = vec![class(&[1])];
        let coercion = Coercion::infix(&wide, &shift);
        assert!(coercion.forward[0].is_empty());
        assert_eq!(coercion.forward[1].as_slice(), &[0]);
        assert!(coercion.forward[2].is_empty());
        assert_eq!(coercion.backward, vec![Some(1)]);
    }
}
