//! # Owned Tables
//!
//! [`Tables`] holds every upstream collaborator in plain vectors and
//! implements all of the read-only traits over them. Behind the `serialize`
//! feature the whole structure round-trips through JSON, so tables computed by
//! an external generator can be loaded without linking it.

use crate::bitset::{LrcSet, TerminalSet};
use crate::index::{Cell, Idx, Lr1, Lrc, Node, Nonterminal, Production, Terminal, Transition, TreeNode};
use crate::upstream::{
    Automaton, CostTables, Cost, GotoEquations, Grammar, Item, LookaheadClasses, ReachTransition,
    ReductionGraph, Split, Symbol, TransitionInfo, UNREACHABLE, ViableConfig,
};
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ProductionInfo {
    pub lhs: Nonterminal,
    pub rhs: Vec<Symbol>,
}

/// A base state, with its lookahead-class partition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StateInfo {
    pub incoming: Option<Symbol>,
    pub entrypoint: Option<Nonterminal>,
    pub items: Vec<Item>,
    pub outgoing: Vec<Transition>,
    pub shift_on: TerminalSet,
    pub reject: TerminalSet,
    pub first_lrc: Lrc,
    pub classes: Vec<TerminalSet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LrcInfo {
    pub state: Lr1,
    pub class: usize,
    pub predecessors: LrcSet,
}

/// A reachable-reduction node
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NodeInfo {
    pub config: ViableConfig,
    pub transitions: Vec<ReachTransition>,
    pub accept: TerminalSet,
    pub reject: TerminalSet,
    pub before: TerminalSet,
    pub after: TerminalSet,
}

/// A cost-tree node and the position of its cells
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TreeInfo {
    pub split: Split,
    pub pre: Vec<TerminalSet>,
    pub post: Vec<TerminalSet>,
    /// Index of the node's first cell
    pub offset: usize,
}

impl TreeInfo {
    /// Number of cells of the node
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.pre.len() * self.post.len()
    }
}

/// Every upstream table, owned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Tables {
    pub terminals: Vec<CompactString>,
    pub nonterminals: Vec<CompactString>,
    pub productions: Vec<ProductionInfo>,
    pub states: Vec<StateInfo>,
    pub transitions: Vec<TransitionInfo>,
    pub lrcs: Vec<LrcInfo>,
    pub initial: Vec<(Lrc, Node)>,
    pub nodes: Vec<NodeInfo>,
    /// Cost-tree nodes; the leaf of transition `i` is node `i`
    pub tree: Vec<TreeInfo>,
    /// Indexed by transition; empty for shifts
    pub equations: Vec<GotoEquations>,
    pub costs: Vec<Cost>,
}

impl Tables {
    /// Recompute cell offsets after the tree changed, resizing the cost vector
    pub fn layout_cells(&mut self) {
        let mut offset = 0;
        for info in &mut self.tree {
            info.offset = offset;
            offset += info.cell_count();
        }
        self.costs.resize(offset, UNREACHABLE);
    }

    #[cfg(feature = "serialize")]
    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoverageError::Json`] if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[cfg(feature = "serialize")]
    /// Deserialize from JSON
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoverageError::Json`] if the input is malformed.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Grammar for Tables {
    fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    fn production_count(&self) -> usize {
        self.productions.len()
    }

    fn terminal_name(&self, terminal: Terminal) -> &str {
        &self.terminals[terminal.index()]
    }

    fn nonterminal_name(&self, nonterminal: Nonterminal) -> &str {
        &self.nonterminals[nonterminal.index()]
    }

    fn lhs(&self, production: Production) -> Nonterminal {
        self.productions[production.index()].lhs
    }

    fn rhs(&self, production: Production) -> &[Symbol] {
        &self.productions[production.index()].rhs
    }
}

impl Automaton for Tables {
    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    fn incoming(&self, state: Lr1) -> Option<Symbol> {
        self.states[state.index()].incoming
    }

    fn entrypoint(&self, state: Lr1) -> Option<Nonterminal> {
        self.states[state.index()].entrypoint
    }

    fn items(&self, state: Lr1) -> &[Item] {
        &self.states[state.index()].items
    }

    fn outgoing(&self, state: Lr1) -> &[Transition] {
        &self.states[state.index()].outgoing
    }

    fn transition(&self, transition: Transition) -> TransitionInfo {
        self.transitions[transition.index()]
    }
}

impl LookaheadClasses for Tables {
    fn lrc_count(&self) -> usize {
        self.lrcs.len()
    }

    fn lr1_of(&self, lrc: Lrc) -> Lr1 {
        self.lrcs[lrc.index()].state
    }

    fn class_index(&self, lrc: Lrc) -> usize {
        self.lrcs[lrc.index()].class
    }

    fn lookahead(&self, lrc: Lrc) -> &TerminalSet {
        let info = &self.lrcs[lrc.index()];
        &self.states[info.state.index()].classes[info.class]
    }

    fn predecessors(&self, lrc: Lrc) -> &LrcSet {
        &self.lrcs[lrc.index()].predecessors
    }

    fn first_lrc(&self, state: Lr1) -> Lrc {
        self.states[state.index()].first_lrc
    }

    fn classes(&self, state: Lr1) -> &[TerminalSet] {
        &self.states[state.index()].classes
    }

    fn shift_on(&self, state: Lr1) -> &TerminalSet {
        &self.states[state.index()].shift_on
    }

    fn reject(&self, state: Lr1) -> &TerminalSet {
        &self.states[state.index()].reject
    }
}

impl ReductionGraph for Tables {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn initial(&self) -> &[(Lrc, Node)] {
        &self.initial
    }

    fn config(&self, node: Node) -> &ViableConfig {
        &self.nodes[node.index()].config
    }

    fn transitions(&self, node: Node) -> &[ReachTransition] {
        &self.nodes[node.index()].transitions
    }

    fn immediate_accept(&self, node: Node) -> &TerminalSet {
        &self.nodes[node.index()].accept
    }

    fn immediate_reject(&self, node: Node) -> &TerminalSet {
        &self.nodes[node.index()].reject
    }

    fn potential_reject_before(&self, node: Node) -> &TerminalSet {
        &self.nodes[node.index()].before
    }

    fn potential_reject_after(&self, node: Node) -> &TerminalSet {
        &self.nodes[node.index()].after
    }
}

impl CostTables for Tables {
    fn leaf(&self, transition: Transition) -> TreeNode {
        TreeNode::from_usize(transition.index())
    }

    fn split(&self, node: TreeNode) -> Split {
        self.tree[node.index()].split
    }

    fn pre_classes(&self, node: TreeNode) -> &[TerminalSet] {
        &self.tree[node.index()].pre
    }

    fn post_classes(&self, node: TreeNode) -> &[TerminalSet] {
        &self.tree[node.index()].post
    }

    fn goto_equations(&self, transition: Transition) -> &GotoEquations {
        &self.equations[transition.index()]
    }

    fn encode(&self, node: TreeNode, pre: usize, post: usize) -> Cell {
        let info = &self.tree[node.index()];
        Cell::from_usize(info.offset + pre * info.post.len() + post)
    }

    fn cost(&self, cell: Cell) -> Cost {
        self.costs.get(cell.index()).copied().unwrap_or(UNREACHABLE)
    }
}
