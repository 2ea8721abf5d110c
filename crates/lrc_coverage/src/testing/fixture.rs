//! Consistent upstream tables derived from a grammar.
//!
//! ```text
//! grammar ──► canonical LR(1) ──► classes ──► cost tree ──► costs ──► predecessors ──► graph
//! ```
//!
//! - The start state has one class holding every terminal; every other state
//!   has one singleton class per terminal.
//! - The cost tree has a leaf per transition (leaf `i` is transition `i`) and
//!   one right-leaning join chain per right-hand side suffix reached from a
//!   goto source. Costs are the least fixpoint of the cell equations.
//! - `x` precedes `y` when the transition between their states has a finite
//!   cell from `x`'s class into `y`'s class. Predecessors are restricted to
//!   configurations reachable from the start configuration.
//! - Graph nodes are keyed by lookahead set, stack of states pushed since the
//!   entry, and frontier configurations below them.

use super::FixtureError;
use super::automaton::LrAutomaton;
use super::grammar::GrammarSpec;
use crate::bitset::{LrcSet, TerminalSet};
use crate::index::{Idx, Lr1, Lrc, Node, Nonterminal, Production, Terminal, Transition, TreeNode, all};
use crate::prefix::{PrefixIndex, Successors, predecessor_image};
use crate::tables::{LrcInfo, NodeInfo, StateInfo, Tables, TreeInfo};
use crate::upstream::{
    Automaton, CostTables, Cost, Equation, GotoEquations, LookaheadClasses, ReachTransition,
    Reduction, Split, Symbol, TransitionInfo, UNREACHABLE, ViableConfig,
};
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Largest reachable-reduction graph a fixture builds
pub const NODE_LIMIT: usize = 100_000;

/// A grammar, its automaton, and the upstream tables derived from them
#[derive(Debug, Clone)]
pub struct Fixture {
    pub automaton: LrAutomaton,
    pub tables: Tables,
}

impl Fixture {
    /// Parse `grammar` and derive every upstream table
    ///
    /// # Errors
    ///
    /// Returns any [`GrammarSpec::parse`] or [`LrAutomaton::build`] error, and
    /// [`FixtureError::GraphTooLarge`] past [`NODE_LIMIT`] graph nodes.
    pub fn build(grammar: &str) -> Result<Self, FixtureError> {
        let automaton = LrAutomaton::build(GrammarSpec::parse(grammar)?)?;
        let tables = TableBuilder::new(&automaton).build()?;
        log::debug!(
            "fixture: {} states, {} configurations, {} tree nodes, {} graph nodes",
            tables.states.len(),
            tables.lrcs.len(),
            tables.tree.len(),
            tables.nodes.len()
        );
        Ok(Self { automaton, tables })
    }

    #[must_use]
    pub fn start_state(&self) -> Lr1 {
        Lr1::new(0)
    }

    /// State reached from the start state by following `symbols`
    ///
    /// # Panics
    ///
    /// Panics if a name is unknown or a transition is missing.
    #[must_use]
    pub fn state_after(&self, symbols: &[&str]) -> Lr1 {
        symbols.iter().fold(self.start_state(), |state, &name| {
            let symbol = self.symbol(name);
            self.automaton
                .goto(state, symbol)
                .unwrap_or_else(|| panic!("no transition on `{name}` from {state:?}"))
        })
    }

    /// Configuration of `state` whose class holds `terminal`
    ///
    /// # Panics
    ///
    /// Panics if the terminal is unknown.
    #[must_use]
    pub fn lrc(&self, state: Lr1, terminal: &str) -> Lrc {
        let terminal = self.terminal(terminal);
        let class = self
            .tables
            .classes(state)
            .iter()
            .position(|class| class.contains(terminal))
            .unwrap_or_else(|| panic!("no class of {state:?} holds {terminal:?}"));
        self.tables.lrc_of(state, class)
    }

    /// # Panics
    ///
    /// Panics if no terminal is called `name`.
    #[must_use]
    pub fn terminal(&self, name: &str) -> Terminal {
        self.automaton
            .grammar
            .terminal(name)
            .unwrap_or_else(|| panic!("unknown terminal `{name}`"))
    }

    /// Terminals of a space-separated word
    ///
    /// # Panics
    ///
    /// Panics on an unknown terminal.
    #[must_use]
    pub fn word(&self, text: &str) -> Vec<Terminal> {
        text.split_whitespace().map(|name| self.terminal(name)).collect()
    }

    /// The production rendered as `text`, e.g. `"S -> A B"`
    ///
    /// # Panics
    ///
    /// Panics if no production renders that way.
    #[must_use]
    pub fn production(&self, text: &str) -> Production {
        let grammar = &self.automaton.grammar;
        all::<Production>(grammar.productions.len())
            .find(|&production| grammar.render(production) == text)
            .unwrap_or_else(|| panic!("unknown production `{text}`"))
    }

    fn symbol(&self, name: &str) -> Symbol {
        let grammar = &self.automaton.grammar;
        grammar
            .nonterminal(name)
            .map(Symbol::Nonterminal)
            .or_else(|| grammar.terminal(name).map(Symbol::Terminal))
            .unwrap_or_else(|| panic!("unknown symbol `{name}`"))
    }
}

struct TableBuilder<'a> {
    lr: &'a LrAutomaton,
    tables: Tables,
    edges: HashMap<(Lr1, Symbol), Transition, ahash::RandomState>,
    spans: HashMap<(Lr1, Production, usize), TreeNode, ahash::RandomState>,
    reachable: LrcSet,
}

impl<'a> TableBuilder<'a> {
    fn new(lr: &'a LrAutomaton) -> Self {
        Self {
            lr,
            tables: Tables::default(),
            edges: HashMap::with_hasher(ahash::RandomState::new()),
            spans: HashMap::with_hasher(ahash::RandomState::new()),
            reachable: LrcSet::default(),
        }
    }

    fn build(mut self) -> Result<Tables, FixtureError> {
        self.states();
        self.tree();
        self.costs();
        self.predecessors();
        self.graph()?;
        Ok(self.tables)
    }

    fn terminal_count(&self) -> usize {
        self.lr.terminal_count()
    }

    fn states(&mut self) {
        let lr = self.lr;
        let terminals = lr.terminal_count();
        self.tables.terminals = lr.grammar.terminals.clone();
        self.tables.nonterminals = lr.grammar.nonterminals.clone();
        self.tables.productions = lr.grammar.productions.clone();

        let mut first_lrc = 0;
        for state in all::<Lr1>(lr.state_count()) {
            let info = &lr.states[state.index()];
            let mut outgoing = Vec::with_capacity(info.transitions.len());
            for &(symbol, target) in &info.transitions {
                let transition = Transition::from_usize(self.tables.transitions.len());
                self.tables.transitions.push(TransitionInfo {
                    source: state,
                    target,
                    symbol,
                });
                self.edges.insert((state, symbol), transition);
                outgoing.push(transition);
            }

            let classes: Vec<TerminalSet> = if info.incoming.is_none() {
                vec![TerminalSet::full(terminals)]
            } else {
                all::<Terminal>(terminals)
                    .map(|terminal| TerminalSet::singleton(terminals, terminal))
                    .collect()
            };
            for class in 0..classes.len() {
                self.tables.lrcs.push(LrcInfo {
                    state,
                    class,
                    predecessors: LrcSet::default(),
                });
            }

            let mut shift_on = lr.shift_on(state);
            shift_on.union_with(&lr.accept_on(state));
            let class_count = classes.len();
            self.tables.states.push(StateInfo {
                incoming: info.incoming,
                entrypoint: Some(Nonterminal::new(0)),
                items: lr.core(state),
                outgoing,
                shift_on,
                reject: lr.reject_on(state),
                first_lrc: Lrc::from_usize(first_lrc),
                classes,
            });
            first_lrc += class_count;
        }
    }

    /// Leaves, then the spans and equations of every goto
    fn tree(&mut self) {
        let terminals = self.terminal_count();
        for index in 0..self.tables.transitions.len() {
            let info = self.tables.transitions[index];
            let pre = match info.symbol {
                Symbol::Terminal(terminal) => vec![TerminalSet::singleton(terminals, terminal)],
                Symbol::Nonterminal(_) => self.tables.states[info.source.index()].classes.clone(),
            };
            let post = self.tables.states[info.target.index()].classes.clone();
            self.tables.tree.push(TreeInfo {
                split: Split::Leaf(Transition::from_usize(index)),
                pre,
                post,
                offset: 0,
            });
        }

        let lr = self.lr;
        let mut equations = Vec::with_capacity(self.tables.transitions.len());
        for index in 0..self.tables.transitions.len() {
            let info = self.tables.transitions[index];
            let Symbol::Nonterminal(nonterminal) = info.symbol else {
                equations.push(GotoEquations::default());
                continue;
            };
            let mut goto = GotoEquations {
                nullable_lookaheads: TerminalSet::empty(terminals),
                ..GotoEquations::default()
            };
            for production in lr.grammar.productions_of(nonterminal) {
                let lookahead = lr.lookahead_of(info.source, production, 0);
                if lookahead.is_empty() {
                    continue;
                }
                if lr.grammar.rhs(production).is_empty() {
                    goto.nullable.push(production);
                    goto.nullable_lookaheads.union_with(&lookahead);
                } else {
                    let node = self.span(info.source, production, 0);
                    goto.non_nullable.push(Equation { node, lookahead });
                }
            }
            equations.push(goto);
        }
        self.tables.equations = equations;
        self.tables.layout_cells();
    }

    /// Tree node spanning `rhs[dot..]` of `production` from `state`
    fn span(&mut self, state: Lr1, production: Production, dot: usize) -> TreeNode {
        if let Some(&node) = self.spans.get(&(state, production, dot)) {
            return node;
        }
        let lr = self.lr;
        let rhs = lr.grammar.rhs(production);
        // Items advance along the automaton, so every symbol of the suffix has an edge.
        let transition = self.edges[&(state, rhs[dot])];
        let leaf = self.tables.leaf(transition);
        let node = if dot + 1 == rhs.len() {
            leaf
        } else {
            let target = self.tables.transitions[transition.index()].target;
            let right = self.span(target, production, dot + 1);
            let pre = self.tables.tree[leaf.index()].pre.clone();
            let post = self.tables.tree[right.index()].post.clone();
            self.tables.tree.push(TreeInfo {
                split: Split::Join(leaf, right),
                pre,
                post,
                offset: 0,
            });
            TreeNode::from_usize(self.tables.tree.len() - 1)
        };
        self.spans.insert((state, production, dot), node);
        node
    }

    fn costs(&mut self) {
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for node in all::<TreeNode>(self.tables.tree.len()) {
                let info = &self.tables.tree[node.index()];
                let (pre_count, post_count) = (info.pre.len(), info.post.len());
                for pre in 0..pre_count {
                    for post in 0..post_count {
                        let candidate = cell_candidate(&self.tables, node, pre, post);
                        let cell = self.tables.encode(node, pre, post).index();
                        if candidate < self.tables.costs[cell] {
                            self.tables.costs[cell] = candidate;
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        log::trace!("cost fixpoint after {rounds} rounds");
    }

    fn predecessors(&mut self) {
        let count = self.tables.lrcs.len();
        let mut predecessors = vec![LrcSet::empty(count); count];
        for transition in all::<Transition>(self.tables.transitions.len()) {
            let info = self.tables.transition(transition);
            let node = self.tables.leaf(transition);
            let coercion = self
                .tables
                .coercion(self.tables.classes(info.source), self.tables.pre_classes(node));
            for (class, pres) in coercion.forward.iter().enumerate() {
                let from = self.tables.lrc_of(info.source, class);
                for post in 0..self.tables.classes(info.target).len() {
                    let finite = pres
                        .iter()
                        .any(|&pre| self.tables.cell_cost(node, pre, post) != UNREACHABLE);
                    if finite {
                        predecessors[self.tables.lrc_of(info.target, post).index()].insert(from);
                    }
                }
            }
        }
        for (info, set) in self.tables.lrcs.iter_mut().zip(predecessors) {
            info.predecessors = set;
        }

        let successors = Successors::build(&self.tables);
        let prefixes = PrefixIndex::build(&self.tables, &successors);
        self.reachable = LrcSet::from_iter_in(
            count,
            all::<Lrc>(count).filter(|&lrc| prefixes.is_reachable(lrc)),
        );
        for info in &mut self.tables.lrcs {
            info.predecessors.intersect_with(&self.reachable);
        }
    }

    fn graph(&mut self) -> Result<(), FixtureError> {
        let lr = self.lr;
        let terminals = self.terminal_count();
        let lrc_count = self.tables.lrcs.len();
        let mut interner = NodeInterner::default();

        for lrc in self.reachable.iter() {
            let key = NodeKey {
                lookahead: self.tables.lookahead(lrc).clone(),
                stack: vec![self.tables.lr1_of(lrc)],
                frontier: self.tables.predecessors(lrc).clone(),
            };
            let node = interner.intern(key)?;
            self.tables.initial.push((lrc, node));
        }

        let mut nodes = Vec::new();
        while nodes.len() < interner.keys.len() {
            let key = interner.keys[nodes.len()].clone();
            let top = key.stack[key.stack.len() - 1];
            let mut transitions = Vec::new();

            for (production, reduce_on) in lr.reductions(top) {
                let lookahead = key.lookahead.intersection(&reduce_on);
                if lookahead.is_empty() {
                    continue;
                }
                let lhs = lr.grammar.productions[production.index()].lhs;
                let arity = lr.grammar.rhs(production).len();

                if arity < key.stack.len() {
                    let mut stack = key.stack[..key.stack.len() - arity].to_vec();
                    let Some(goto) = lr.goto_nonterminal(stack[stack.len() - 1], lhs) else {
                        continue;
                    };
                    stack.push(goto);
                    let target = interner.intern(NodeKey {
                        lookahead: lookahead.clone(),
                        stack,
                        frontier: key.frontier.clone(),
                    })?;
                    transitions.push(ReachTransition {
                        target,
                        reduction: Reduction {
                            production,
                            lookahead,
                        },
                        depth: 0,
                    });
                    continue;
                }

                let depth = arity - key.stack.len();
                let mut layer = key.frontier.clone();
                for _ in 0..depth {
                    layer = predecessor_image(&self.tables, &layer);
                }
                let mut groups: BTreeMap<Lr1, LrcSet> = BTreeMap::new();
                for lrc in layer.iter() {
                    if let Some(goto) = lr.goto_nonterminal(self.tables.lr1_of(lrc), lhs) {
                        groups
                            .entry(goto)
                            .or_insert_with(|| LrcSet::empty(lrc_count))
                            .insert(lrc);
                    }
                }
                for (goto, frontier) in groups {
                    let target = interner.intern(NodeKey {
                        lookahead: lookahead.clone(),
                        stack: vec![goto],
                        frontier,
                    })?;
                    transitions.push(ReachTransition {
                        target,
                        reduction: Reduction {
                            production,
                            lookahead: lookahead.clone(),
                        },
                        depth,
                    });
                }
            }

            let mut accept = lr.shift_on(top);
            accept.union_with(&lr.accept_on(top));
            accept.intersect_with(&key.lookahead);
            nodes.push(NodeInfo {
                config: ViableConfig {
                    top,
                    lrcs: key.frontier,
                },
                transitions,
                accept,
                reject: lr.reject_on(top).intersection(&key.lookahead),
                before: TerminalSet::empty(terminals),
                after: TerminalSet::empty(terminals),
            });
        }

        potential_rejections(&mut nodes, terminals);
        self.tables.nodes = nodes;
        Ok(())
    }
}

/// Cost of a cell given the current costs of the cells it depends on
fn cell_candidate(tables: &Tables, node: TreeNode, pre: usize, post: usize) -> Cost {
    match tables.split(node) {
        Split::Leaf(transition) => match tables.transition(transition).symbol {
            Symbol::Terminal(_) => 1,
            Symbol::Nonterminal(_) => goto_candidate(tables, node, transition, pre, post),
        },
        Split::Join(left, right) => {
            let coercion = tables.coercion(tables.post_classes(left), tables.pre_classes(right));
            let mut best = UNREACHABLE;
            for (middle_left, candidates) in coercion.forward.iter().enumerate() {
                let left_cost = tables.cell_cost(left, pre, middle_left);
                if left_cost == UNREACHABLE {
                    continue;
                }
                for &middle_right in candidates {
                    let right_cost = tables.cell_cost(right, middle_right, post);
                    if right_cost != UNREACHABLE {
                        best = best.min(left_cost.saturating_add(right_cost));
                    }
                }
            }
            best
        }
    }
}

fn goto_candidate(tables: &Tables, node: TreeNode, transition: Transition, pre: usize, post: usize) -> Cost {
    let equations = tables.goto_equations(transition);
    let pre_classes = tables.pre_classes(node);
    let post_classes = tables.post_classes(node);
    let post_class = &post_classes[post];

    if !equations.nullable.is_empty()
        && post_class.is_subset(&equations.nullable_lookaheads)
        && !post_class.is_disjoint(&pre_classes[pre])
    {
        return 0;
    }

    let mut best = UNREACHABLE;
    for equation in equations
        .non_nullable
        .iter()
        .filter(|equation| post_class.is_subset(&equation.lookahead))
    {
        let pre_map = tables.coercion(pre_classes, tables.pre_classes(equation.node));
        let post_map = tables.coercion(post_classes, tables.post_classes(equation.node));
        for &inner_pre in &pre_map.forward[pre] {
            for &inner_post in &post_map.forward[post] {
                best = best.min(tables.cell_cost(equation.node, inner_pre, inner_post));
            }
        }
    }
    best
}

/// `before = reject ∪ after`, `after = ⋃ before(successor)`, to a fixpoint
fn potential_rejections(nodes: &mut [NodeInfo], terminals: usize) {
    let mut changed = true;
    while changed {
        changed = false;
        for index in (0..nodes.len()).rev() {
            let mut after = TerminalSet::empty(terminals);
            for transition in &nodes[index].transitions {
                after.union_with(&nodes[transition.target.index()].before);
            }
            let before = nodes[index].reject.union(&after);
            let node = &mut nodes[index];
            if after != node.after || before != node.before {
                node.after = after;
                node.before = before;
                changed = true;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    lookahead: TerminalSet,
    /// States pushed since the frontier, the top last
    stack: Vec<Lr1>,
    frontier: LrcSet,
}

#[derive(Default)]
struct NodeInterner {
    index: HashMap<NodeKey, Node, ahash::RandomState>,
    keys: Vec<NodeKey>,
}

impl NodeInterner {
    fn intern(&mut self, key: NodeKey) -> Result<Node, FixtureError> {
        if let Some(&node) = self.index.get(&key) {
            return Ok(node);
        }
        if self.keys.len() >= NODE_LIMIT {
            return Err(FixtureError::GraphTooLarge { limit: NODE_LIMIT });
        }
        let node = Node::from_usize(self.keys.len());
        self.index.insert(key.clone(), node);
        self.keys.push(key);
        Ok(node)
    }
}
