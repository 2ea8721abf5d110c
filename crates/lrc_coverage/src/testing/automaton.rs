//! Canonical LR(1) construction.
//!
//! States are closed item sets keyed by their sorted items; no two states share
//! a closure. States are numbered breadth-first from the start state, and the
//! transitions of a state are explored in symbol order (terminals first), so
//! numbering only depends on the grammar text.

use super::FixtureError;
use super::grammar::{FirstSets, GrammarSpec};
use crate::bitset::TerminalSet;
use crate::index::{Idx, Lr1, Nonterminal, Production, Terminal, all};
use crate::upstream::{Item, Symbol};
use hashbrown::{HashMap, HashSet};
use std::collections::BTreeMap;

/// `[production, dot, lookahead]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LrItem {
    pub production: Production,
    pub dot: usize,
    pub lookahead: Terminal,
}

impl LrItem {
    #[must_use]
    pub const fn new(production: Production, dot: usize, lookahead: Terminal) -> Self {
        Self {
            production,
            dot,
            lookahead,
        }
    }
}

/// Parser action of a state on a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(Lr1),
    Reduce(Production),
    Accept,
    Error,
}

#[derive(Debug, Clone)]
pub struct LrState {
    /// Closed item set, sorted
    pub items: Vec<LrItem>,
    pub incoming: Option<Symbol>,
    /// Outgoing edges, sorted by symbol
    pub transitions: Vec<(Symbol, Lr1)>,
}

/// A canonical LR(1) automaton with its action table
#[derive(Debug, Clone)]
pub struct LrAutomaton {
    pub grammar: GrammarSpec,
    pub first: FirstSets,
    pub states: Vec<LrState>,
    /// `actions[state][terminal]`
    pub actions: Vec<Vec<Action>>,
}

impl LrAutomaton {
    /// Build the automaton and its action table
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Conflict`] if some state has two actions on one
    /// terminal.
    pub fn build(grammar: GrammarSpec) -> Result<Self, FixtureError> {
        let first = grammar.first_sets();
        let mut automaton = Self {
            grammar,
            first,
            states: Vec::new(),
            actions: Vec::new(),
        };
        automaton.build_states();
        automaton.build_actions()?;
        Ok(automaton)
    }

    fn build_states(&mut self) {
        let mut state_map: HashMap<Vec<LrItem>, Lr1, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());

        let initial = self.closure(vec![LrItem::new(Production::new(0), 0, Terminal::new(0))]);
        state_map.insert(initial.clone(), Lr1::new(0));
        self.states.push(LrState {
            items: initial,
            incoming: None,
            transitions: Vec::new(),
        });

        let mut index = 0;
        while index < self.states.len() {
            let transitions = self.compute_transitions(&self.states[index].items);
            let mut edges = Vec::with_capacity(transitions.len());
            for (symbol, kernel) in transitions {
                let items = self.closure(kernel);
                let target = match state_map.get(&items) {
                    Some(&target) => target,
                    None => {
                        let target = Lr1::from_usize(self.states.len());
                        state_map.insert(items.clone(), target);
                        self.states.push(LrState {
                            items,
                            incoming: Some(symbol),
                            transitions: Vec::new(),
                        });
                        target
                    }
                };
                edges.push((symbol, target));
            }
            self.states[index].transitions = edges;
            index += 1;
        }
    }

    /// Close a kernel: `[A -> α . B β, a]` adds `[B -> . γ, b]` for every `b`
    /// in FIRST(β a)
    fn closure(&self, kernel: Vec<LrItem>) -> Vec<LrItem> {
        let mut closure: HashSet<LrItem> = kernel.into_iter().collect();
        let mut changed = true;

        while changed {
            changed = false;
            let mut items_to_add = Vec::new();

            for item in &closure {
                let rhs = self.grammar.rhs(item.production);
                let Some(&Symbol::Nonterminal(next)) = rhs.get(item.dot) else {
                    continue;
                };
                let lookaheads = self
                    .first
                    .first_followed_by(&rhs[item.dot + 1..], item.lookahead);
                for production in self.grammar.productions_of(next) {
                    for lookahead in lookaheads.iter() {
                        let new_item = LrItem::new(production, 0, lookahead);
                        if !closure.contains(&new_item) {
                            items_to_add.push(new_item);
                        }
                    }
                }
            }

            for item in items_to_add {
                if closure.insert(item) {
                    changed = true;
                }
            }
        }

        let mut items: Vec<LrItem> = closure.into_iter().collect();
        items.sort_unstable();
        items
    }

    /// Kernels reached by advancing the dot, per symbol
    fn compute_transitions(&self, closure: &[LrItem]) -> BTreeMap<Symbol, Vec<LrItem>> {
        let mut transitions: BTreeMap<Symbol, Vec<LrItem>> = BTreeMap::new();
        for item in closure {
            if let Some(&symbol) = self.grammar.rhs(item.production).get(item.dot) {
                transitions
                    .entry(symbol)
                    .or_default()
                    .push(LrItem::new(item.production, item.dot + 1, item.lookahead));
            }
        }
        transitions
    }

    fn build_actions(&mut self) -> Result<(), FixtureError> {
        let terminals = self.grammar.terminals.len();
        for state in all::<Lr1>(self.states.len()) {
            let mut row = vec![Action::Error; terminals];
            for &(symbol, target) in &self.states[state.index()].transitions {
                if let Symbol::Terminal(terminal) = symbol {
                    row[terminal.index()] = Action::Shift(target);
                }
            }
            for item in &self.states[state.index()].items {
                if item.dot < self.grammar.rhs(item.production).len() {
                    continue;
                }
                let action = if item.production.index() == 0 {
                    Action::Accept
                } else {
                    Action::Reduce(item.production)
                };
                let slot = &mut row[item.lookahead.index()];
                let current = *slot;
                match current {
                    Action::Error => *slot = action,
                    _ if current == action => {}
                    _ => {
                        return Err(FixtureError::Conflict {
                            state,
                            terminal: self.grammar.terminals[item.lookahead.index()].clone(),
                        });
                    }
                }
            }
            self.actions.push(row);
        }
        Ok(())
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.grammar.terminals.len()
    }

    #[must_use]
    pub fn action(&self, state: Lr1, terminal: Terminal) -> Action {
        self.actions[state.index()][terminal.index()]
    }

    /// Target of the transition labeled `symbol`
    #[must_use]
    pub fn goto(&self, state: Lr1, symbol: Symbol) -> Option<Lr1> {
        self.states[state.index()]
            .transitions
            .iter()
            .find(|&&(label, _)| label == symbol)
            .map(|&(_, target)| target)
    }

    #[must_use]
    pub fn goto_nonterminal(&self, state: Lr1, nonterminal: Nonterminal) -> Option<Lr1> {
        self.goto(state, Symbol::Nonterminal(nonterminal))
    }

    /// Terminals with a shift action
    #[must_use]
    pub fn shift_on(&self, state: Lr1) -> TerminalSet {
        self.terminals_where(state, |action| matches!(action, Action::Shift(_)))
    }

    /// Terminals on which the input is accepted
    #[must_use]
    pub fn accept_on(&self, state: Lr1) -> TerminalSet {
        self.terminals_where(state, |action| action == Action::Accept)
    }

    /// Terminals with no action
    #[must_use]
    pub fn reject_on(&self, state: Lr1) -> TerminalSet {
        self.terminals_where(state, |action| action == Action::Error)
    }

    fn terminals_where(&self, state: Lr1, predicate: impl Fn(Action) -> bool) -> TerminalSet {
        TerminalSet::from_iter_in(
            self.terminal_count(),
            self.actions[state.index()]
                .iter()
                .enumerate()
                .filter(|&(_, &action)| predicate(action))
                .map(|(terminal, _)| Terminal::from_usize(terminal)),
        )
    }

    /// Productions reduced in `state`, with their lookaheads, in production order
    #[must_use]
    pub fn reductions(&self, state: Lr1) -> Vec<(Production, TerminalSet)> {
        let mut reductions: BTreeMap<Production, TerminalSet> = BTreeMap::new();
        for (terminal, action) in self.actions[state.index()].iter().enumerate() {
            if let Action::Reduce(production) = *action {
                reductions
                    .entry(production)
                    .or_insert_with(|| TerminalSet::empty(self.terminal_count()))
                    .insert(Terminal::from_usize(terminal));
            }
        }
        reductions.into_iter().collect()
    }

    /// Lookaheads of the items `[production, dot, _]` of `state`
    #[must_use]
    pub fn lookahead_of(&self, state: Lr1, production: Production, dot: usize) -> TerminalSet {
        TerminalSet::from_iter_in(
            self.terminal_count(),
            self.states[state.index()]
                .items
                .iter()
                .filter(|item| item.production == production && item.dot == dot)
                .map(|item| item.lookahead),
        )
    }

    /// LR(0) core of `state`, sorted and deduplicated
    #[must_use]
    pub fn core(&self, state: Lr1) -> Vec<Item> {
        let mut items: Vec<Item> = self.states[state.index()]
            .items
            .iter()
            .map(|item| Item {
                production: item.production,
                dot: u32::try_from(item.dot).unwrap_or(u32::MAX),
            })
            .collect();
        items.dedup();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn automaton(text: &str) -> LrAutomaton {
        LrAutomaton::build(GrammarSpec::parse(text).expect("grammar")).expect("automaton")
    }

    #[test]
    fn states_are_numbered_breadth_first() {
        let lr = automaton("S -> A B; A -> a; B -> b");
        assert_eq!(lr.state_count(), 6);
        let a = Symbol::Terminal(lr.grammar.terminal("a").expect("a"));
        let b = Symbol::Terminal(lr.grammar.terminal("b").expect("b"));
        let s = Symbol::Nonterminal(lr.grammar.nonterminal("S").expect("S"));
        let big_a = Symbol::Nonterminal(lr.grammar.nonterminal("A").expect("A"));
        let big_b = Symbol::Nonterminal(lr.grammar.nonterminal("B").expect("B"));
        let start = Lr1::new(0);
        assert_eq!(lr.goto(start, a), Some(Lr1::new(1)));
        assert_eq!(lr.goto(start, s), Some(Lr1::new(2)));
        assert_eq!(lr.goto(start, big_a), Some(Lr1::new(3)));
        assert_eq!(lr.goto(Lr1::new(3), b), Some(Lr1::new(4)));
        assert_eq!(lr.goto(Lr1::new(3), big_b), Some(Lr1::new(5)));
    }

    #[test]
    fn actions_partition_the_terminals() {
        let lr = automaton("S -> A B; A -> a; B -> b");
        let b = lr.grammar.terminal("b").expect("b");
        let reductions = lr.reductions(Lr1::new(1));
        assert_eq!(reductions.len(), 1);
        assert_eq!(reductions[0].1, TerminalSet::singleton(3, b));
        assert_eq!(lr.reject_on(Lr1::new(1)).len(), 2);
        assert_eq!(lr.accept_on(Lr1::new(2)), TerminalSet::singleton(3, Terminal::new(0)));
        assert!(lr.shift_on(Lr1::new(2)).is_empty());
    }

    #[test]
    fn item_lookaheads() {
        let lr = automaton("S -> A B; A -> a; B -> b");
        let a_production = Production::new(2);
        let b = lr.grammar.terminal("b").expect("b");
        assert_eq!(
            lr.lookahead_of(Lr1::new(0), a_production, 0),
            TerminalSet::singleton(3, b)
        );
        assert_eq!(lr.core(Lr1::new(0)).len(), 3);
    }

    #[test]
    fn ambiguous_grammar_conflicts() {
        let grammar = GrammarSpec::parse("E -> E p E | x").expect("grammar");
        assert!(matches!(
            LrAutomaton::build(grammar),
            Err(FixtureError::Conflict { .. })
        ));
    }
}
