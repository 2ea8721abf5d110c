//! Textual grammars.
//!
//! Rules are separated by `;`, alternatives by `|`, symbols by whitespace. A
//! name is a nonterminal if some rule defines it and a terminal otherwise; an
//! empty alternative is an ε-production. The first rule defines the start
//! symbol.
//!
//! The grammar is augmented: nonterminal `0` is the start symbol followed by
//! `'`, production `0` is `S' -> S`, and terminal `0` is the end of input `$`.

use super::FixtureError;
use crate::bitset::TerminalSet;
use crate::index::{Idx, Nonterminal, Production, Terminal, all};
use crate::tables::ProductionInfo;
use crate::upstream::Symbol;
use compact_str::{CompactString, format_compact};

/// Name of the end-of-input terminal
pub const END: &str = "$";

/// An augmented context-free grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSpec {
    pub terminals: Vec<CompactString>,
    pub nonterminals: Vec<CompactString>,
    pub productions: Vec<ProductionInfo>,
}

impl GrammarSpec {
    /// Parse a grammar such as `"S -> A B; A -> a; B -> b | "`
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::EmptyGrammar`] without rules,
    /// [`FixtureError::Syntax`] for a rule without `->` or with a malformed
    /// left-hand side, and [`FixtureError::ReservedName`] if `$` is used.
    pub fn parse(text: &str) -> Result<Self, FixtureError> {
        let mut rules = Vec::new();
        for rule in text.split(';').map(str::trim).filter(|rule| !rule.is_empty()) {
            let Some((lhs, rhs)) = rule.split_once("->") else {
                return Err(FixtureError::Syntax { rule: rule.into() });
            };
            let lhs = lhs.trim();
            if lhs.is_empty() || lhs.contains(char::is_whitespace) {
                return Err(FixtureError::Syntax { rule: rule.into() });
            }
            rules.push((lhs, rhs));
        }
        let Some(&(start, _)) = rules.first() else {
            return Err(FixtureError::EmptyGrammar);
        };

        let mut nonterminals = vec![format_compact!("{start}'")];
        for &(lhs, _) in &rules {
            if !nonterminals.iter().skip(1).any(|name| name == lhs) {
                nonterminals.push(lhs.into());
            }
        }
        let mut grammar = Self {
            terminals: vec![CompactString::const_new(END)],
            productions: vec![ProductionInfo {
                lhs: Nonterminal::new(0),
                rhs: vec![Symbol::Nonterminal(Nonterminal::new(1))],
            }],
            nonterminals,
        };

        for (lhs, alternatives) in rules {
            let lhs = grammar.nonterminal(lhs).ok_or_else(|| FixtureError::Syntax {
                rule: lhs.into(),
            })?;
            for alternative in alternatives.split('|') {
                let mut rhs = Vec::new();
                for name in alternative.split_whitespace() {
                    rhs.push(grammar.intern_symbol(name)?);
                }
                grammar.productions.push(ProductionInfo { lhs, rhs });
            }
        }
        Ok(grammar)
    }

    fn intern_symbol(&mut self, name: &str) -> Result<Symbol, FixtureError> {
        if name == END {
            return Err(FixtureError::ReservedName { name: name.into() });
        }
        if let Some(nonterminal) = self.nonterminal(name) {
            return Ok(Symbol::Nonterminal(nonterminal));
        }
        let terminal = self.terminal(name).unwrap_or_else(|| {
            self.terminals.push(name.into());
            Terminal::from_usize(self.terminals.len() - 1)
        });
        Ok(Symbol::Terminal(terminal))
    }

    /// The user start symbol, below the augmented one
    #[must_use]
    pub fn start(&self) -> Nonterminal {
        Nonterminal::new(1)
    }

    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<Terminal> {
        self.terminals
            .iter()
            .position(|terminal| terminal == name)
            .map(Terminal::from_usize)
    }

    /// Nonterminals defined by the user; the augmented start is not found by name
    #[must_use]
    pub fn nonterminal(&self, name: &str) -> Option<Nonterminal> {
        self.nonterminals
            .iter()
            .skip(1)
            .position(|nonterminal| nonterminal == name)
            .map(|index| Nonterminal::from_usize(index + 1))
    }

    /// Productions of `nonterminal`, in declaration order
    pub fn productions_of(&self, nonterminal: Nonterminal) -> impl Iterator<Item = Production> + '_ {
        all::<Production>(self.productions.len())
            .filter(move |&production| self.productions[production.index()].lhs == nonterminal)
    }

    #[must_use]
    pub fn rhs(&self, production: Production) -> &[Symbol] {
        &self.productions[production.index()].rhs
    }

    /// `lhs -> rhs` with names
    #[must_use]
    pub fn render(&self, production: Production) -> String {
        let info = &self.productions[production.index()];
        let mut text = format!("{} ->", self.nonterminals[info.lhs.index()]);
        for &symbol in &info.rhs {
            text.push(' ');
            text.push_str(self.symbol_name(symbol));
        }
        text
    }

    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(t) => &self.terminals[t.index()],
            Symbol::Nonterminal(n) => &self.nonterminals[n.index()],
        }
    }

    /// Nullable flag and FIRST set of every nonterminal
    #[must_use]
    pub fn first_sets(&self) -> FirstSets {
        let count = self.nonterminals.len();
        let mut sets = FirstSets {
            nullable: vec![false; count],
            first: vec![TerminalSet::empty(self.terminals.len()); count],
            universe: self.terminals.len(),
        };

        let mut changed = true;
        while changed {
            changed = false;
            for info in &self.productions {
                let lhs = info.lhs.index();
                let (first, nullable) = sets.first_of_sequence(&info.rhs);
                if sets.first[lhs].union_with(&first) {
                    changed = true;
                }
                if nullable && !sets.nullable[lhs] {
                    sets.nullable[lhs] = true;
                    changed = true;
                }
            }
        }
        sets
    }
}

/// FIRST sets and nullability, indexed by nonterminal
#[derive(Debug, Clone)]
pub struct FirstSets {
    pub nullable: Vec<bool>,
    pub first: Vec<TerminalSet>,
    universe: usize,
}

impl FirstSets {
    /// FIRST of a symbol sequence, and whether the whole sequence is nullable
    #[must_use]
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> (TerminalSet, bool) {
        let mut result = TerminalSet::empty(self.universe);
        for &symbol in symbols {
            match symbol {
                Symbol::Terminal(t) => {
                    result.insert(t);
                    return (result, false);
                }
                Symbol::Nonterminal(n) => {
                    result.union_with(&self.first[n.index()]);
                    if !self.nullable[n.index()] {
                        return (result, false);
                    }
                }
            }
        }
        (result, true)
    }

    /// FIRST(β a)
    #[must_use]
    pub fn first_followed_by(&self, symbols: &[Symbol], lookahead: Terminal) -> TerminalSet {
        let (mut first, nullable) = self.first_of_sequence(symbols);
        if nullable {
            first.insert(lookahead);
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_augments() {
        let grammar = GrammarSpec::parse("S -> A B; A -> a | ; B -> b").expect("grammar");
        assert_eq!(grammar.nonterminals, vec!["S'", "S", "A", "B"]);
        assert_eq!(grammar.terminals, vec!["$", "a", "b"]);
        assert_eq!(grammar.render(Production::new(0)), "S' -> S");
        assert_eq!(grammar.render(Production::new(1)), "S -> A B");
        assert_eq!(grammar.render(Production::new(3)), "A ->");
    }

    #[test]
    fn nullable_and_first() {
        let grammar = GrammarSpec::parse("S -> A B; A -> a | ; B -> b").expect("grammar");
        let sets = grammar.first_sets();
        let a = grammar.nonterminal("A").expect("A");
        let s = grammar.nonterminal("S").expect("S");
        assert!(sets.nullable[a.index()]);
        assert!(!sets.nullable[s.index()]);
        let names: Vec<_> = sets.first[s.index()]
            .iter()
            .map(|t| grammar.terminals[t.index()].as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(matches!(GrammarSpec::parse(" ; "), Err(FixtureError::EmptyGrammar)));
        assert!(matches!(GrammarSpec::parse("S a"), Err(FixtureError::Syntax { .. })));
        assert!(matches!(
            GrammarSpec::parse("S -> a $"),
            Err(FixtureError::ReservedName { .. })
        ));
    }
}
