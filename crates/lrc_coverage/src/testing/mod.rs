//! # Testing Utilities
//!
//! Upstream tables are normally produced by a parser generator. This module
//! derives a complete and internally consistent set of them from a small
//! textual grammar, so the analysis can be exercised end to end:
//!
//! - [`GrammarSpec`]: `"S -> A B; A -> a; B -> b | "` style grammars
//! - [`LrAutomaton`]: canonical LR(1) construction
//! - [`Fixture`]: lookahead classes, cost tables and the reachable-reduction graph
//! - [`simulate`]: an LR driver to replay synthesized sentences
//! - [`GraphBuilder`]: hand-made reachable-reduction graphs for explorer tests
//!
//! None of this is meant for production grammars: lookahead classes are
//! singletons outside the start state, and the reachable-reduction graph is
//! unfolded node by node.

pub mod automaton;
pub mod fixture;
pub mod grammar;
pub mod graph;
pub mod simulate;

pub use automaton::{Action, LrAutomaton, LrItem};
pub use fixture::Fixture;
pub use grammar::GrammarSpec;
pub use graph::GraphBuilder;

use crate::index::Lr1;
use compact_str::CompactString;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("grammar has no rule")]
    EmptyGrammar,

    #[error("malformed rule `{rule}`")]
    Syntax { rule: String },

    #[error("`{name}` is reserved for the end of input")]
    ReservedName { name: CompactString },

    #[error("conflict in state {state:?} on `{terminal}`")]
    Conflict { state: Lr1, terminal: CompactString },

    #[error("reachable-reduction graph exceeds {limit} nodes")]
    GraphTooLarge { limit: usize },

    #[error("parser stuck at position {position} in state {state:?}")]
    Stuck { position: usize, state: Lr1 },
}
