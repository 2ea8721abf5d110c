//! # LRC Coverage
//!
//! Coverage analysis for LR(1) automata refined with lookahead classes.
//!
//! ## Overview
//!
//! Given a base LR(1) automaton, its lookahead-class refinement, the
//! reachable-reduction graph and the reachability cost tables, this crate
//! enumerates every (configuration, rejected lookahead) situation the parser
//! can reach and synthesizes, for each one, a short input sentence that drives
//! the parser into it. The corpus is meant for testing error messages and
//! error recovery: every way the parser can fail is exercised once.
//!
//! - **Reduction coverage** ([`reduction`]): first-touch trees over the
//!   reachable-reduction graph, for sizing and consistency checks
//! - **Lookahead coverage** ([`lookahead`]): the fixpoint traversal that
//!   finds every reachable rejection exactly once
//! - **Sentence synthesis** ([`form`], [`prefix`], [`word`], [`sentence`]):
//!   reduction path → stack layers → concrete configurations → terminals
//!
//! The upstream collaborators are read-only traits ([`upstream`]); [`Tables`]
//! implements all of them over owned vectors, and [`testing`] derives a
//! consistent set of tables from a small textual grammar.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lrc_coverage::testing::Fixture;
//! use lrc_coverage::{CoverageConfig, SentenceGenerator};
//!
//! let fixture = Fixture::build("S -> A B; A -> a; B -> b").expect("fixture");
//! let generator = SentenceGenerator::new(&fixture.tables, CoverageConfig::default());
//! let analysis = generator.analyze().expect("consistent tables");
//!
//! let mut corpus = Vec::new();
//! generator
//!     .write_corpus(&mut corpus, &analysis.sentences)
//!     .expect("write corpus");
//! print!("{}", String::from_utf8_lossy(&corpus));
//! ```
//!
//! ## Feature Flags
//!
//! - `serialize`: serde support for [`Tables`], [`Sentence`] and the statistics

pub mod bitset;
pub mod config;
pub mod error;
pub mod form;
pub mod index;
pub mod lookahead;
pub mod prefix;
pub mod reduction;
pub mod sentence;
pub mod suffix;
pub mod tables;
pub mod testing;
pub mod upstream;
pub mod word;

pub use bitset::{BitSet, LrcSet, TerminalSet};
pub use config::{CoverageConfig, Scheduling};
pub use error::{CoverageError, Result};
pub use index::{Idx, Lr1, Lrc, Node, Nonterminal, Production, Terminal};
pub use lookahead::{LookaheadCoverage, LookaheadStats};
pub use reduction::{ReductionCoverage, ReductionStats};
pub use sentence::{Analysis, Sentence, SentenceGenerator, analyze};
pub use tables::Tables;
pub use upstream::Upstream;
