//! # Sentence Assembly
//!
//! Drives the pipeline for every coverage leaf: the reduction path is turned
//! into stack layers, the layers into one concrete configuration per frame,
//! the configurations into the shortest word that builds them.
//!
//! ## Cross-validation
//!
//! Stack layers are built twice:
//!
//! 1. by replaying the path through a [`Form`];
//! 2. by [`direct_layers`], which reads each node's own configuration set and
//!    expands predecessors explicitly when a reduction pops below the frontier.
//!
//! Both are collapsed and reconstructed independently and the two words must
//! be identical.

use crate::bitset::{LrcSet, TerminalSet};
use crate::config::{CoverageConfig, Scheduling};
use crate::error::{CoverageError, Result};
use crate::form::Form;
use crate::index::{Lr1, Lrc, Terminal};
use crate::lookahead::{LookaheadCoverage, LookaheadStats};
use crate::prefix::{PrefixIndex, Successors, predecessor_image};
use crate::reduction::{ReductionCoverage, ReductionStats};
use crate::suffix::Suffix;
use crate::upstream::{Item, LookaheadClasses, ReductionGraph, Upstream};
use crate::word::word_of_configs;
use compact_str::CompactString;
use std::io::Write;

/// One synthesized sentence
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Sentence {
    /// Start symbol the sentence is parsed from, without the augmentation marker
    pub entrypoint: CompactString,
    /// Word built from the replayed form
    pub word: Vec<Terminal>,
    /// Word built from the node bookkeeping, when cross-validation is enabled
    pub audit_word: Option<Vec<Terminal>>,
    /// Terminals the parser rejects after reading `word`
    pub rejected: TerminalSet,
    /// Configuration of every stack frame, deepest first
    pub stack: Vec<Lrc>,
    /// Top state of every node along the reduction path
    pub tops: Vec<Lr1>,
}

/// Everything one analysis run produces
#[derive(Debug, Clone)]
pub struct Analysis {
    pub reduction: ReductionStats,
    pub lookahead: LookaheadStats,
    pub sentences: Vec<Sentence>,
}

/// Layers of a reduction path read from the nodes' own configuration sets
///
/// # Errors
///
/// Returns [`CoverageError::ReduceOutsideTop`] if a node's configurations do
/// not fit the layer its reduction exposes, and [`CoverageError::EmptyNarrowing`]
/// if the upward propagation empties a layer.
pub fn direct_layers<U>(upstream: &U, successors: &Successors, suffix: &Suffix) -> Result<Vec<LrcSet>>
where
    U: LookaheadClasses + ReductionGraph + ?Sized,
{
    let entry = suffix.entry();
    let mut layers = vec![
        upstream.predecessors(entry).clone(),
        LrcSet::singleton(upstream.lrc_count(), entry),
    ];

    for step in suffix.steps() {
        let lrcs = &upstream.config(step.node).lrcs;
        // A step that neither pops below the frontier nor narrows it leaves every layer as is.
        if step.depth == 0 && *lrcs == layers[0] {
            continue;
        }
        let mut exposed = Vec::with_capacity(step.depth);
        if step.depth > 0 {
            let mut below = predecessor_image(upstream, &layers[0]);
            for _ in 1..step.depth {
                let next = predecessor_image(upstream, &below);
                exposed.push(below);
                below = next;
            }
            exposed.push(below);
            exposed.reverse();
        }

        let bottom = exposed.first().unwrap_or(&layers[0]);
        if !lrcs.is_subset(bottom) {
            return Err(CoverageError::ReduceOutsideTop {
                production: step.production,
                lrcs: lrcs.clone(),
                stack: layers,
                pop_buffer: exposed,
                pending_push: 0,
            });
        }

        exposed.append(&mut layers);
        layers = exposed;
        layers[0] = lrcs.clone();
        for layer in 1..layers.len() {
            let narrowed = layers[layer].intersection(&successors.image(&layers[layer - 1]));
            if narrowed.is_empty() {
                return Err(CoverageError::EmptyNarrowing {
                    layer,
                    below: layers[layer - 1].clone(),
                    above: layers[layer].clone(),
                });
            }
            layers[layer] = narrowed;
        }
    }

    if layers.first().is_some_and(LrcSet::is_empty) {
        layers.remove(0);
    }
    Ok(layers)
}

/// Pick one configuration per layer, left to right, and prepend the prefix of
/// the first choice
///
/// # Errors
///
/// Returns [`CoverageError::UnreachableConfiguration`] if no configuration of
/// the bottom layer has a prefix, and [`CoverageError::EmptyLayer`] if a layer
/// holds no successor of the previous choice.
pub fn collapse_layers(
    prefixes: &PrefixIndex,
    successors: &Successors,
    layers: &[LrcSet],
) -> Result<Vec<Lrc>> {
    let Some((bottom, rest)) = layers.split_first() else {
        return Ok(Vec::new());
    };
    let (mut choice, prefix) = bottom
        .iter()
        .find_map(|lrc| prefixes.prefix(lrc).map(|prefix| (lrc, prefix)))
        .ok_or_else(|| CoverageError::UnreachableConfiguration {
            candidates: bottom.clone(),
        })?;

    let mut configs: Vec<Lrc> = prefix.iter().rev().copied().collect();
    configs.push(choice);
    for (offset, layer) in rest.iter().enumerate() {
        choice = layer
            .intersection(successors.of(choice))
            .first()
            .ok_or_else(|| CoverageError::EmptyLayer {
                layer: offset + 1,
                previous: choice,
                candidates: layer.clone(),
            })?;
        configs.push(choice);
    }
    Ok(configs)
}

/// Turns coverage leaves into sentences
#[derive(Debug)]
pub struct SentenceGenerator<'a, U: ?Sized> {
    upstream: &'a U,
    config: CoverageConfig,
    successors: Successors,
    prefixes: PrefixIndex,
}

impl<'a, U: Upstream + ?Sized> SentenceGenerator<'a, U> {
    /// Index the configurations of `upstream` for sentence synthesis
    #[must_use]
    pub fn new(upstream: &'a U, config: CoverageConfig) -> Self {
        let successors = Successors::build(upstream);
        let prefixes = PrefixIndex::build(upstream, &successors);
        Self {
            upstream,
            config,
            successors,
            prefixes,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CoverageConfig {
        &self.config
    }

    #[must_use]
    pub const fn prefixes(&self) -> &PrefixIndex {
        &self.prefixes
    }

    #[must_use]
    pub const fn successors(&self) -> &Successors {
        &self.successors
    }

    /// Run both explorers and synthesize a sentence for every leaf
    ///
    /// # Errors
    ///
    /// Any schedule mismatch, upstream inconsistency or strategy mismatch.
    pub fn analyze(&self) -> Result<Analysis> {
        let scheduling = self.config.scheduling;
        let reduction = if self.config.check_schedules {
            let (dfs, bfs) = ReductionCoverage::check_schedules(self.upstream)?;
            let (chosen, other) = match scheduling {
                Scheduling::Dfs => (dfs, bfs),
                Scheduling::Bfs => (bfs, dfs),
            };
            log::info!(
                "reduction coverage: {} sentences, average depth {:.2} ({scheduling:?}) / {:.2} ({:?})",
                chosen.sentences,
                chosen.average_depth(),
                other.average_depth(),
                scheduling.other()
            );
            chosen
        } else {
            ReductionCoverage::explore(self.upstream, scheduling).stats()
        };

        if self.config.check_schedules {
            LookaheadCoverage::check_schedules(self.upstream)?;
        }
        let coverage = LookaheadCoverage::explore(self.upstream, scheduling);
        let lookahead = coverage.measure_lookaheads()?;
        let sentences = self.generate(&coverage)?;

        Ok(Analysis {
            reduction,
            lookahead,
            sentences,
        })
    }

    /// Synthesize one sentence per leaf of `coverage`
    ///
    /// # Errors
    ///
    /// Any upstream inconsistency met while assembling a sentence, or
    /// [`CoverageError::StrategyMismatch`].
    pub fn generate(&self, coverage: &LookaheadCoverage) -> Result<Vec<Sentence>> {
        let mut sentences = Vec::new();
        coverage.enum_sentences(|suffix, rejected| {
            sentences.push(self.assemble(suffix, rejected)?);
            Ok(())
        })?;

        let total: usize = sentences.iter().map(|sentence| sentence.word.len()).sum();
        log::info!(
            "synthesized {} sentences, average length {:.2}",
            sentences.len(),
            if sentences.is_empty() {
                0.0
            } else {
                total as f64 / sentences.len() as f64
            }
        );
        Ok(sentences)
    }

    /// Build the sentence of one coverage leaf
    ///
    /// # Errors
    ///
    /// See [`Self::generate`].
    pub fn assemble(&self, suffix: &Suffix, rejected: &TerminalSet) -> Result<Sentence> {
        let layers = Form::replay(self.upstream, &self.successors, suffix)?;
        let stack = collapse_layers(&self.prefixes, &self.successors, &layers)?;
        let word = word_of_configs(self.upstream, &stack)?;

        let audit_word = if self.config.cross_validate {
            let direct = direct_layers(self.upstream, &self.successors, suffix)?;
            let audit_stack = collapse_layers(&self.prefixes, &self.successors, &direct)?;
            let audit_word = word_of_configs(self.upstream, &audit_stack)?;
            if audit_word != word {
                return Err(CoverageError::StrategyMismatch {
                    form: self.render_word(&word),
                    direct: self.render_word(&audit_word),
                });
            }
            Some(audit_word)
        } else {
            None
        };

        let entrypoint = self.entrypoint(&stack)?;
        let tops = suffix
            .nodes()
            .into_iter()
            .map(|node| self.upstream.config(node).top)
            .collect();
        log::debug!(
            "sentence for {:?}: {} @ {}",
            suffix.entry(),
            self.render_word(&word),
            self.render_terminals(rejected.iter())
        );

        Ok(Sentence {
            entrypoint,
            word,
            audit_word,
            rejected: rejected.clone(),
            stack,
            tops,
        })
    }

    fn entrypoint(&self, stack: &[Lrc]) -> Result<CompactString> {
        let Some(&bottom) = stack.first() else {
            return Ok(CompactString::default());
        };
        let state = self.upstream.lr1_of(bottom);
        let nonterminal = self
            .upstream
            .entrypoint(state)
            .ok_or(CoverageError::MissingEntrypoint { state })?;
        let name = self.upstream.nonterminal_name(nonterminal);
        Ok(CompactString::from(
            name.strip_suffix(self.config.entrypoint_marker)
                .unwrap_or(name),
        ))
    }

    /// Space-separated terminal names
    #[must_use]
    pub fn render_word(&self, word: &[Terminal]) -> String {
        self.render_terminals(word.iter().copied())
    }

    fn render_terminals(&self, terminals: impl Iterator<Item = Terminal>) -> String {
        terminals
            .map(|terminal| self.upstream.terminal_name(terminal))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// An item as `lhs -> α . β`
    #[must_use]
    pub fn render_item(&self, item: Item) -> String {
        let grammar = self.upstream;
        let rhs = grammar.rhs(item.production);
        let mut text = String::from(grammar.nonterminal_name(grammar.lhs(item.production)));
        text.push_str(" ->");
        for (position, &symbol) in rhs.iter().enumerate() {
            if position == item.dot as usize {
                text.push_str(" .");
            }
            text.push(' ');
            text.push_str(grammar.symbol_name(symbol));
        }
        if item.dot as usize >= rhs.len() {
            text.push_str(" .");
        }
        text
    }

    /// Write one block per sentence
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Io`] if the writer fails.
    pub fn write_corpus<W: Write>(&self, mut writer: W, sentences: &[Sentence]) -> Result<()> {
        for sentence in sentences {
            writeln!(writer, "{}", sentence.entrypoint)?;
            writeln!(writer, "{}", self.render_word(&sentence.word))?;
            let audit = sentence.audit_word.as_deref().unwrap_or(&sentence.word);
            writeln!(writer, "{}", self.render_word(audit))?;
            writeln!(writer, "@ {}", self.render_terminals(sentence.rejected.iter()))?;
            if self.config.emit_items {
                for &top in &sentence.tops {
                    for &item in self.upstream.items(top) {
                        writeln!(writer, "  {}", self.render_item(item))?;
                    }
                }
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Run the whole analysis over `upstream` with `config`
///
/// # Errors
///
/// See [`SentenceGenerator::analyze`].
pub fn analyze<U: Upstream + ?Sized>(upstream: &U, config: CoverageConfig) -> Result<Analysis> {
    SentenceGenerator::new(upstream, config).analyze()
}
