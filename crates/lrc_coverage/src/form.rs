//! # Stack Forms
//!
//! A [`Form`] replays a reduction path into the shape of the parser stack a
//! sentence has to realize: one set of lookahead-class configurations per
//! stack frame, deepest first.
//!
//! ## Model
//!
//! Only the frames that some reduction of the path pops below the entry
//! configuration are materialized. Frames pushed by the reductions themselves
//! (gotos) are never constrained, so the form only counts them. The entry
//! configuration itself starts as one such pending push: its layer is fixed,
//! and the layer below it (its predecessors) is the first one a reduction can
//! expose.
//!
//! ```text
//! start(e)          stack [preds(e), {e}]      PendingPush(1)
//! pop               PendingPush(n) -> n - 1    Idle once every push is consumed
//! pop (Idle)        buffer [preds(stack[0])]   PendingPop
//! pop (PendingPop)  buffer [preds(buffer[0]), ..]
//! base(x)           narrow the exposed layer to x, flush the buffer, Idle
//! ```
//!
//! Narrowing a layer propagates upwards: every layer above is intersected with
//! the successors of the layer below it, so the stack stays a chain of
//! predecessor-consistent sets and any left-to-right choice over it succeeds.

use crate::bitset::LrcSet;
use crate::error::{CoverageError, Result};
use crate::index::{Lrc, Production};
use crate::prefix::{Successors, predecessor_image};
use crate::suffix::Suffix;
use crate::upstream::{Grammar, LookaheadClasses, ReductionGraph};

/// What the form is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// The deepest materialized layer is exposed
    Idle,
    /// Frames pushed by reductions on top of the exposed layer
    PendingPush(usize),
    /// Layers popped below the materialized stack, deepest first, awaiting a base
    PendingPop(Vec<LrcSet>),
}

/// Stack builder replaying a reduction path
#[derive(Debug, Clone)]
pub struct Form<'a, U: ?Sized> {
    upstream: &'a U,
    successors: &'a Successors,
    stack: Vec<LrcSet>,
    state: FormState,
}

impl<'a, U> Form<'a, U>
where
    U: Grammar + LookaheadClasses + ?Sized,
{
    /// Seed the stack with the entry configuration and its predecessors
    #[must_use]
    pub fn start(upstream: &'a U, successors: &'a Successors, entry: Lrc) -> Self {
        let entry_layer = LrcSet::singleton(upstream.lrc_count(), entry);
        Self {
            upstream,
            successors,
            stack: vec![upstream.predecessors(entry).clone(), entry_layer],
            state: FormState::PendingPush(1),
        }
    }

    /// Replay every reduction of `suffix`, from its entry configuration
    ///
    /// # Errors
    ///
    /// Fails with [`CoverageError::ReduceOutsideTop`] or
    /// [`CoverageError::EmptyNarrowing`] if a node's configurations do not fit
    /// the stack the path builds.
    pub fn replay(upstream: &'a U, successors: &'a Successors, suffix: &Suffix) -> Result<Vec<LrcSet>>
    where
        U: ReductionGraph,
    {
        let mut form = Self::start(upstream, successors, suffix.entry());
        for step in suffix.steps() {
            form.reduce(&upstream.config(step.node).lrcs, step.production)?;
        }
        Ok(form.finish())
    }

    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    /// Materialized layers, deepest first
    #[must_use]
    pub fn layers(&self) -> &[LrcSet] {
        &self.stack
    }

    /// Record a frame pushed by a reduction
    ///
    /// # Panics
    ///
    /// Panics if pops are pending: they must be resolved by [`Self::base`] first.
    pub fn push(&mut self) {
        self.state = match self.state {
            FormState::Idle => FormState::PendingPush(1),
            FormState::PendingPush(n) => FormState::PendingPush(n + 1),
            FormState::PendingPop(_) => panic!("push on a form with unresolved pops"),
        };
    }

    /// Pop one frame, materializing a layer once the pushed frames are gone
    pub fn pop(&mut self) {
        self.state = match std::mem::replace(&mut self.state, FormState::Idle) {
            FormState::PendingPush(n) if n > 1 => FormState::PendingPush(n - 1),
            FormState::PendingPush(_) => FormState::Idle,
            FormState::Idle => {
                FormState::PendingPop(vec![predecessor_image(self.upstream, &self.stack[0])])
            }
            FormState::PendingPop(mut buffer) => {
                let below = predecessor_image(self.upstream, &buffer[0]);
                buffer.insert(0, below);
                FormState::PendingPop(buffer)
            }
        };
    }

    /// The original layer currently exposed, if no pushed frame hides it
    #[must_use]
    pub fn top(&self) -> Option<&LrcSet> {
        match &self.state {
            FormState::Idle => self.stack.first(),
            FormState::PendingPop(buffer) => buffer.first(),
            FormState::PendingPush(_) => None,
        }
    }

    /// Narrow the exposed layer to `lrcs` and propagate upwards
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::EmptyNarrowing`] if some layer loses every
    /// configuration.
    ///
    /// # Panics
    ///
    /// Panics if a pushed frame hides the original stack.
    pub fn base(&mut self, lrcs: &LrcSet) -> Result<()> {
        let mut layers = match std::mem::replace(&mut self.state, FormState::Idle) {
            FormState::PendingPop(buffer) => buffer,
            FormState::Idle => Vec::new(),
            FormState::PendingPush(_) => panic!("base on a form whose top is a pushed frame"),
        };
        layers.append(&mut self.stack);

        let narrowed = layers[0].intersection(lrcs);
        if narrowed.is_empty() {
            return Err(CoverageError::EmptyNarrowing {
                layer: 0,
                below: lrcs.clone(),
                above: layers[0].clone(),
            });
        }
        layers[0] = narrowed;
        for layer in 1..layers.len() {
            let image = self.successors.image(&layers[layer - 1]);
            let narrowed = layers[layer].intersection(&image);
            if narrowed.is_empty() {
                return Err(CoverageError::EmptyNarrowing {
                    layer,
                    below: layers[layer - 1].clone(),
                    above: layers[layer].clone(),
                });
            }
            layers[layer] = narrowed;
        }

        self.stack = layers;
        Ok(())
    }

    /// Pop the right-hand side of `production`, pin the exposed layer to
    /// `lrcs`, and push the goto frame
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::ReduceOutsideTop`] if `lrcs` is not a subset of
    /// the exposed layer, or any error of [`Self::base`].
    pub fn reduce(&mut self, lrcs: &LrcSet, production: Production) -> Result<()> {
        for _ in 0..self.upstream.rhs(production).len() {
            self.pop();
        }
        if let Some(top) = self.top() {
            if !lrcs.is_subset(top) {
                return Err(self.outside_top(lrcs, production));
            }
            self.base(lrcs)?;
        }
        self.push();
        Ok(())
    }

    fn outside_top(&self, lrcs: &LrcSet, production: Production) -> CoverageError {
        let (pop_buffer, pending_push) = match &self.state {
            FormState::Idle => (Vec::new(), 0),
            FormState::PendingPush(n) => (Vec::new(), *n),
            FormState::PendingPop(buffer) => (buffer.clone(), 0),
        };
        CoverageError::ReduceOutsideTop {
            production,
            lrcs: lrcs.clone(),
            stack: self.stack.clone(),
            pop_buffer,
            pending_push,
        }
    }

    /// The final layers, without the empty placeholder below a start configuration
    ///
    /// # Panics
    ///
    /// Panics if pops are still pending.
    #[must_use]
    pub fn finish(self) -> Vec<LrcSet> {
        assert!(
            !matches!(self.state, FormState::PendingPop(_)),
            "finish on a form with unresolved pops"
        );
        let mut stack = self.stack;
        if stack.first().is_some_and(LrcSet::is_empty) {
            stack.remove(0);
        }
        stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn fixture() -> Fixture {
        Fixture::build("S -> A B; A -> a; B -> b").expect("fixture")
    }

    #[test]
    fn replaying_reductions_materializes_popped_frames() {
        let fixture = fixture();
        let tables = &fixture.tables;
        let successors = Successors::build(tables);

        let after_a = fixture.state_after(&["A"]);
        let after_b = fixture.state_after(&["A", "b"]);
        let start = fixture.lrc(fixture.start_state(), "$");
        let goto_a = fixture.lrc(after_a, "b");
        let entry = fixture.lrc(after_b, "$");

        let mut form = Form::start(tables, &successors, entry);
        assert_eq!(form.state(), &FormState::PendingPush(1));

        let frontier = LrcSet::singleton(tables.lrc_count(), goto_a);
        form.reduce(&frontier, fixture.production("B -> b")).expect("reduce B");
        assert_eq!(form.state(), &FormState::PendingPush(1));
        assert_eq!(form.layers().len(), 2);

        let bottom = LrcSet::singleton(tables.lrc_count(), start);
        form.reduce(&bottom, fixture.production("S -> A B")).expect("reduce S");
        let layers = form.finish();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].iter().collect::<Vec<_>>(), vec![start]);
        assert_eq!(layers[1].iter().collect::<Vec<_>>(), vec![goto_a]);
        assert_eq!(layers[2].iter().collect::<Vec<_>>(), vec![entry]);
    }

    #[test]
    fn reduce_outside_top_reports_the_stack() {
        let fixture = fixture();
        let tables = &fixture.tables;
        let successors = Successors::build(tables);
        let entry = fixture.lrc(fixture.state_after(&["A", "b"]), "$");
        let stranger = fixture.lrc(fixture.state_after(&["a"]), "b");

        let mut form = Form::start(tables, &successors, entry);
        let wrong = LrcSet::singleton(tables.lrc_count(), stranger);
        let error = form
            .reduce(&wrong, fixture.production("B -> b"))
            .expect_err("outside top");
        match error {
            CoverageError::ReduceOutsideTop { stack, pending_push, .. } => {
                assert_eq!(stack.len(), 2);
                assert_eq!(pending_push, 0);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    #[should_panic(expected = "unresolved pops")]
    fn push_with_pending_pop_panics() {
        let fixture = fixture();
        let tables = &fixture.tables;
        let successors = Successors::build(tables);
        let entry = fixture.lrc(fixture.state_after(&["A", "b"]), "$");

        let mut form = Form::start(tables, &successors, entry);
        form.pop();
        form.pop();
        assert!(matches!(form.state(), FormState::PendingPop(_)));
        form.push();
    }

    #[test]
    fn start_configuration_drops_placeholder() {
        let fixture = fixture();
        let tables = &fixture.tables;
        let successors = Successors::build(tables);
        let entry = fixture.lrc(fixture.start_state(), "$");

        let layers = Form::start(tables, &successors, entry).finish();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].contains(entry));
    }
}
