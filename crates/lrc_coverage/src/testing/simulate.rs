//! A plain LR driver over a fixture's action table.

use super::FixtureError;
use super::automaton::{Action, LrAutomaton};
use crate::index::{Idx, Lr1, Production, Terminal};

/// What the parser does with the lookahead once every reduction is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Shift,
    Accept,
    Reject,
}

/// Stacks seen while the lookahead is pending, and the final decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// The stack after `word`, then after each reduction on the lookahead
    pub stacks: Vec<Vec<Lr1>>,
    pub outcome: Outcome,
}

/// Parse `word`, then report what happens to `lookahead`
///
/// # Errors
///
/// Returns [`FixtureError::Stuck`] if `word` itself is not a viable prefix.
pub fn run(automaton: &LrAutomaton, word: &[Terminal], lookahead: Terminal) -> Result<Trace, FixtureError> {
    let mut stack = vec![Lr1::new(0)];
    for (position, &terminal) in word.iter().enumerate() {
        loop {
            let state = stack[stack.len() - 1];
            match automaton.action(state, terminal) {
                Action::Shift(target) => {
                    stack.push(target);
                    break;
                }
                Action::Reduce(production) => reduce(automaton, &mut stack, production)
                    .ok_or(FixtureError::Stuck { position, state })?,
                Action::Accept | Action::Error => {
                    return Err(FixtureError::Stuck { position, state });
                }
            }
        }
    }

    let mut stacks = vec![stack.clone()];
    loop {
        let state = stack[stack.len() - 1];
        let outcome = match automaton.action(state, lookahead) {
            Action::Shift(_) => Outcome::Shift,
            Action::Accept => Outcome::Accept,
            Action::Error => Outcome::Reject,
            Action::Reduce(production) => {
                reduce(automaton, &mut stack, production).ok_or(FixtureError::Stuck {
                    position: word.len(),
                    state,
                })?;
                stacks.push(stack.clone());
                continue;
            }
        };
        return Ok(Trace { stacks, outcome });
    }
}

fn reduce(automaton: &LrAutomaton, stack: &mut Vec<Lr1>, production: Production) -> Option<()> {
    let arity = automaton.grammar.rhs(production).len();
    let depth = stack.len().checked_sub(arity).filter(|&depth| depth > 0)?;
    stack.truncate(depth);
    let lhs = automaton.grammar.productions[production.index()].lhs;
    let target = automaton.goto_nonterminal(stack[depth - 1], lhs)?;
    stack.push(target);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn reductions_are_recorded_until_the_lookahead_is_decided() {
        let fixture = Fixture::build("S -> A B; A -> a; B -> b").expect("fixture");
        let trace = run(&fixture.automaton, &fixture.word("a b"), fixture.terminal("$")).expect("trace");
        assert_eq!(trace.outcome, Outcome::Accept);
        assert_eq!(
            trace.stacks[0],
            vec![fixture.start_state(), fixture.state_after(&["A"]), fixture.state_after(&["A", "b"])]
        );
        assert_eq!(trace.stacks.len(), 3);
    }

    #[test]
    fn rejection_and_stuck_words() {
        let fixture = Fixture::build("S -> A B; A -> a; B -> b").expect("fixture");
        let trace = run(&fixture.automaton, &fixture.word("a"), fixture.terminal("a")).expect("trace");
        assert_eq!(trace.outcome, Outcome::Reject);
        assert_eq!(trace.stacks.len(), 1);

        let stuck = run(&fixture.automaton, &fixture.word("b"), fixture.terminal("$"));
        assert!(matches!(stuck, Err(FixtureError::Stuck { position: 0, .. })));
    }
}
