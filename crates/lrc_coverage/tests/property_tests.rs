//! Property-based tests over random LL(1) grammars
//!
//! Every generated grammar is conflict-free: each alternative starts with its
//! own terminal and nonterminals only refer to later ones. For each of them the
//! whole pipeline must succeed, and every synthesized sentence must drive a
//! plain LR driver into the rejections it claims.

#![cfg(test)]

use lrc_coverage::testing::Fixture;
use lrc_coverage::testing::simulate::{self, Outcome};
use lrc_coverage::upstream::LookaheadClasses;
use lrc_coverage::{CoverageConfig, LookaheadCoverage, Scheduling, analyze};
use proptest::prelude::*;

/// Render rules as `N0 -> h0 x N1 | h1; N1 -> h2 y`
///
/// Each alternative is a list of symbol codes: `0` is `x`, `1` is `y`, and
/// `k >= 2` names the `k - 1`-th nonterminal after the current one, or `y`
/// past the last.
fn render(rules: &[Vec<Vec<usize>>]) -> String {
    let mut head = 0;
    let mut text = Vec::new();
    for (index, alternatives) in rules.iter().enumerate() {
        let rendered: Vec<String> = alternatives
            .iter()
            .map(|codes| {
                let mut symbols = vec![format!("h{head}")];
                head += 1;
                for &code in codes {
                    symbols.push(match code {
                        0 => "x".to_string(),
                        1 => "y".to_string(),
                        k if index + k - 1 < rules.len() => format!("N{}", index + k - 1),
                        _ => "y".to_string(),
                    });
                }
                symbols.join(" ")
            })
            .collect();
        text.push(format!("N{index} -> {}", rendered.join(" | ")));
    }
    text.join("; ")
}

fn grammar_text() -> impl Strategy<Value = String> {
    let alternative = prop::collection::vec(0usize..5, 0..=2);
    let rule = prop::collection::vec(alternative, 1..=2);
    prop::collection::vec(rule, 1..=3).prop_map(|rules| render(&rules))
}

#[test]
fn rendering() {
    let text = render(&[vec![vec![0, 2], vec![]], vec![vec![1, 4]]]);
    assert_eq!(text, "N0 -> h0 x N1 | h1; N1 -> h2 y y");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pipeline_succeeds(text in grammar_text()) {
        let fixture = Fixture::build(&text).expect("LL(1) grammars build");
        let analysis = analyze(&fixture.tables, CoverageConfig::default()).expect("analysis");
        prop_assert_eq!(analysis.lookahead.sentences, analysis.sentences.len());
        prop_assert_eq!(analysis.reduction.expanded, fixture.tables.nodes.len());
        for sentence in &analysis.sentences {
            prop_assert_eq!(sentence.audit_word.as_ref(), Some(&sentence.word));
            prop_assert!(!sentence.rejected.is_empty());
        }
    }

    #[test]
    fn coverage_trees_are_consistent(text in grammar_text()) {
        let fixture = Fixture::build(&text).expect("LL(1) grammars build");
        for scheduling in [Scheduling::Dfs, Scheduling::Bfs] {
            let coverage = LookaheadCoverage::explore(&fixture.tables, scheduling);
            for node in coverage.tree_nodes() {
                prop_assert!(node.committed.is_disjoint(&node.rejected));
                for &child in &node.children {
                    prop_assert!(node.rejected.is_subset(&coverage.tree_node(child).rejected));
                }
            }
        }
        prop_assert!(LookaheadCoverage::check_schedules(&fixture.tables).is_ok());
    }

    #[test]
    fn sentences_reach_their_rejections(text in grammar_text()) {
        let fixture = Fixture::build(&text).expect("LL(1) grammars build");
        let tables = &fixture.tables;
        let analysis = analyze(tables, CoverageConfig::default()).expect("analysis");

        for sentence in &analysis.sentences {
            for rejected in sentence.rejected.iter() {
                let trace = simulate::run(&fixture.automaton, &sentence.word, rejected)
                    .expect("sentences are viable prefixes");
                prop_assert_eq!(trace.outcome, Outcome::Reject);

                let states: Vec<_> = sentence.stack.iter().map(|&lrc| tables.lr1_of(lrc)).collect();
                prop_assert!(trace.stacks.contains(&states), "{:?} not in {:?}", states, trace.stacks);
            }
        }
    }
}
