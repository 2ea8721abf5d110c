//! Lookahead coverage: the shrinking fixpoint, pruning and the post-pass

use lrc_coverage::testing::{Fixture, GraphBuilder};
use lrc_coverage::{Idx, LookaheadCoverage, Scheduling, Terminal, TerminalSet};

fn terminals(set: &TerminalSet) -> Vec<usize> {
    set.iter().map(Terminal::index).collect()
}

/// `root → a → m` and `root → b → m`, where `m` rejects `t0`
fn diamond() -> lrc_coverage::Tables {
    let mut graph = GraphBuilder::new(2);
    let root = graph.node(&[], &[]);
    let a = graph.node(&[], &[]);
    let b = graph.node(&[], &[]);
    let m = graph.node(&[0], &[]);
    graph
        .edge(root, a, 0)
        .edge(root, b, 0)
        .edge(a, m, 0)
        .edge(b, m, 0)
        .root(root);
    graph.build()
}

#[test]
fn second_arrival_is_pruned() {
    let tables = diamond();
    for scheduling in [Scheduling::Dfs, Scheduling::Bfs] {
        let coverage = LookaheadCoverage::explore(&tables, scheduling);
        let m_nodes: Vec<_> = coverage
            .tree_nodes()
            .iter()
            .filter(|node| node.node.index() == 3)
            .collect();
        assert_eq!(m_nodes.len(), 1, "{scheduling:?}");
        assert_eq!(terminals(&m_nodes[0].rejected), vec![0]);
        assert_eq!(m_nodes[0].depth, 2);
        assert_eq!(coverage.tree_nodes().len(), 4);

        let stats = coverage.measure_lookaheads().expect("measure");
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.sentences, 1);
        assert_eq!(stats.direct, 1);
        assert_eq!(stats.indirect, 0);
        // The sibling committed to `t0` but left it to the first arrival.
        assert_eq!(stats.unresolved, 1);
    }
}

#[test]
fn accepted_terminals_are_never_rejected_below() {
    let mut graph = GraphBuilder::new(2);
    let root = graph.node(&[], &[1]);
    let leaf = graph.node(&[1], &[]);
    graph.edge(root, leaf, 0).root(root);
    let tables = graph.build();

    let coverage = LookaheadCoverage::explore(&tables, Scheduling::Dfs);
    let (_, index) = coverage.roots()[0];
    let root_node = coverage.tree_node(index);
    assert!(root_node.committed.is_empty());
    assert!(root_node.children.is_empty());

    let stats = coverage.measure_lookaheads().expect("measure");
    assert_eq!(stats.sentences, 0);
    assert_eq!(stats.pruned, 1);
}

#[test]
fn rejections_accumulate_along_the_path() {
    let mut graph = GraphBuilder::new(3);
    let root = graph.node(&[0], &[]);
    let middle = graph.node(&[], &[]);
    let leaf = graph.node(&[2], &[1]);
    graph
        .edge(root, middle, 0)
        .edge(middle, leaf, 1)
        .root(root);
    let tables = graph.build();

    let coverage = LookaheadCoverage::explore(&tables, Scheduling::Dfs);
    let (entry, index) = coverage.roots()[0];
    assert_eq!(entry.index(), 0);
    assert_eq!(terminals(&coverage.tree_node(index).rejected), vec![0]);
    assert_eq!(terminals(&coverage.tree_node(index).committed), vec![2]);

    let mut leaves = Vec::new();
    coverage
        .enum_sentences(|suffix, rejected| {
            leaves.push((suffix.len(), suffix.root().index(), terminals(rejected)));
            Ok(())
        })
        .expect("enumerate");
    assert_eq!(leaves, vec![(2, 0, vec![0, 2])]);
}

#[test]
fn tree_invariants_hold_on_fixture_tables() {
    for grammar in [
        "S -> A B; A -> a; B -> b",
        "S -> A b; A -> | a",
        "E -> T p E | T; T -> x | l E r",
    ] {
        let fixture = Fixture::build(grammar).expect("fixture");
        for scheduling in [Scheduling::Dfs, Scheduling::Bfs] {
            let coverage = LookaheadCoverage::explore(&fixture.tables, scheduling);
            for node in coverage.tree_nodes() {
                assert!(node.committed.is_disjoint(&node.rejected), "{grammar}");
                for &child in &node.children {
                    let child = coverage.tree_node(child);
                    assert!(node.rejected.is_subset(&child.rejected), "{grammar}");
                    assert_eq!(child.depth, node.depth + 1);
                    assert_eq!(child.suffix.len(), child.depth);
                }
            }
            coverage.measure_lookaheads().expect("measure");
        }
        let (dfs, bfs) = LookaheadCoverage::check_schedules(&fixture.tables).expect("schedules");
        assert_eq!(dfs.total(), bfs.total(), "{grammar}");
    }
}

#[test]
fn fixture_sentence_count() {
    let fixture = Fixture::build("S -> A B; A -> a; B -> b").expect("fixture");
    let coverage = LookaheadCoverage::explore(&fixture.tables, Scheduling::Dfs);
    let stats = coverage.measure_lookaheads().expect("measure");
    assert_eq!(stats.sentences, 5);
    assert_eq!(stats.unresolved, 0);

    let mut entries = Vec::new();
    coverage
        .enum_sentences(|suffix, _| {
            entries.push(suffix.entry());
            Ok(())
        })
        .expect("enumerate");
    let after_a = fixture.state_after(&["a"]);
    let after_ab = fixture.state_after(&["A", "b"]);
    assert_eq!(
        entries,
        vec![
            fixture.lrc(fixture.start_state(), "$"),
            fixture.lrc(after_a, "$"),
            fixture.lrc(after_a, "a"),
            fixture.lrc(after_ab, "a"),
            fixture.lrc(after_ab, "b"),
        ]
    );
}

#[test]
fn callback_errors_stop_the_enumeration() {
    let fixture = Fixture::build("S -> A B; A -> a; B -> b").expect("fixture");
    let coverage = LookaheadCoverage::explore(&fixture.tables, Scheduling::Dfs);
    let mut calls = 0;
    let result = coverage.enum_sentences(|_, _| {
        calls += 1;
        Err(lrc_coverage::CoverageError::MissingEntrypoint {
            state: fixture.start_state(),
        })
    });
    assert!(result.is_err());
    assert_eq!(calls, 1);
}
