//! Reduction coverage over hand-made graphs and fixture tables

use lrc_coverage::testing::{Fixture, GraphBuilder};
use lrc_coverage::upstream::ReductionGraph;
use lrc_coverage::{Production, ReductionCoverage, Scheduling};

#[test]
fn diamond_expands_every_node_once() {
    let mut graph = GraphBuilder::new(1);
    let root = graph.node(&[], &[]);
    let left = graph.node(&[], &[]);
    let right = graph.node(&[], &[]);
    let join = graph.node(&[0], &[]);
    graph
        .edge(root, left, 0)
        .edge(root, right, 0)
        .edge(left, join, 0)
        .edge(right, join, 1)
        .root(root);
    let tables = graph.build();

    for scheduling in [Scheduling::Dfs, Scheduling::Bfs] {
        let coverage = ReductionCoverage::explore(&tables, scheduling);
        let stats = coverage.stats();
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.total_depth, 4);
        assert_eq!(stats.expanded, 4);
        assert_eq!(coverage.len(), 5);
        assert!((stats.average_depth() - 2.0).abs() < f64::EPSILON);
    }
}

#[test]
fn cycles_terminate() {
    let mut graph = GraphBuilder::new(1);
    let root = graph.node(&[], &[]);
    let other = graph.node(&[0], &[]);
    graph.edge(root, other, 0).edge(other, root, 2).root(root);
    let tables = graph.build();

    let coverage = ReductionCoverage::explore(&tables, Scheduling::Dfs);
    assert_eq!(coverage.stats().sentences, 1);
    assert_eq!(coverage.stats().total_depth, 2);
    assert_eq!(coverage.stats().expanded, 2);

    let (_, root_index) = coverage.roots()[0];
    let tree_root = coverage.tree_node(root_index);
    assert_eq!(tree_root.node, root);
    assert_eq!(tree_root.edge, None);
    let child = coverage.tree_node(tree_root.children[0]);
    let back = coverage.tree_node(child.children[0]);
    assert_eq!(back.node, root);
    assert_eq!(back.edge, Some((Production::from_usize(0), 2)));
    assert!(back.children.is_empty());
}

#[test]
fn revisited_roots_are_single_leaves() {
    let mut graph = GraphBuilder::new(1);
    let first = graph.node(&[], &[]);
    let second = graph.node(&[], &[]);
    graph.edge(first, second, 0).root(first).root(second);
    let tables = graph.build();

    let coverage = ReductionCoverage::explore(&tables, Scheduling::Bfs);
    assert_eq!(coverage.roots().len(), 2);
    let (_, index) = coverage.roots()[1];
    assert!(coverage.tree_node(index).children.is_empty());
    assert_eq!(coverage.tree_node(index).depth, 0);
    assert_eq!(coverage.stats().sentences, 2);
    assert_eq!(coverage.stats().total_depth, 1);
}

#[test]
fn empty_graph() {
    let tables = GraphBuilder::new(2).build();
    let coverage = ReductionCoverage::explore(&tables, Scheduling::Dfs);
    assert!(coverage.is_empty());
    assert_eq!(coverage.stats().sentences, 0);
    assert_eq!(coverage.stats().average_depth(), 0.0);
}

#[test]
fn schedules_agree_on_fixture_tables() {
    for grammar in [
        "S -> A B; A -> a; B -> b",
        "E -> T p E | T; T -> x | l E r",
        "L -> x L | y",
    ] {
        let fixture = Fixture::build(grammar).expect("fixture");
        let (dfs, bfs) = ReductionCoverage::check_schedules(&fixture.tables).expect("schedules");
        assert_eq!(dfs.sentences, bfs.sentences, "{grammar}");
        assert_eq!(dfs.expanded, fixture.tables.node_count(), "{grammar}");
        assert_eq!(bfs.expanded, dfs.expanded, "{grammar}");
    }
}
