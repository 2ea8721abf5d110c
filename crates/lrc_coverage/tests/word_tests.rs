//! Word reconstruction from concrete configuration stacks

use lrc_coverage::testing::Fixture;
use lrc_coverage::upstream::{Automaton, CostTables, LookaheadClasses, UNREACHABLE};
use lrc_coverage::word::{CellKey, cells_of_configs, cost_of_cells, word_of_configs};
use lrc_coverage::CoverageError;

fn sequence() -> Fixture {
    Fixture::build("S -> A B; A -> a; B -> b").expect("fixture")
}

#[test]
fn shifts_and_gotos() {
    let fixture = sequence();
    let start = fixture.lrc(fixture.start_state(), "$");
    let after_a = fixture.lrc(fixture.state_after(&["A"]), "b");
    let after_ab = fixture.lrc(fixture.state_after(&["A", "b"]), "a");

    let configs = [start, after_a, after_ab];
    let word = word_of_configs(&fixture.tables, &configs).expect("word");
    assert_eq!(word, fixture.word("a b"));

    let cells = cells_of_configs(&fixture.tables, &configs).expect("cells");
    assert_eq!(cells.len(), 2);
    assert_eq!(cost_of_cells(&fixture.tables, &cells), 2);
    assert_eq!(cells[0].cost(&fixture.tables), 1);
}

#[test]
fn trivial_stacks() {
    let fixture = sequence();
    let start = fixture.lrc(fixture.start_state(), "$");
    assert!(word_of_configs(&fixture.tables, &[]).expect("empty").is_empty());
    assert!(word_of_configs(&fixture.tables, &[start]).expect("start").is_empty());
    assert_eq!(cost_of_cells(&fixture.tables, &[]), 0);

    let after_a = fixture.lrc(fixture.state_after(&["a"]), "$");
    assert_eq!(
        word_of_configs(&fixture.tables, &[start, after_a]).expect("word"),
        fixture.word("a")
    );
}

#[test]
fn longer_goto_spans() {
    let fixture = Fixture::build("S -> A c; A -> a B; B -> b b").expect("fixture");
    let start = fixture.lrc(fixture.start_state(), "$");
    let after_a = fixture.lrc(fixture.state_after(&["A"]), "c");
    let after_ac = fixture.lrc(fixture.state_after(&["A", "c"]), "$");
    let word = word_of_configs(&fixture.tables, &[start, after_a, after_ac]).expect("word");
    assert_eq!(word, fixture.word("a b b c"));
}

#[test]
fn nullable_gotos_emit_nothing() {
    let fixture = Fixture::build("S -> A b; A -> | a").expect("fixture");
    let start = fixture.lrc(fixture.start_state(), "$");
    let after_a = fixture.lrc(fixture.state_after(&["A"]), "b");
    let after_ab = fixture.lrc(fixture.state_after(&["A", "b"]), "$");

    let cells = cells_of_configs(&fixture.tables, &[start, after_a]).expect("cells");
    assert_eq!(cost_of_cells(&fixture.tables, &cells), 0);
    assert!(word_of_configs(&fixture.tables, &[start, after_a]).expect("word").is_empty());
    assert_eq!(
        word_of_configs(&fixture.tables, &[start, after_a, after_ab]).expect("word"),
        fixture.word("b")
    );
}

#[test]
fn non_adjacent_configurations() {
    let fixture = sequence();
    let start = fixture.lrc(fixture.start_state(), "$");
    let after_ab = fixture.lrc(fixture.state_after(&["A", "b"]), "a");
    let result = word_of_configs(&fixture.tables, &[start, after_ab]);
    assert!(matches!(result, Err(CoverageError::MissingTransition { .. })));
}

#[test]
fn unrealizable_classes() {
    let fixture = sequence();
    let tables = &fixture.tables;
    let start = fixture.lrc(fixture.start_state(), "$");
    // `A` is never followed by the end of input.
    let after_a = fixture.lrc(fixture.state_after(&["A"]), "$");
    let result = cells_of_configs(tables, &[start, after_a]);
    assert!(matches!(result, Err(CoverageError::UnrealizableCell { .. })));

    let goto = tables
        .find_transition(fixture.start_state(), fixture.state_after(&["A"]))
        .expect("goto A");
    let leaf = tables.leaf(goto);
    let dead = CellKey::new(leaf, 0, tables.class_index(after_a));
    let live = CellKey::new(leaf, 0, tables.class_index(fixture.lrc(fixture.state_after(&["A"]), "b")));
    assert_eq!(dead.cost(tables), UNREACHABLE);
    assert_eq!(live.cost(tables), 1);
    assert_eq!(cost_of_cells(tables, &[live, dead]), UNREACHABLE);
}
