//! Prefix index and successor relation over fixture tables

use lrc_coverage::prefix::{PrefixIndex, Successors, predecessor_image};
use lrc_coverage::testing::Fixture;
use lrc_coverage::upstream::LookaheadClasses;
use lrc_coverage::{Idx, LrcSet};

fn sequence() -> Fixture {
    Fixture::build("S -> A B; A -> a; B -> b").expect("fixture")
}

#[test]
fn paths_lead_back_to_the_start_configuration() {
    let fixture = sequence();
    let successors = Successors::build(&fixture.tables);
    let prefixes = PrefixIndex::build(&fixture.tables, &successors);

    let start = fixture.lrc(fixture.start_state(), "$");
    let after_a = fixture.state_after(&["A"]);
    let after_ab = fixture.state_after(&["A", "b"]);
    let entry = fixture.lrc(after_ab, "a");

    assert_eq!(prefixes.path(start), Some(&[start][..]));
    assert_eq!(
        prefixes.path(entry),
        Some(&[entry, fixture.lrc(after_a, "b"), start][..])
    );
    assert_eq!(
        prefixes.prefix(entry),
        Some(&[fixture.lrc(after_a, "b"), start][..])
    );
}

#[test]
fn unreachable_classes_have_no_path() {
    let fixture = sequence();
    let successors = Successors::build(&fixture.tables);
    let prefixes = PrefixIndex::build(&fixture.tables, &successors);

    let after_a = fixture.state_after(&["A"]);
    // `A` is only reduced on `b`.
    assert!(!prefixes.is_reachable(fixture.lrc(after_a, "$")));
    assert!(!prefixes.is_reachable(fixture.lrc(after_a, "a")));
    assert!(prefixes.is_reachable(fixture.lrc(after_a, "b")));
    assert_eq!(prefixes.path(fixture.lrc(after_a, "$")), None);
    assert_eq!(prefixes.reachable_count(), 10);
}

#[test]
fn successors_invert_predecessors() {
    let fixture = sequence();
    let tables = &fixture.tables;
    let successors = Successors::build(tables);

    let after_a = fixture.lrc(fixture.state_after(&["A"]), "b");
    let after_ab = fixture.state_after(&["A", "b"]);
    let after_aa = fixture.lrc(fixture.state_after(&["A", "B"]), "$");

    let expected: Vec<_> = ["$", "a", "b"]
        .iter()
        .map(|terminal| fixture.lrc(after_ab, terminal))
        .chain([after_aa])
        .collect();
    let mut found: Vec<_> = successors.of(after_a).iter().collect();
    found.sort();
    assert_eq!(found, expected);

    for lrc in successors.of(after_a).iter() {
        assert!(tables.predecessors(lrc).contains(after_a));
    }
}

#[test]
fn images_in_both_directions() {
    let fixture = sequence();
    let tables = &fixture.tables;
    let successors = Successors::build(tables);
    let count = tables.lrc_count();

    let after_ab = fixture.state_after(&["A", "b"]);
    let top = LrcSet::from_iter_in(
        count,
        ["a", "b"].iter().map(|terminal| fixture.lrc(after_ab, terminal)),
    );
    let below = predecessor_image(tables, &top);
    assert_eq!(
        below.iter().collect::<Vec<_>>(),
        vec![fixture.lrc(fixture.state_after(&["A"]), "b")]
    );
    assert!(top.is_subset(&successors.image(&below)));

    let start = fixture.lrc(fixture.start_state(), "$");
    assert!(predecessor_image(tables, &LrcSet::singleton(count, start)).is_empty());
    assert!(successors.image(&LrcSet::empty(count)).is_empty());
}

#[test]
fn broken_tables_shrink_the_index() {
    let mut fixture = sequence();
    let after_a = fixture.lrc(fixture.state_after(&["A"]), "b");
    fixture.tables.lrcs[after_a.index()].predecessors = LrcSet::default();

    let successors = Successors::build(&fixture.tables);
    let prefixes = PrefixIndex::build(&fixture.tables, &successors);
    assert!(!prefixes.is_reachable(after_a));
    // Everything after `A` hangs off the detached configuration.
    assert_eq!(prefixes.reachable_count(), 5);
}
