//! # Cost-Minimal Words
//!
//! Turns a concrete stack (one configuration per frame, deepest first) into
//! the shortest terminal sequence that drives the base automaton through it.
//!
//! ## Cells
//!
//! Every pair of adjacent configurations `(x, y)` is one base transition. Its
//! cell is the transition's leaf in the cost tree, at the class of `y` after
//! the transition and at the cheapest class before it that `x`'s class
//! coerces into.
//!
//! ## Backtrace
//!
//! [`prepend_word`] follows the cost of a cell down the tree:
//!
//! - a shift leaf emits its terminal;
//! - a goto leaf emits nothing when a nullable production covers the classes,
//!   and otherwise recurses into the first equation realizing the same cost;
//! - a join recurses into the first pairing of the two sides whose costs add
//!   up to the cost of the join.
//!
//! The cost tables promise that such a choice always exists; not finding one is
//! reported as an upstream inconsistency.

use crate::error::{CoverageError, Result};
use crate::index::{Lrc, Terminal, Transition, TreeNode};
use crate::upstream::{Automaton, CostTables, Cost, LookaheadClasses, Split, Symbol, UNREACHABLE};
use std::collections::VecDeque;

/// Coordinates of a cost cell: a tree node and a class on each side of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub node: TreeNode,
    pub pre: usize,
    pub post: usize,
}

impl CellKey {
    #[must_use]
    pub const fn new(node: TreeNode, pre: usize, post: usize) -> Self {
        Self { node, pre, post }
    }

    #[must_use]
    pub fn cost<C: CostTables + ?Sized>(self, tables: &C) -> Cost {
        tables.cell_cost(self.node, self.pre, self.post)
    }
}

/// One cell per adjacent pair of configurations
///
/// # Errors
///
/// Returns [`CoverageError::MissingTransition`] if two adjacent configurations
/// are not linked by a base transition, and [`CoverageError::UnrealizableCell`]
/// if no class pairing of the transition has a finite cost.
pub fn cells_of_configs<U>(upstream: &U, configs: &[Lrc]) -> Result<Vec<CellKey>>
where
    U: Automaton + LookaheadClasses + CostTables + ?Sized,
{
    configs
        .windows(2)
        .map(|pair| cell_of_pair(upstream, pair[0], pair[1]))
        .collect()
}

fn cell_of_pair<U>(upstream: &U, from: Lrc, to: Lrc) -> Result<CellKey>
where
    U: Automaton + LookaheadClasses + CostTables + ?Sized,
{
    let source = upstream.lr1_of(from);
    let target = upstream.lr1_of(to);
    let transition = upstream
        .find_transition(source, target)
        .ok_or(CoverageError::MissingTransition {
            from: source,
            to: target,
        })?;

    let node = upstream.leaf(transition);
    let class = upstream.class_index(from);
    let post = upstream.class_index(to);
    let coercion = upstream.coercion(upstream.classes(source), upstream.pre_classes(node));

    coercion
        .forward
        .get(class)
        .into_iter()
        .flatten()
        .map(|&pre| (upstream.cell_cost(node, pre, post), pre))
        .filter(|&(cost, _)| cost != UNREACHABLE)
        .min()
        .map(|(_, pre)| CellKey::new(node, pre, post))
        .ok_or(CoverageError::UnrealizableCell {
            transition,
            class,
            post,
        })
}

/// Prepend the terminals realizing `cell` to `word`
///
/// # Errors
///
/// Returns [`CoverageError::NoMatchingEquation`] or
/// [`CoverageError::NoMatchingSplit`] when the cost tables promise a cost that
/// no alternative realizes.
pub fn prepend_word<U>(upstream: &U, cell: CellKey, word: &mut VecDeque<Terminal>) -> Result<()>
where
    U: Automaton + CostTables + ?Sized,
{
    let cost = cell.cost(upstream);
    match upstream.split(cell.node) {
        Split::Leaf(transition) => match upstream.transition(transition).symbol {
            Symbol::Terminal(terminal) => {
                word.push_front(terminal);
                Ok(())
            }
            Symbol::Nonterminal(_) => prepend_goto(upstream, cell, transition, cost, word),
        },
        Split::Join(left, right) => {
            let (middle_left, middle_right) =
                find_split(upstream, cell, left, right, cost).ok_or(CoverageError::NoMatchingSplit {
                    node: cell.node,
                    pre: cell.pre,
                    post: cell.post,
                    cost,
                })?;
            prepend_word(upstream, CellKey::new(right, middle_right, cell.post), word)?;
            prepend_word(upstream, CellKey::new(left, cell.pre, middle_left), word)
        }
    }
}

fn prepend_goto<U>(
    upstream: &U,
    cell: CellKey,
    transition: Transition,
    cost: Cost,
    word: &mut VecDeque<Terminal>,
) -> Result<()>
where
    U: Automaton + CostTables + ?Sized,
{
    let equations = upstream.goto_equations(transition);
    let pre_classes = upstream.pre_classes(cell.node);
    let post_classes = upstream.post_classes(cell.node);
    let pre_class = &pre_classes[cell.pre];
    let post_class = &post_classes[cell.post];

    if !equations.nullable.is_empty()
        && post_class.is_subset(&equations.nullable_lookaheads)
        && !post_class.is_disjoint(pre_class)
    {
        return Ok(());
    }

    let found = equations
        .non_nullable
        .iter()
        .filter(|equation| post_class.is_subset(&equation.lookahead))
        .find_map(|equation| {
            let pre = upstream.coercion(pre_classes, upstream.pre_classes(equation.node));
            let post = upstream.coercion(post_classes, upstream.post_classes(equation.node));
            pre.forward[cell.pre].iter().find_map(|&inner_pre| {
                post.forward[cell.post]
                    .iter()
                    .map(|&inner_post| CellKey::new(equation.node, inner_pre, inner_post))
                    .find(|inner| inner.cost(upstream) == cost)
            })
        });

    match found {
        Some(inner) => prepend_word(upstream, inner, word),
        None => Err(CoverageError::NoMatchingEquation {
            transition,
            pre: cell.pre,
            post: cell.post,
            cost,
            pre_class: pre_class.clone(),
            post_class: post_class.clone(),
        }),
    }
}

/// First class pairing across a join whose two costs add up to `cost`
fn find_split<U>(
    upstream: &U,
    cell: CellKey,
    left: TreeNode,
    right: TreeNode,
    cost: Cost,
) -> Option<(usize, usize)>
where
    U: CostTables + ?Sized,
{
    let coercion = upstream.coercion(upstream.post_classes(left), upstream.pre_classes(right));
    coercion
        .forward
        .iter()
        .enumerate()
        .find_map(|(middle_left, candidates)| {
            let left_cost = upstream.cell_cost(left, cell.pre, middle_left);
            if left_cost == UNREACHABLE {
                return None;
            }
            candidates
                .iter()
                .copied()
                .find(|&middle_right| {
                    let right_cost = upstream.cell_cost(right, middle_right, cell.post);
                    right_cost != UNREACHABLE && left_cost.checked_add(right_cost) == Some(cost)
                })
                .map(|middle_right| (middle_left, middle_right))
        })
}

/// Total cost of a cell sequence, `UNREACHABLE` if any cell is
#[must_use]
pub fn cost_of_cells<C: CostTables + ?Sized>(tables: &C, cells: &[CellKey]) -> Cost {
    cells
        .iter()
        .try_fold(0, |total: Cost, cell| {
            let cost = cell.cost(tables);
            if cost == UNREACHABLE {
                None
            } else {
                total.checked_add(cost)
            }
        })
        .unwrap_or(UNREACHABLE)
}

/// Shortest word driving the automaton through `configs`
///
/// # Errors
///
/// Any error of [`cells_of_configs`] or [`prepend_word`].
pub fn word_of_configs<U>(upstream: &U, configs: &[Lrc]) -> Result<Vec<Terminal>>
where
    U: Automaton + LookaheadClasses + CostTables + ?Sized,
{
    let cells = cells_of_configs(upstream, configs)?;
    let mut word = VecDeque::new();
    for &cell in cells.iter().rev() {
        prepend_word(upstream, cell, &mut word)?;
    }
    Ok(word.into())
}
