//! Hand-made reachable-reduction graphs.
//!
//! The explorers only read the graph and, for entry nodes, the classes of the
//! entry configuration. [`GraphBuilder`] fills in just enough of a [`Tables`]
//! for them: every node gets its own state with a single class holding every
//! terminal, and the state shifts and rejects what the node does.

use crate::bitset::{LrcSet, TerminalSet};
use crate::index::{Idx, Lr1, Lrc, Node, Nonterminal, Production, Terminal};
use crate::tables::{LrcInfo, NodeInfo, ProductionInfo, StateInfo, Tables};
use crate::upstream::{ReachTransition, Reduction, ViableConfig};
use compact_str::format_compact;

/// Builder for a [`Tables`] holding only a reachable-reduction graph
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    terminals: usize,
    nodes: Vec<NodeInfo>,
    roots: Vec<Node>,
}

impl GraphBuilder {
    /// Start a graph over `terminals` terminals named `t0`, `t1`, ...
    #[must_use]
    pub const fn new(terminals: usize) -> Self {
        Self {
            terminals,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn set(&self, elements: &[usize]) -> TerminalSet {
        TerminalSet::from_iter_in(self.terminals, elements.iter().map(|&i| Terminal::new(i)))
    }

    /// Add a node rejecting and accepting the given terminals
    pub fn node(&mut self, reject: &[usize], accept: &[usize]) -> Node {
        let node = Node::from_usize(self.nodes.len());
        let accept = self.set(accept);
        let reject = self.set(reject);
        self.nodes.push(NodeInfo {
            config: ViableConfig {
                top: Lr1::from_usize(node.index()),
                lrcs: LrcSet::default(),
            },
            transitions: Vec::new(),
            accept,
            reject,
            before: TerminalSet::empty(self.terminals),
            after: TerminalSet::empty(self.terminals),
        });
        node
    }

    /// Add a transition popping `depth` frames below the frontier
    pub fn edge(&mut self, from: Node, to: Node, depth: usize) -> &mut Self {
        let lookahead = TerminalSet::full(self.terminals);
        self.nodes[from.index()].transitions.push(ReachTransition {
            target: to,
            reduction: Reduction {
                production: Production::new(0),
                lookahead,
            },
            depth,
        });
        self
    }

    /// Make `node` the initial node of a fresh entry configuration
    pub fn root(&mut self, node: Node) -> &mut Self {
        self.roots.push(node);
        self
    }

    /// Derive the potential-reject sets and assemble the tables
    #[must_use]
    pub fn build(mut self) -> Tables {
        let mut changed = true;
        while changed {
            changed = false;
            for index in (0..self.nodes.len()).rev() {
                let mut after = TerminalSet::empty(self.terminals);
                for transition in &self.nodes[index].transitions {
                    after.union_with(&self.nodes[transition.target.index()].before);
                }
                let before = self.nodes[index].reject.union(&after);
                let node = &mut self.nodes[index];
                if after != node.after || before != node.before {
                    node.after = after;
                    node.before = before;
                    changed = true;
                }
            }
        }

        let states = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| StateInfo {
                incoming: None,
                entrypoint: Some(Nonterminal::new(0)),
                items: Vec::new(),
                outgoing: Vec::new(),
                shift_on: node.accept.clone(),
                reject: node.reject.clone(),
                first_lrc: Lrc::from_usize(index),
                classes: vec![TerminalSet::full(self.terminals)],
            })
            .collect();
        let lrcs = (0..self.nodes.len())
            .map(|index| LrcInfo {
                state: Lr1::from_usize(index),
                class: 0,
                predecessors: LrcSet::default(),
            })
            .collect();
        let initial = self
            .roots
            .iter()
            .map(|&node| (Lrc::from_usize(node.index()), node))
            .collect();

        Tables {
            terminals: (0..self.terminals)
                .map(|index| format_compact!("t{index}"))
                .collect(),
            nonterminals: vec![format_compact!("S'")],
            productions: vec![ProductionInfo {
                lhs: Nonterminal::new(0),
                rhs: Vec::new(),
            }],
            states,
            lrcs,
            initial,
            nodes: self.nodes,
            ..Tables::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{LookaheadClasses, ReductionGraph};

    #[test]
    fn potential_rejections_reach_the_root() {
        let mut graph = GraphBuilder::new(3);
        let root = graph.node(&[], &[1]);
        let middle = graph.node(&[2], &[]);
        let leaf = graph.node(&[0], &[]);
        graph.edge(root, middle, 0).edge(middle, leaf, 1).root(root);
        let tables = graph.build();

        let after: Vec<_> = tables.potential_reject_after(root).iter().map(Terminal::index).collect();
        assert_eq!(after, vec![0, 2]);
        assert_eq!(tables.potential_reject_before(leaf).len(), 1);
        assert!(tables.shift_on(tables.lr1_of(Lrc::new(0))).contains(Terminal::new(1)));
        assert_eq!(tables.initial(), &[(Lrc::new(0), root)]);
    }
}
