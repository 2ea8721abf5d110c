//! Persistent reduction paths.
//!
//! A [`Suffix`] is the path of reductions from an entry configuration's
//! initial node of the reachable-reduction graph down to some coverage-tree
//! node, stored innermost first. Tails are shared through [`Rc`], so every
//! node of a coverage tree can hold its full path for the price of one cell.

use crate::index::{Lrc, Node, Production};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suffix {
    /// The entry configuration and its initial node
    Top { entry: Lrc, node: Node },
    /// One reduction step into `node`, after `tail`
    Reduce {
        node: Node,
        production: Production,
        depth: usize,
        tail: Rc<Suffix>,
    },
}

/// One step of a suffix, in root-to-leaf order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub node: Node,
    pub production: Production,
    pub depth: usize,
}

impl Suffix {
    #[must_use]
    pub fn top(entry: Lrc, node: Node) -> Rc<Self> {
        Rc::new(Self::Top { entry, node })
    }

    /// Extend `tail` with one reduction into `node`
    #[must_use]
    pub fn reduce(tail: &Rc<Self>, node: Node, production: Production, depth: usize) -> Rc<Self> {
        Rc::new(Self::Reduce {
            node,
            production,
            depth,
            tail: Rc::clone(tail),
        })
    }

    /// Node reached by the whole path
    #[must_use]
    pub const fn node(&self) -> Node {
        match self {
            Self::Top { node, .. } | Self::Reduce { node, .. } => *node,
        }
    }

    fn top_cell(&self) -> (Lrc, Node) {
        let mut current = self;
        loop {
            match current {
                Self::Top { entry, node } => return (*entry, *node),
                Self::Reduce { tail, .. } => current = tail,
            }
        }
    }

    /// Entry node the path starts from
    #[must_use]
    pub fn root(&self) -> Node {
        self.top_cell().1
    }

    /// Entry configuration the path starts from
    #[must_use]
    pub fn entry(&self) -> Lrc {
        self.top_cell().0
    }

    /// Number of reduction steps
    #[must_use]
    pub fn len(&self) -> usize {
        let mut length = 0;
        let mut current = self;
        while let Self::Reduce { tail, .. } = current {
            length += 1;
            current = tail;
        }
        length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Top { .. })
    }

    /// Reduction steps from the entry node to the end of the path
    #[must_use]
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut current = self;
        while let Self::Reduce {
            node,
            production,
            depth,
            tail,
        } = current
        {
            steps.push(Step {
                node: *node,
                production: *production,
                depth: *depth,
            });
            current = tail;
        }
        steps.reverse();
        steps
    }

    /// Every node along the path, entry node first
    #[must_use]
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes = vec![self.root()];
        nodes.extend(self.steps().into_iter().map(|step| step.node));
        nodes
    }
}
