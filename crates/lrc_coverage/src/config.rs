/// Traversal order of the coverage explorers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduling {
    /// Depth-first: follow one reduction path to its end before the next
    #[default]
    Dfs,
    /// Breadth-first: expand all nodes of one depth before the next
    Bfs,
}

impl Scheduling {
    /// The other order, used for the schedule consistency check
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Dfs => Self::Bfs,
            Self::Bfs => Self::Dfs,
        }
    }
}

/// Configuration for coverage analysis and sentence generation
#[derive(Debug, Clone)]
pub struct CoverageConfig {
    /// Order used to build the coverage trees sentences are read from
    pub scheduling: Scheduling,

    /// Also run the other order and compare aggregate counts
    pub check_schedules: bool,

    /// Rebuild each stack from node bookkeeping and compare with the Form replay
    pub cross_validate: bool,

    /// Trailing character stripped from entrypoint names (augmented start symbols)
    pub entrypoint_marker: char,

    /// Print the item sets of every step along a sentence's reduction path
    pub emit_items: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            scheduling: Scheduling::Dfs,
            check_schedules: true,
            cross_validate: true,
            entrypoint_marker: '\'',
            emit_items: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_order() {
        assert_eq!(Scheduling::Dfs.other(), Scheduling::Bfs);
        assert_eq!(Scheduling::Bfs.other(), Scheduling::Dfs);
        assert_eq!(Scheduling::default().other().other(), Scheduling::Dfs);
    }
}
