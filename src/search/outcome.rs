use crate::JointPolicy;
use crate::Utility;
use std::time::Duration;

/// What a call to [`crate::Planner::plan`] found, and what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub policy: Option<JointPolicy>,
    /// Value of `policy`, negative infinity when none was found.
    pub value: Utility,
    pub max_pool: usize,
    /// Stage game solutions consumed by the search.
    pub evaluated: usize,
    pub games: usize,
    /// Children created per depth.
    pub expanded: Vec<usize>,
    /// Local policies of the games solved per depth, saturating.
    pub expandable: Vec<u128>,
    pub restarts_completed: usize,
    pub restarts_aborted: usize,
    pub elapsed: Duration,
}

impl Outcome {
    pub fn new(horizon: usize) -> Self {
        Self {
            policy: None,
            value: Utility::NEG_INFINITY,
            max_pool: 0,
            evaluated: 0,
            games: 0,
            expanded: vec![0; horizon + 1],
            expandable: vec![0; horizon + 1],
            restarts_completed: 0,
            restarts_aborted: 0,
            elapsed: Duration::ZERO,
        }
    }
    pub fn found(&self) -> bool {
        self.policy.is_some()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "┌────────────┬──────────────────────────────────────────┐")?;
        writeln!(f, "│ Value      │ {:>40.6} │", self.value)?;
        writeln!(f, "│ Pool (max) │ {:>40} │", self.max_pool)?;
        writeln!(f, "│ Games      │ {:>40} │", self.games)?;
        writeln!(f, "│ Evaluated  │ {:>40} │", self.evaluated)?;
        writeln!(f, "│ Restarts   │ {:>31} ok {:>3} x │", self.restarts_completed, self.restarts_aborted)?;
        writeln!(f, "│ Elapsed    │ {:>40} │", format!("{:.3?}", self.elapsed))?;
        writeln!(f, "├────────────┼──────────────────────────────────────────┤")?;
        for (depth, (children, space)) in self.expanded.iter().zip(self.expandable.iter()).enumerate() {
            writeln!(f, "│ Depth {:<4} │ {:>12} children {:>18} │", depth, children, space)?;
        }
        write!(f, "└────────────┴──────────────────────────────────────────┘")
    }
}
