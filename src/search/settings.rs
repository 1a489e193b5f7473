use crate::BgSolver;
use crate::PlanError;
use crate::Result;
use crate::SEARCH_RESTARTS;
use crate::SEARCH_SEED;
use crate::SEARCH_SLACK;
use crate::SEARCH_WIDTH;
use crate::Utility;
use std::time::Duration;

/// Which member of the GMAA* family to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// MAA*: every stage solution becomes a child. Optimal with an exact
    /// solver and an admissible heuristic.
    Exact,
    /// k-GMAA*: only the k best stage solutions become children.
    KBest { k: usize },
}

impl Default for Variant {
    fn default() -> Self {
        Self::KBest { k: SEARCH_WIDTH }
    }
}

/// How many children a single pop of a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expansion {
    /// Every selected child at once.
    #[default]
    Full,
    /// One child per pop; the parent goes back at its next child's priority.
    Incremental,
}

/// When dominated pool entries are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pruning {
    /// As soon as the lower bound rises.
    Eager,
    /// When they reach the top of the pool.
    #[default]
    Lazy,
}

/// Planner configuration, deserializable from JSON.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub horizon: usize,
    pub variant: Variant,
    pub expansion: Expansion,
    pub pruning: Pruning,
    /// Stop once no pool entry beats the lower bound by more than this.
    pub slack: Utility,
    /// Wall-clock budget of each restart, in seconds.
    pub deadline: Option<f64>,
    pub restarts: usize,
    pub seed: u64,
    /// Largest pool tolerated before the restart fails.
    pub pool_limit: Option<usize>,
    /// Merge probabilistically equivalent types before solving each
    /// stage game.
    pub cluster: bool,
    pub solver: BgSolver,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizon: 2,
            variant: Variant::default(),
            expansion: Expansion::default(),
            pruning: Pruning::default(),
            slack: SEARCH_SLACK,
            deadline: None,
            restarts: SEARCH_RESTARTS,
            seed: SEARCH_SEED,
            pool_limit: None,
            cluster: false,
            solver: BgSolver::default(),
        }
    }
}

impl Settings {
    /// Reject configurations the search cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(PlanError::Setup("horizon must be at least 1".into()));
        }
        if self.restarts == 0 {
            return Err(PlanError::Setup("at least one restart is required".into()));
        }
        if !(self.slack >= 0.0 && self.slack.is_finite()) {
            return Err(PlanError::Setup(format!("slack {} is not a finite non-negative number", self.slack)));
        }
        if let Some(seconds) = self.deadline {
            if Duration::try_from_secs_f64(seconds).is_err() {
                return Err(PlanError::Setup(format!("deadline {}s is not a valid duration", seconds)));
            }
        }
        if self.pool_limit == Some(0) {
            return Err(PlanError::Setup("pool limit must be positive".into()));
        }
        match self.variant {
            Variant::KBest { k: 0 } => Err(PlanError::Setup("k-best search needs k > 0".into())),
            Variant::Exact if !crate::Solve::is_exact(&self.solver) => Err(PlanError::Setup(format!(
                "exact search needs an exact solver, {} is not",
                self.solver.name()
            ))),
            _ => Ok(()),
        }
    }
    pub fn budget(&self) -> Option<Duration> {
        self.deadline.and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}
