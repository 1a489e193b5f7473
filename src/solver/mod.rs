//! Bayesian game solvers.
//!
//! Every solver answers the same question: given a stage game, return up
//! to k local policies ranked by expected payoff. They differ in cost and
//! in whether the ranking is guaranteed correct.
//!
//! | solver                  | exact | character                          |
//! |-------------------------|-------|------------------------------------|
//! | BruteForce              | yes   | enumerate every local policy       |
//! | BranchAndBound          | yes   | DFS over joint types with bounds   |
//! | AlternatingMaximization | no    | best-response hill climbing        |
//! | CrossEntropy            | no    | sample, select elites, refit       |
//! | MaxPlus                 | no    | max-sum on the type factor graph   |
//! | Random                  | no    | uniform sampling baseline          |
//!
//! [`BgSolver`] closes the family into a single tagged enum; its variants
//! carry their own configuration and it doubles as the factory the search
//! is configured with.

mod alternating;
mod branch;
mod brute;
mod deadline;
mod entropy;
mod maxplus;
mod random;
mod ranking;

pub use alternating::*;
pub use branch::*;
pub use brute::*;
pub use deadline::*;
pub use entropy::*;
pub use maxplus::*;
pub use random::*;
pub use ranking::*;

use crate::BayesianGame;
use crate::LocalPolicy;
use crate::PlanError;
use crate::REWARD_TOLERANCE;
use crate::Result;
use crate::Utility;
use rand::rngs::SmallRng;

/// How many solutions a caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Width {
    /// Every solution that is not pruned by the lower bound.
    All,
    /// At most this many.
    Top(usize),
}

impl Width {
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Top(k) => Some(*k),
        }
    }
    /// Whether a collection of `n` items is already full.
    pub fn full(&self, n: usize) -> bool {
        self.limit().is_some_and(|k| n >= k)
    }
}

/// Payoff bounds handed down by the search.
///
/// Solutions worth less than `lower` cannot improve the search and may be
/// dropped. Reaching `upper` means no better solution exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: Utility,
    pub upper: Utility,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            lower: Utility::NEG_INFINITY,
            upper: Utility::INFINITY,
        }
    }
}

impl Bounds {
    pub fn reaches(&self, value: Utility) -> bool {
        value >= self.upper - REWARD_TOLERANCE
    }
}

/// Everything a solver needs besides the game itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Request {
    pub width: Width,
    pub bounds: Bounds,
    pub deadline: Deadline,
}

impl Request {
    pub fn new(width: Width) -> Self {
        Self {
            width,
            bounds: Bounds::default(),
            deadline: Deadline::none(),
        }
    }
    pub fn bounds(self, bounds: Bounds) -> Self {
        Self { bounds, ..self }
    }
    pub fn deadline(self, deadline: Deadline) -> Self {
        Self { deadline, ..self }
    }
    /// Only the single best solution is wanted and the upper bound is known.
    fn stops_at_upper(&self) -> bool {
        self.width == Width::Top(1) && self.bounds.upper.is_finite()
    }
}

/// A local policy together with its expected payoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub policy: LocalPolicy,
    pub value: Utility,
}

/// Capability shared by every Bayesian game solver.
pub trait Solve {
    /// Up to `request.width` solutions in non-increasing order of value,
    /// without duplicate policies.
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>>;
    /// Whether the returned ranking is guaranteed optimal.
    fn is_exact(&self) -> bool;
}

/// The closed set of solver algorithms, each with its configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum BgSolver {
    BruteForce(BruteForce),
    BranchAndBound(BranchAndBound),
    AlternatingMaximization(AlternatingMaximization),
    CrossEntropy(CrossEntropy),
    MaxPlus(MaxPlus),
    Random(RandomSolver),
}

impl BgSolver {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BruteForce(_) => "brute-force",
            Self::BranchAndBound(_) => "branch-and-bound",
            Self::AlternatingMaximization(_) => "alternating-maximization",
            Self::CrossEntropy(_) => "cross-entropy",
            Self::MaxPlus(_) => "max-plus",
            Self::Random(_) => "random",
        }
    }
}

impl Default for BgSolver {
    fn default() -> Self {
        Self::BruteForce(BruteForce::default())
    }
}

impl Solve for BgSolver {
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>> {
        request.deadline.check(self.name())?;
        match self {
            Self::BruteForce(s) => s.solve(game, request, rng),
            Self::BranchAndBound(s) => s.solve(game, request, rng),
            Self::AlternatingMaximization(s) => s.solve(game, request, rng),
            Self::CrossEntropy(s) => s.solve(game, request, rng),
            Self::MaxPlus(s) => s.solve(game, request, rng),
            Self::Random(s) => s.solve(game, request, rng),
        }
    }
    fn is_exact(&self) -> bool {
        match self {
            Self::BruteForce(s) => s.is_exact(),
            Self::BranchAndBound(s) => s.is_exact(),
            Self::AlternatingMaximization(s) => s.is_exact(),
            Self::CrossEntropy(s) => s.is_exact(),
            Self::MaxPlus(s) => s.is_exact(),
            Self::Random(s) => s.is_exact(),
        }
    }
}

/// Solvers by short name, with default parameters.
impl std::str::FromStr for BgSolver {
    type Err = PlanError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bf" | "brute-force" => Ok(Self::BruteForce(BruteForce::default())),
            "bnb" | "branch-and-bound" => Ok(Self::BranchAndBound(BranchAndBound::default())),
            "am" | "alternating-maximization" => {
                Ok(Self::AlternatingMaximization(AlternatingMaximization::default()))
            }
            "ce" | "cross-entropy" => Ok(Self::CrossEntropy(CrossEntropy::default())),
            "mp" | "max-plus" => Ok(Self::MaxPlus(MaxPlus::default())),
            "random" => Ok(Self::Random(RandomSolver::default())),
            other => Err(PlanError::Setup(format!("unrecognized solver {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::time::Duration;

    const SEEDS: [u64; 4] = [1, 2, 3, 4];

    fn optimum(game: &BayesianGame) -> Utility {
        BgSolver::default()
            .solve(game, &Request::new(Width::Top(1)), &mut SmallRng::seed_from_u64(0))
            .unwrap()[0]
            .value
    }

    fn ordered(solutions: &[Solution]) -> bool {
        solutions.windows(2).all(|w| w[0].value >= w[1].value)
    }

    fn distinct(solutions: &[Solution]) -> bool {
        let set = solutions
            .iter()
            .map(|s| &s.policy)
            .collect::<std::collections::HashSet<_>>();
        set.len() == solutions.len()
    }

    macro_rules! solver {
        ($($name:ident: $solver:expr),* $(,)?) => {
            $(
                paste::paste! {
                    #[test]
                    fn [<$name _ranks_distinct_solutions>]() {
                        let solver: BgSolver = $solver;
                        for seed in SEEDS {
                            let game = BayesianGame::random(vec![2, 3], vec![3, 2], seed).unwrap();
                            let ref mut rng = SmallRng::seed_from_u64(seed);
                            let solutions = solver.solve(&game, &Request::new(Width::Top(5)), rng).unwrap();
                            assert!(!solutions.is_empty());
                            assert!(solutions.len() <= 5);
                            assert!(ordered(&solutions), "{} out of order", solver.name());
                            assert!(distinct(&solutions), "{} repeats a policy", solver.name());
                            for s in solutions.iter() {
                                assert!((game.value(&s.policy) - s.value).abs() < 1e-9);
                            }
                        }
                    }

                    #[test]
                    fn [<$name _never_beats_the_optimum>]() {
                        let solver: BgSolver = $solver;
                        for seed in SEEDS {
                            let game = BayesianGame::random(vec![3, 3], vec![2, 2], seed).unwrap();
                            let ref mut rng = SmallRng::seed_from_u64(seed);
                            let best = solver.solve(&game, &Request::new(Width::Top(1)), rng).unwrap();
                            assert!(best[0].value <= optimum(&game) + 1e-9);
                            if solver.is_exact() {
                                assert!((best[0].value - optimum(&game)).abs() < 1e-9);
                            }
                        }
                    }

                    #[test]
                    fn [<$name _fails_on_an_expired_deadline>]() {
                        let solver: BgSolver = $solver;
                        let game = BayesianGame::random(vec![2, 2], vec![2, 2], 0).unwrap();
                        let request = Request::new(Width::Top(1)).deadline(Deadline::after(Duration::ZERO));
                        let result = solver.solve(&game, &request, &mut SmallRng::seed_from_u64(0));
                        assert!(matches!(result, Err(PlanError::DeadlineExceeded { .. })));
                    }
                }
            )*
        };
    }

    #[rustfmt::skip]
    solver!(
        brute_force:              BgSolver::BruteForce(BruteForce::default()),
        branch_and_bound:         BgSolver::BranchAndBound(BranchAndBound::default()),
        branch_and_bound_list:    BgSolver::BranchAndBound(BranchAndBound { order: TypeOrder::Index, retention: Retention::Unbounded }),
        alternating_maximization: BgSolver::AlternatingMaximization(AlternatingMaximization::default()),
        cross_entropy:            BgSolver::CrossEntropy(CrossEntropy::default()),
        cross_entropy_soft:       BgSolver::CrossEntropy(CrossEntropy { selection: Selection::Soft, ..CrossEntropy::default() }),
        max_plus_parallel:        BgSolver::MaxPlus(MaxPlus::default()),
        max_plus_serial:          BgSolver::MaxPlus(MaxPlus { schedule: Schedule::Serial, ..MaxPlus::default() }),
        random:                   BgSolver::Random(RandomSolver::default()),
    );

    #[test]
    fn exactness_is_declared_per_algorithm() {
        let exact = ["bf", "bnb"];
        for name in ["bf", "bnb", "am", "ce", "mp", "random"] {
            let solver = name.parse::<BgSolver>().unwrap();
            assert_eq!(solver.is_exact(), exact.contains(&name));
        }
        assert!(matches!("simplex".parse::<BgSolver>(), Err(PlanError::Setup(_))));
    }

    #[test]
    fn solvers_deserialize_from_tagged_json() {
        let json = r#"{ "algorithm": "cross-entropy", "restarts": 3, "samples": 20 }"#;
        let solver = serde_json::from_str::<BgSolver>(json).unwrap();
        match solver {
            BgSolver::CrossEntropy(ce) => {
                assert_eq!(ce.restarts, 3);
                assert_eq!(ce.samples, 20);
                assert_eq!(ce.iterations, crate::CE_ITERATIONS);
            }
            other => panic!("parsed {:?}", other),
        }
    }
}
