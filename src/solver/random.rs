use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use crate::BayesianGame;
use crate::LocalPolicy;
use crate::RANDOM_SAMPLES;
use crate::Result;
use rand::Rng;
use rand::rngs::SmallRng;

/// Uniformly random local policies, a floor for the other solvers.
///
/// Draws k policies for a bounded request and `samples` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RandomSolver {
    pub samples: usize,
}

impl Default for RandomSolver {
    fn default() -> Self {
        Self {
            samples: RANDOM_SAMPLES,
        }
    }
}

impl Solve for RandomSolver {
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>> {
        let ref mut ticker = request.deadline.ticker("random");
        let mut ranking = Ranking::new(request.width, request.bounds.lower);
        for _ in 0..request.width.limit().unwrap_or(self.samples) {
            ticker.tick()?;
            let policy = LocalPolicy::new(
                (0..game.agents())
                    .map(|i| (0..game.types(i)).map(|_| rng.random_range(0..game.actions(i))).collect())
                    .collect(),
            );
            ranking.offer(&policy, game.value(&policy));
        }
        Ok(ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        false
    }
}
