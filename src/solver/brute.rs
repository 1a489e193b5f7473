use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use crate::BayesianGame;
use crate::LocalPolicy;
use crate::Result;
use rand::rngs::SmallRng;

/// Exhaustive enumeration of every local policy.
///
/// Cost is `∏ nA_i^nT_i` game evaluations, so this is only practical for
/// small stages, but its ranking is exact and serves as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BruteForce {
    /// Stop as soon as a single requested solution reaches the upper bound.
    pub stop_at_upper: bool,
}

impl Default for BruteForce {
    fn default() -> Self {
        Self {
            stop_at_upper: true,
        }
    }
}

impl Solve for BruteForce {
    fn solve(&self, game: &BayesianGame, request: &Request, _: &mut SmallRng) -> Result<Vec<Solution>> {
        let ref mut ticker = request.deadline.ticker("brute force");
        let mut ranking = Ranking::new(request.width, request.bounds.lower);
        let mut policy = LocalPolicy::zeros(game.type_counts());
        loop {
            ticker.tick()?;
            let value = game.value(&policy);
            ranking.offer(&policy, value);
            if self.stop_at_upper && request.stops_at_upper() && request.bounds.reaches(value) {
                log::trace!("brute force reached the upper bound {:.4}", request.bounds.upper);
                break;
            }
            if !policy.advance(game.action_counts()) {
                break;
            }
        }
        log::trace!(
            "brute force evaluated {} local policies, kept {} up to {:.4}",
            ranking.offers(),
            ranking.len(),
            ranking.best()
        );
        Ok(ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        true
    }
}
