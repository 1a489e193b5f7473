use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use crate::AM_RESTARTS;
use crate::BayesianGame;
use crate::LocalPolicy;
use crate::REWARD_TOLERANCE;
use crate::Result;
use crate::Utility;
use rand::Rng;
use rand::rngs::SmallRng;

/// Alternating maximization (best-response hill climbing).
///
/// Starting from a random local policy, each agent in turn replaces its
/// policy by a best response to the others until no agent can improve.
/// The fixed point is a pure Nash equilibrium of the identical-payoff
/// game, not necessarily its optimum, so several restarts are made.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AlternatingMaximization {
    pub restarts: usize,
}

impl Default for AlternatingMaximization {
    fn default() -> Self {
        Self {
            restarts: AM_RESTARTS,
        }
    }
}

impl AlternatingMaximization {
    /// Best response of `agent`, one type at a time. Returns whether any
    /// action strictly improved.
    fn respond(game: &BayesianGame, policy: &mut LocalPolicy, agent: usize, index: &[Vec<Vec<usize>>]) -> bool {
        let stride = game.action_radix().stride(agent);
        let mut improved = false;
        for (ty, jts) in index[agent].iter().enumerate() {
            let current = policy.action(agent, ty);
            let payoff = |a: usize| -> Utility {
                jts.iter()
                    .map(|jt| {
                        let ja = game.joint_action(&*policy, *jt) - stride * current + stride * a;
                        game.probability(*jt) * game.utility(*jt, ja)
                    })
                    .sum()
            };
            let incumbent = payoff(current);
            let (best, value) = (0..game.actions(agent))
                .map(|a| (a, payoff(a)))
                .fold((current, incumbent), |acc, x| if x.1 > acc.1 { x } else { acc });
            if best != current && value > incumbent + REWARD_TOLERANCE {
                policy.set(agent, ty, best);
                improved = true;
            }
        }
        improved
    }

    /// `index[agent][type]` lists the joint types involving that type.
    fn index(game: &BayesianGame) -> Vec<Vec<Vec<usize>>> {
        let mut index = game
            .type_counts()
            .iter()
            .map(|n| vec![Vec::new(); *n])
            .collect::<Vec<Vec<Vec<usize>>>>();
        for jt in (0..game.joint_types()).filter(|jt| game.probability(*jt) > 0.0) {
            for (i, ty) in game.type_digits(jt).iter().enumerate() {
                index[i][*ty].push(jt);
            }
        }
        index
    }
}

impl Solve for AlternatingMaximization {
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>> {
        let ref mut ticker = request.deadline.ticker("alternating maximization");
        let ref index = Self::index(game);
        let mut ranking = Ranking::new(request.width, request.bounds.lower);
        for _ in 0..self.restarts.max(1) {
            ticker.tick()?;
            let mut policy = LocalPolicy::new(
                (0..game.agents())
                    .map(|i| (0..game.types(i)).map(|_| rng.random_range(0..game.actions(i))).collect())
                    .collect(),
            );
            loop {
                ticker.tick()?;
                let improved = (0..game.agents())
                    .map(|i| Self::respond(game, &mut policy, i, index))
                    .fold(false, |any, x| any || x);
                if !improved {
                    break;
                }
            }
            ranking.offer(&policy, game.value(&policy));
        }
        Ok(ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        false
    }
}
