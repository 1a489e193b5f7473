use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use crate::BayesianGame;
use crate::CE_ALPHA;
use crate::CE_ELITES;
use crate::CE_ITERATIONS;
use crate::CE_RESTARTS;
use crate::CE_SAMPLES;
use crate::LocalPolicy;
use crate::Probability;
use crate::Result;
use crate::Utility;
use rand::Rng;
use rand::rngs::SmallRng;

/// Elite selection rule of the cross-entropy method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// The `elites` best samples of each iteration.
    #[default]
    Hard,
    /// Among the `elites` best, only samples at least as good as the worst
    /// elite of the previous iteration.
    Soft,
}

/// Cross-entropy optimization over local policies.
///
/// Every (agent, type) pair has a categorical distribution over actions.
/// Each iteration draws `samples` policies, selects elites, and moves the
/// distributions toward the elites' action frequencies with rate `alpha`.
/// | parameter    | default |
/// |--------------|---------|
/// | `restarts`   | 10      |
/// | `iterations` | 50      |
/// | `samples`    | 50      |
/// | `elites`     | 5       |
/// | `alpha`      | 0.2     |
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CrossEntropy {
    pub restarts: usize,
    pub iterations: usize,
    pub samples: usize,
    pub elites: usize,
    pub alpha: Probability,
    pub selection: Selection,
}

impl Default for CrossEntropy {
    fn default() -> Self {
        Self {
            restarts: CE_RESTARTS,
            iterations: CE_ITERATIONS,
            samples: CE_SAMPLES,
            elites: CE_ELITES,
            alpha: CE_ALPHA,
            selection: Selection::default(),
        }
    }
}

/// Per (agent, type) action distributions.
struct Distribution(Vec<Vec<Vec<Probability>>>);

impl Distribution {
    fn uniform(game: &BayesianGame) -> Self {
        Self(
            (0..game.agents())
                .map(|i| vec![vec![1.0 / game.actions(i) as Probability; game.actions(i)]; game.types(i)])
                .collect(),
        )
    }
    fn sample(&self, rng: &mut SmallRng) -> LocalPolicy {
        LocalPolicy::new(
            self.0
                .iter()
                .map(|types| types.iter().map(|p| categorical(p, rng)).collect())
                .collect(),
        )
    }
    fn learn(&mut self, elites: &[(LocalPolicy, Utility)], alpha: Probability) {
        let weight = 1.0 / elites.len() as Probability;
        for (i, types) in self.0.iter_mut().enumerate() {
            for (ty, p) in types.iter_mut().enumerate() {
                let mut frequency = vec![0.0; p.len()];
                for (policy, _) in elites {
                    frequency[policy.action(i, ty)] += weight;
                }
                for (p, f) in p.iter_mut().zip(frequency) {
                    *p = (1.0 - alpha) * *p + alpha * f;
                }
            }
        }
    }
}

fn categorical(p: &[Probability], rng: &mut SmallRng) -> usize {
    let x = rng.random::<Probability>() * p.iter().sum::<Probability>();
    p.iter()
        .scan(0.0, |cdf, p| {
            *cdf += p;
            Some(*cdf)
        })
        .position(|cdf| x < cdf)
        .unwrap_or(p.len() - 1)
}

impl Solve for CrossEntropy {
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>> {
        let ref mut ticker = request.deadline.ticker("cross entropy");
        let mut ranking = Ranking::new(request.width, request.bounds.lower);
        let elites = self.elites.clamp(1, self.samples.max(1));
        for _ in 0..self.restarts.max(1) {
            let mut distribution = Distribution::uniform(game);
            let mut gamma = Utility::NEG_INFINITY;
            for _ in 0..self.iterations.max(1) {
                let mut population = Vec::with_capacity(self.samples);
                for _ in 0..self.samples.max(1) {
                    ticker.tick()?;
                    let policy = distribution.sample(rng);
                    let value = game.value(&policy);
                    ranking.offer(&policy, value);
                    population.push((policy, value));
                }
                population.sort_by(|a, b| b.1.total_cmp(&a.1));
                population.truncate(elites);
                if self.selection == Selection::Soft {
                    population.retain(|(_, v)| *v >= gamma);
                }
                if let Some((_, worst)) = population.last() {
                    gamma = *worst;
                    distribution.learn(&population, self.alpha);
                }
            }
        }
        Ok(ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn categorical_respects_zero_mass() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..1000 {
            assert_eq!(categorical(&[0.0, 1.0, 0.0], rng), 1);
        }
    }

    #[test]
    fn learning_concentrates_on_elites() {
        let game = BayesianGame::random(vec![1, 1], vec![2, 2], 0).unwrap();
        let mut distribution = Distribution::uniform(&game);
        let elite = (LocalPolicy::new(vec![vec![1], vec![0]]), 0.0);
        for _ in 0..50 {
            distribution.learn(std::slice::from_ref(&elite), 0.5);
        }
        assert!(distribution.0[0][0][1] > 0.99);
        assert!(distribution.0[1][0][0] > 0.99);
    }
}
