use crate::JointPolicy;
use crate::PlanError;
use crate::Probability;
use crate::Problem;
use crate::Result;
use crate::Utility;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Monte Carlo estimate of a policy's return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    pub mean: Utility,
    /// Standard error of `mean`.
    pub stderr: Utility,
    pub episodes: usize,
}

impl Simulation {
    /// Whether `value` lies within `z` standard errors of the mean.
    pub fn consistent(&self, value: Utility, z: f64) -> bool {
        (self.mean - value).abs() <= z * self.stderr + crate::REWARD_TOLERANCE
    }
}

impl std::fmt::Display for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.4} ± {:.4} over {} episodes", self.mean, self.stderr, self.episodes)
    }
}

/// Sample `episodes` rollouts of `policy` over `horizon` stages.
pub fn simulate<P, R>(problem: &P, policy: &JointPolicy, horizon: usize, episodes: usize, rng: &mut R) -> Result<Simulation>
where
    P: Problem + ?Sized,
    R: Rng + ?Sized,
{
    if episodes == 0 {
        return Err(PlanError::Setup("cannot simulate zero episodes".into()));
    }
    if policy.horizon() < horizon || policy.agents() != problem.agents() {
        return Err(PlanError::InconsistentScope(format!(
            "policy covers {} stages of {} agents",
            policy.horizon(),
            policy.agents()
        )));
    }
    let actions = problem.joint_actions()?;
    let observations = problem.joint_observations()?;
    let weighted = |weights: Vec<Probability>| WeightedIndex::new(weights).map_err(|e| PlanError::Invariant(e.to_string()));
    let start = weighted(problem.initial().to_vec())?;
    let mut returns = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        let mut state = start.sample(rng);
        let mut locals = vec![0; problem.agents()];
        let mut total = 0.0;
        let mut scale = 1.0;
        for stage in 0..horizon {
            let joint = actions.joint(
                &locals
                    .iter()
                    .enumerate()
                    .map(|(i, h)| policy.action(i, stage, *h))
                    .collect::<Vec<_>>(),
            );
            total += scale * problem.reward(state, joint);
            scale *= problem.discount();
            if stage + 1 == horizon {
                break;
            }
            let next = weighted((0..problem.states()).map(|s2| problem.transition(state, joint, s2)).collect())?.sample(rng);
            let observed = weighted((0..observations.size()).map(|jo| problem.observation(joint, next, jo)).collect())?.sample(rng);
            for (i, o) in observations.split(observed).into_iter().enumerate() {
                locals[i] = locals[i] * problem.observations(i) + o;
            }
            state = next;
        }
        returns.push(total);
    }
    let n = episodes as Utility;
    let mean = returns.iter().sum::<Utility>() / n;
    let variance = match episodes {
        1 => 0.0,
        _ => returns.iter().map(|r| (r - mean).powi(2)).sum::<Utility>() / (n - 1.0),
    };
    Ok(Simulation {
        mean,
        stderr: (variance / n).sqrt(),
        episodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;
    use crate::evaluate;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn rollouts_agree_with_exact_evaluation() {
        let tiger = DecPomdp::tiger();
        // listen first, then open the door opposite the first observation
        let stage = |t: usize| match t {
            0 => vec![0],
            _ => vec![2, 1],
        };
        let policy = JointPolicy::new(vec![vec![stage(0), stage(1)], vec![stage(0), stage(1)]]);
        let exact = evaluate(&tiger, &policy, 2).unwrap();
        let ref mut rng = SmallRng::seed_from_u64(0);
        let estimate = simulate(&tiger, &policy, 2, 20_000, rng).unwrap();
        assert!(estimate.consistent(exact, 4.0), "{} vs {}", estimate, exact);
    }
}
