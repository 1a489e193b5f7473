use crate::Histories;
use crate::JointPolicy;
use crate::PlanError;
use crate::Probability;
use crate::Problem;
use crate::Radix;
use crate::Result;
use crate::Utility;

/// Expected discounted return of `policy` over `horizon` stages.
pub fn evaluate<P>(problem: &P, policy: &JointPolicy, horizon: usize) -> Result<Utility>
where
    P: Problem + ?Sized,
{
    if policy.agents() != problem.agents() || policy.horizon() < horizon {
        return Err(PlanError::InconsistentScope(format!(
            "policy for {} agents over {} stages, problem has {} agents over {}",
            policy.agents(),
            policy.horizon(),
            problem.agents(),
            horizon
        )));
    }
    let forward = Forward {
        problem,
        policy,
        horizon,
        histories: Histories::new(problem, horizon)?,
        actions: problem.joint_actions()?,
        observations: problem.joint_observations()?,
    };
    match horizon {
        0 => Ok(0.0),
        _ => Ok(forward.value(0, &vec![0; problem.agents()], problem.initial().to_vec())),
    }
}

struct Forward<'a, P: ?Sized> {
    problem: &'a P,
    policy: &'a JointPolicy,
    horizon: usize,
    histories: Histories,
    actions: Radix,
    observations: Radix,
}

impl<P> Forward<'_, P>
where
    P: Problem + ?Sized,
{
    /// Return from `stage` on, weighted by the unnormalised state
    /// occupancy `mass` of the joint history `locals`.
    fn value(&self, stage: usize, locals: &[usize], mass: Vec<Probability>) -> Utility {
        let p = self.problem;
        let joint = self.actions.joint(
            &locals
                .iter()
                .enumerate()
                .map(|(i, h)| self.policy.action(i, stage, *h))
                .collect::<Vec<_>>(),
        );
        let reward = mass
            .iter()
            .enumerate()
            .map(|(s, m)| m * p.reward(s, joint))
            .sum::<Utility>();
        if stage + 1 == self.horizon {
            return reward;
        }
        let future = (0..self.observations.size())
            .filter_map(|jo| {
                let next = (0..p.states())
                    .map(|s2| {
                        p.observation(joint, s2, jo)
                            * mass
                                .iter()
                                .enumerate()
                                .map(|(s, m)| m * p.transition(s, joint, s2))
                                .sum::<Probability>()
                    })
                    .collect::<Vec<_>>();
                match next.iter().sum::<Probability>() > 0.0 {
                    false => None,
                    true => {
                        let locals = self
                            .observations
                            .split(jo)
                            .into_iter()
                            .enumerate()
                            .map(|(i, o)| self.histories.extend(i, locals[i], o))
                            .collect::<Vec<_>>();
                        Some(self.value(stage + 1, &locals, next))
                    }
                }
            })
            .sum::<Utility>();
        reward + p.discount() * future
    }
}
