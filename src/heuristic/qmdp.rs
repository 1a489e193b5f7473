use super::Heuristic;
use crate::JointHistory;
use crate::Problem;
use crate::Result;
use crate::Utility;

/// Finite-horizon MDP values averaged over the history's belief.
#[derive(Debug, Clone)]
pub struct Qmdp {
    actions: usize,
    values: Vec<Vec<Utility>>,
}

impl Qmdp {
    pub fn new<P>(problem: &P, horizon: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        let n = problem.states();
        let actions = problem.joint_actions()?.size();
        let discount = problem.discount();
        let mut values = Vec::<Vec<Utility>>::with_capacity(horizon);
        let mut future = vec![0.0; n];
        for _ in (0..horizon).rev() {
            let stage = (0..n)
                .flat_map(|s| (0..actions).map(move |a| (s, a)))
                .map(|(s, a)| {
                    problem.reward(s, a)
                        + discount
                            * (0..n)
                                .map(|s2| problem.transition(s, a, s2) * future[s2])
                                .sum::<Utility>()
                })
                .collect::<Vec<_>>();
            future = stage
                .chunks(actions)
                .map(|row| row.iter().copied().fold(Utility::NEG_INFINITY, Utility::max))
                .collect();
            values.push(stage);
        }
        values.reverse();
        log::debug!("computed QMDP over {} stages", horizon);
        Ok(Self { actions, values })
    }
    /// Q(s, ja) at a stage.
    pub fn state(&self, stage: usize, state: usize, joint: usize) -> Utility {
        self.values[stage][state * self.actions + joint]
    }
}

impl Heuristic for Qmdp {
    fn q(&self, history: &JointHistory, joint: usize) -> Utility {
        history
            .belief()
            .states()
            .iter()
            .enumerate()
            .filter(|(_, b)| **b > 0.0)
            .map(|(s, b)| b * self.state(history.stage(), s, joint))
            .sum()
    }
    fn horizon(&self) -> usize {
        self.values.len()
    }
}
