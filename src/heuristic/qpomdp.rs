use super::Heuristic;
use crate::JointHistory;
use crate::PlanError;
use crate::Problem;
use crate::Result;
use crate::Utility;

/// Finite-horizon POMDP values over the tree of joint action-observation
/// histories, as if every agent saw every observation.
///
/// Values are stored densely per stage, indexed by [`JointHistory::index`].
/// Histories that cannot occur hold zero.
#[derive(Debug, Clone)]
pub struct Qpomdp {
    actions: usize,
    values: Vec<Vec<Utility>>,
}

impl Qpomdp {
    pub fn new<P>(problem: &P, horizon: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        let actions = problem.joint_actions()?.size();
        let observations = problem.joint_observations()?.size();
        let mut values = Vec::with_capacity(horizon);
        for t in 0..horizon {
            let size = JointHistory::space(actions, observations, t)
                .ok()
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| n.checked_mul(actions))
                .ok_or_else(|| PlanError::overflow(format!("QPOMDP table at stage {}", t)))?;
            let mut table = Vec::<Utility>::new();
            table.try_reserve_exact(size)?;
            table.resize(size, 0.0);
            values.push(table);
        }
        let mut this = Self { actions, values };
        if horizon > 0 {
            let root = JointHistory::root(problem);
            this.fill(problem, &root, (actions, observations))?;
        }
        log::debug!("computed QPOMDP over {} stages", horizon);
        Ok(this)
    }

    /// Back up the subtree below `history`, returning its optimal value.
    fn fill<P>(&mut self, problem: &P, history: &JointHistory, pairs: (usize, usize)) -> Result<Utility>
    where
        P: Problem + ?Sized,
    {
        let t = history.stage();
        let last = t + 1 == self.values.len();
        let discount = problem.discount();
        let mut best = Utility::NEG_INFINITY;
        for a in 0..self.actions {
            let mut q = history.belief().reward(problem, a);
            if !last {
                for o in 0..pairs.1 {
                    let (child, p) = history.branch(problem, a, o, pairs)?;
                    if p > 0.0 {
                        q += discount * p * self.fill(problem, &child, pairs)?;
                    }
                }
            }
            self.values[t][history.index() as usize * self.actions + a] = q;
            best = best.max(q);
        }
        Ok(best)
    }
}

impl Heuristic for Qpomdp {
    fn q(&self, history: &JointHistory, joint: usize) -> Utility {
        self.values[history.stage()][history.index() as usize * self.actions + joint]
    }
    fn horizon(&self) -> usize {
        self.values.len()
    }
}
