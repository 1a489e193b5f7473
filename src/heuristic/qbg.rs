use super::Heuristic;
use super::Qmdp;
use crate::BayesianGame;
use crate::JointHistory;
use crate::LocalPolicy;
use crate::PlanError;
use crate::Problem;
use crate::Radix;
use crate::Result;
use crate::Utility;

/// Bayesian game backups over the tree of joint action-observation
/// histories: the joint history is shared, but the next joint
/// observation is only seen privately, one stage late.
///
/// Every (history, joint action) pair is backed up through the one-step
/// game whose types are the agents' next observations. With a `depth`
/// below the horizon the tree is cut there and the remaining stages are
/// scored by [`Qmdp`] on the history's belief (QHybrid).
#[derive(Debug, Clone)]
pub struct Qbg {
    horizon: usize,
    actions: Radix,
    observations: Radix,
    values: Vec<Vec<Utility>>,
    tail: Option<Qmdp>,
}

impl Qbg {
    pub fn new<P>(problem: &P, horizon: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        Self::build(problem, horizon, horizon)
    }

    /// Tree backups for the first `depth` stages only, QMDP afterwards.
    pub fn hybrid<P>(problem: &P, horizon: usize, depth: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        if depth == 0 || depth > horizon {
            return Err(PlanError::Setup(format!(
                "hybrid depth {} outside 1..={}",
                depth, horizon
            )));
        }
        Self::build(problem, horizon, depth)
    }

    fn build<P>(problem: &P, horizon: usize, depth: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        let actions = problem.joint_actions()?;
        let observations = problem.joint_observations()?;
        let mut values = Vec::with_capacity(depth);
        for t in 0..depth {
            let size = JointHistory::space(actions.size(), observations.size(), t)
                .ok()
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| n.checked_mul(actions.size()))
                .ok_or_else(|| PlanError::overflow(format!("QBG table at stage {}", t)))?;
            let mut table = Vec::<Utility>::new();
            table.try_reserve_exact(size)?;
            table.resize(size, 0.0);
            values.push(table);
        }
        let tail = match depth < horizon {
            true => Some(Qmdp::new(problem, horizon)?),
            false => None,
        };
        let mut this = Self {
            horizon,
            actions,
            observations,
            values,
            tail,
        };
        if depth > 0 {
            this.fill(problem, &JointHistory::root(problem))?;
        }
        log::debug!("computed QBG over {} of {} stages", depth, horizon);
        Ok(this)
    }

    /// Back up the subtree below `history`, returning its Q-values.
    fn fill<P>(&mut self, problem: &P, history: &JointHistory) -> Result<Vec<Utility>>
    where
        P: Problem + ?Sized,
    {
        let t = history.stage();
        let pairs = (self.actions.size(), self.observations.size());
        let mut row = Vec::with_capacity(pairs.0);
        for a in 0..pairs.0 {
            let mut q = history.belief().reward(problem, a);
            if t + 1 < self.horizon {
                let mut probability = vec![0.0; pairs.1];
                let mut utility = vec![0.0; pairs.1 * pairs.0];
                for o in 0..pairs.1 {
                    let (child, p) = history.branch(problem, a, o, pairs)?;
                    if p > 0.0 {
                        probability[o] = p;
                        let next = match self.tail.as_ref().filter(|_| t + 1 == self.values.len()) {
                            Some(tail) => (0..pairs.0).map(|b| tail.q(&child, b)).collect(),
                            None => self.fill(problem, &child)?,
                        };
                        utility[o * pairs.0..(o + 1) * pairs.0].copy_from_slice(&next);
                    }
                }
                let game = BayesianGame::new(
                    t + 1,
                    self.observations.sizes().to_vec(),
                    self.actions.sizes().to_vec(),
                    probability,
                    utility.clone(),
                    utility,
                )?;
                q += problem.discount() * optimum(&game);
            }
            self.values[t][history.index() as usize * pairs.0 + a] = q;
            row.push(q);
        }
        Ok(row)
    }
}

/// Best value over every local policy of a small game.
fn optimum(game: &BayesianGame) -> Utility {
    let mut policy = LocalPolicy::zeros(game.type_counts());
    let mut best = game.value(&policy);
    while policy.advance(game.action_counts()) {
        best = best.max(game.value(&policy));
    }
    best
}

impl Heuristic for Qbg {
    fn q(&self, history: &JointHistory, joint: usize) -> Utility {
        match self.values.get(history.stage()) {
            Some(table) => table[history.index() as usize * self.actions.size() + joint],
            None => self.tail.as_ref().map(|tail| tail.q(history, joint)).unwrap_or_default(),
        }
    }
    fn horizon(&self) -> usize {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;
    use crate::Qpomdp;

    fn frontier(tiger: &DecPomdp, stages: usize) -> Vec<JointHistory> {
        let pairs = (9, 4);
        (0..stages).fold(vec![JointHistory::root(tiger)], |frontier, _| {
            frontier
                .iter()
                .flat_map(|h| (0..9).flat_map(move |a| (0..4).map(move |o| (h, a, o))))
                .map(|(h, a, o)| h.step(tiger, a, o, pairs).unwrap())
                .filter(JointHistory::reachable)
                .collect()
        })
    }

    #[test]
    fn sits_between_qpomdp_and_qmdp() {
        let tiger = DecPomdp::tiger();
        let qmdp = Qmdp::new(&tiger, 3).unwrap();
        let qpomdp = Qpomdp::new(&tiger, 3).unwrap();
        let qbg = Qbg::new(&tiger, 3).unwrap();
        for history in (0..2).flat_map(|t| frontier(&tiger, t)) {
            for a in 0..9 {
                assert!(qbg.q(&history, a) <= qpomdp.q(&history, a) + 1e-9);
                assert!(qpomdp.q(&history, a) <= qmdp.q(&history, a) + 1e-9);
            }
        }
        let root = JointHistory::root(&tiger);
        assert!((0..9).any(|a| qbg.q(&root, a) < qpomdp.q(&root, a) - 1e-6));
    }

    #[test]
    fn last_stage_is_the_belief_reward() {
        let tiger = DecPomdp::tiger();
        let qbg = Qbg::new(&tiger, 1).unwrap();
        let root = JointHistory::root(&tiger);
        assert_eq!(qbg.q(&root, 0), -2.0);
        assert_eq!(qbg.q(&root, 8), -15.0);
        assert_eq!(qbg.horizon(), 1);
    }

    #[test]
    fn hybrid_cuts_the_tree_with_qmdp() {
        let tiger = DecPomdp::tiger();
        let qmdp = Qmdp::new(&tiger, 3).unwrap();
        let qbg = Qbg::new(&tiger, 3).unwrap();
        let hybrid = Qbg::hybrid(&tiger, 3, 1).unwrap();
        assert_eq!(hybrid.horizon(), 3);
        for history in frontier(&tiger, 1) {
            for a in 0..9 {
                assert_eq!(hybrid.q(&history, a), qmdp.q(&history, a));
            }
        }
        let root = JointHistory::root(&tiger);
        for a in 0..9 {
            assert!(qbg.q(&root, a) <= hybrid.q(&root, a) + 1e-9);
            assert!(hybrid.q(&root, a) <= qmdp.q(&root, a) + 1e-9);
        }
        assert!(matches!(Qbg::hybrid(&tiger, 3, 0), Err(PlanError::Setup(_))));
        assert!(matches!(Qbg::hybrid(&tiger, 3, 4), Err(PlanError::Setup(_))));
    }
}
