use super::BayesianGame;
use super::Clusters;
use crate::Arena;
use crate::Heuristic;
use crate::Histories;
use crate::JointHistory;
use crate::PlanError;
use crate::PolicyId;
use crate::Probability;
use crate::Problem;
use crate::Radix;
use crate::Result;
use crate::Utility;

/// A joint observation history reached under the past policy.
struct Branch {
    locals: Vec<usize>,
    history: JointHistory,
}

/// Filled-in table rows for one joint type.
struct Row {
    jt: usize,
    probability: Probability,
    belief: Vec<Probability>,
    utility: Vec<Utility>,
    reward: Vec<Utility>,
}

/// Stage game tables before they are frozen into a [`BayesianGame`].
/// Joint types keep the belief of their joint history so equivalent
/// types can still be told apart.
pub(super) struct Tables {
    pub(super) stage: usize,
    pub(super) types: Vec<usize>,
    pub(super) actions: Vec<usize>,
    pub(super) width: usize,
    pub(super) probability: Vec<Probability>,
    pub(super) beliefs: Vec<Vec<Probability>>,
    pub(super) utility: Vec<Utility>,
    pub(super) reward: Vec<Utility>,
}

impl Tables {
    fn game(self) -> Result<BayesianGame> {
        BayesianGame::new(
            self.stage,
            self.types,
            self.actions,
            self.probability,
            self.utility,
            self.reward,
        )
    }
}

/// Builds the stage Bayesian game of a partial policy.
///
/// Starting from the initial belief, the joint observation histories are
/// expanded one stage at a time with the joint action the partial policy
/// prescribes for each of them. The final frontier is exactly the set of
/// joint types; each reachable one is scored with the heuristic.
pub struct StageBuilder<'a, P, H>
where
    P: Problem + ?Sized,
    H: Heuristic + ?Sized,
{
    problem: &'a P,
    heuristic: &'a H,
    histories: &'a Histories,
    actions: Radix,
    observations: Radix,
}

impl<'a, P, H> StageBuilder<'a, P, H>
where
    P: Problem + ?Sized,
    H: Heuristic + ?Sized,
{
    pub fn new(problem: &'a P, heuristic: &'a H, histories: &'a Histories) -> Result<Self> {
        if heuristic.horizon() != histories.horizon() {
            return Err(PlanError::Setup(format!(
                "heuristic spans {} stages, horizon is {}",
                heuristic.horizon(),
                histories.horizon()
            )));
        }
        Ok(Self {
            problem,
            heuristic,
            histories,
            actions: problem.joint_actions()?,
            observations: problem.joint_observations()?,
        })
    }

    /// The game for stage `depth` of the policy `id`.
    pub fn build(&self, arena: &Arena, id: PolicyId) -> Result<BayesianGame> {
        self.tables(arena, id)?.game()
    }

    /// Like [`StageBuilder::build`], with probabilistically equivalent
    /// types of every agent merged. Policies of the clustered game map back
    /// onto histories through the returned [`Clusters`].
    pub fn cluster(&self, arena: &Arena, id: PolicyId) -> Result<(BayesianGame, Clusters)> {
        let mut tables = self.tables(arena, id)?;
        let clusters = tables.cluster()?;
        if !clusters.is_identity() {
            log::trace!(
                "stage {} types {:?} cluster into {:?}",
                tables.stage,
                clusters.types(),
                clusters.counts()
            );
        }
        Ok((tables.game()?, clusters))
    }

    fn tables(&self, arena: &Arena, id: PolicyId) -> Result<Tables> {
        let stage = arena.get(id)?.depth();
        if stage >= self.histories.horizon() {
            return Err(PlanError::InconsistentScope(format!(
                "policy of depth {} has no stage left within horizon {}",
                stage,
                self.histories.horizon()
            )));
        }
        let chain = arena.chain(id)?;
        for (k, node) in chain.iter().enumerate() {
            let expected = self.histories.counts(k);
            let found = (0..node.agents()).map(|i| node.actions(i).len()).collect::<Vec<_>>();
            if found != expected {
                return Err(PlanError::InconsistentScope(format!(
                    "stage {} assigns {:?} histories, expected {:?}",
                    k, found, expected
                )));
            }
        }
        let counts = self.histories.counts(stage);
        let types = Radix::new(counts.clone())?;
        let actions = self.actions.sizes().to_vec();
        super::policies(&actions, &counts)?;
        let cells = types
            .size()
            .checked_mul(self.actions.size())
            .ok_or_else(|| PlanError::overflow(format!("stage {} game tables", stage)))?;

        let n = self.problem.agents();
        let pairs = (self.actions.size(), self.observations.size());
        let mut frontier = vec![Branch {
            locals: vec![0; n],
            history: JointHistory::root(self.problem),
        }];
        for (k, node) in chain.iter().enumerate() {
            let mut next = Vec::new();
            next.try_reserve_exact(frontier.len() * pairs.1)?;
            for branch in frontier.iter() {
                let digits = (0..n)
                    .map(|i| node.actions(i)[branch.locals[i]])
                    .collect::<Vec<_>>();
                let ja = self.actions.joint(&digits);
                for jo in 0..pairs.1 {
                    let locals = (0..n)
                        .map(|i| {
                            self.histories
                                .extend(i, branch.locals[i], self.observations.digit(jo, i))
                        })
                        .collect::<Vec<_>>();
                    let history = branch.history.step(self.problem, ja, jo, pairs)?;
                    next.push(Branch { locals, history });
                }
            }
            log::trace!("stage {} frontier holds {} joint histories", k + 1, next.len());
            frontier = next;
        }

        let mut probability = Vec::new();
        let mut beliefs = Vec::new();
        let mut utility = Vec::new();
        let mut reward = Vec::new();
        probability.try_reserve_exact(types.size())?;
        beliefs.try_reserve_exact(types.size())?;
        utility.try_reserve_exact(cells)?;
        reward.try_reserve_exact(cells)?;
        probability.resize(types.size(), 0.0);
        beliefs.resize(types.size(), Vec::new());
        utility.resize(cells, 0.0);
        reward.resize(cells, 0.0);
        let width = self.actions.size();
        for row in self.rows(&types, &frontier) {
            probability[row.jt] = row.probability;
            beliefs[row.jt] = row.belief;
            utility[row.jt * width..(row.jt + 1) * width].copy_from_slice(&row.utility);
            reward[row.jt * width..(row.jt + 1) * width].copy_from_slice(&row.reward);
        }
        Ok(Tables {
            stage,
            types: counts,
            actions,
            width,
            probability,
            beliefs,
            utility,
            reward,
        })
    }

    fn row(&self, types: &Radix, branch: &Branch) -> Row {
        let jt = types.joint(&branch.locals);
        let width = self.actions.size();
        match branch.history.reachable() {
            false => Row {
                jt,
                probability: 0.0,
                belief: Vec::new(),
                utility: vec![0.0; width],
                reward: vec![0.0; width],
            },
            true => Row {
                jt,
                probability: branch.history.probability(),
                belief: branch.history.belief().states().to_vec(),
                utility: (0..width)
                    .map(|ja| self.heuristic.q(&branch.history, ja))
                    .collect(),
                reward: (0..width)
                    .map(|ja| branch.history.belief().reward(self.problem, ja))
                    .collect(),
            },
        }
    }

    #[cfg(feature = "server")]
    fn rows(&self, types: &Radix, frontier: &[Branch]) -> Vec<Row> {
        use rayon::iter::IntoParallelRefIterator;
        use rayon::iter::ParallelIterator;
        frontier
            .par_iter()
            .map(|branch| self.row(types, branch))
            .collect()
    }

    #[cfg(not(feature = "server"))]
    fn rows(&self, types: &Radix, frontier: &[Branch]) -> Vec<Row> {
        frontier
            .iter()
            .map(|branch| self.row(types, branch))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;
    use crate::LocalPolicy;
    use crate::Qmdp;

    fn setup(horizon: usize) -> (DecPomdp, Qmdp, Histories) {
        let tiger = DecPomdp::tiger();
        let qmdp = Qmdp::new(&tiger, horizon).unwrap();
        let histories = Histories::new(&tiger, horizon).unwrap();
        (tiger, qmdp, histories)
    }

    #[test]
    fn root_game_has_a_single_joint_type() {
        let (tiger, qmdp, histories) = setup(2);
        let builder = StageBuilder::new(&tiger, &qmdp, &histories).unwrap();
        let ref mut arena = Arena::default();
        let root = arena.root();
        let game = builder.build(arena, root).unwrap();
        assert_eq!(game.stage(), 0);
        assert_eq!(game.joint_types(), 1);
        assert_eq!(game.joint_actions(), 9);
        assert_eq!(game.probability(0), 1.0);
        assert!((game.utility(0, 0) - 18.0).abs() < 1e-9);
        assert_eq!(game.reward(0, 0), -2.0);
    }

    #[test]
    fn type_counts_follow_the_policy_depth() {
        let (tiger, qmdp, histories) = setup(3);
        let builder = StageBuilder::new(&tiger, &qmdp, &histories).unwrap();
        let ref mut arena = Arena::default();
        let root = arena.root();
        let listen = LocalPolicy::zeros(&[1, 1]);
        let one = arena.extend(root, &listen, &[1, 1], -2.0).unwrap();
        let game = builder.build(arena, one).unwrap();
        assert_eq!(game.agents(), 2);
        assert_eq!(game.type_counts(), &[2, 2]);
        assert_eq!(game.action_counts(), &[3, 3]);
        let two = arena
            .extend(one, &LocalPolicy::zeros(&[2, 2]), &[2, 2], -4.0)
            .unwrap();
        let game = builder.build(arena, two).unwrap();
        assert_eq!(game.type_counts(), &[4, 4]);
        assert_eq!(game.joint_types(), 16);
    }

    #[test]
    fn listening_correlates_the_types() {
        let (tiger, qmdp, histories) = setup(2);
        let builder = StageBuilder::new(&tiger, &qmdp, &histories).unwrap();
        let ref mut arena = Arena::default();
        let root = arena.root();
        let one = arena
            .extend(root, &LocalPolicy::zeros(&[1, 1]), &[1, 1], -2.0)
            .unwrap();
        let game = builder.build(arena, one).unwrap();
        let agree = 0.5 * (0.85 * 0.85 + 0.15 * 0.15);
        let disagree = 0.85 * 0.15;
        assert!((game.probability(0) - agree).abs() < 1e-12);
        assert!((game.probability(1) - disagree).abs() < 1e-12);
        assert!((game.probability(3) - agree).abs() < 1e-12);
    }

    #[test]
    fn full_policies_are_out_of_scope() {
        let (tiger, qmdp, histories) = setup(1);
        let builder = StageBuilder::new(&tiger, &qmdp, &histories).unwrap();
        let ref mut arena = Arena::default();
        let root = arena.root();
        let done = arena
            .extend(root, &LocalPolicy::zeros(&[1, 1]), &[1, 1], -2.0)
            .unwrap();
        let game = builder.build(arena, done);
        assert!(matches!(game, Err(PlanError::InconsistentScope(_))));
    }

    #[test]
    fn mismatched_heuristics_are_rejected() {
        let tiger = DecPomdp::tiger();
        let histories = Histories::new(&tiger, 2).unwrap();
        for horizon in [1, 4] {
            let qmdp = Qmdp::new(&tiger, horizon).unwrap();
            let builder = StageBuilder::new(&tiger, &qmdp, &histories);
            assert!(matches!(builder, Err(PlanError::Setup(_))));
        }
    }
}
