use super::LocalPolicy;
use crate::PROBABILITY_TOLERANCE;
use crate::PlanError;
use crate::Probability;
use crate::Radix;
use crate::Result;
use crate::Utility;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// One-shot identical-payoff Bayesian game for a single search stage.
///
/// Joint types and joint actions are mixed-radix indices (agent 0 most
/// significant). Besides the heuristic `utility` the game carries the
/// expected immediate `reward` of every (joint type, joint action), which
/// the search uses to account the exact past reward of children.
#[derive(Debug, Clone)]
pub struct BayesianGame {
    stage: usize,
    types: Radix,
    actions: Radix,
    digits: Vec<Vec<usize>>,
    probability: Vec<Probability>,
    utility: Vec<Utility>,
    reward: Vec<Utility>,
}

impl BayesianGame {
    pub fn new(
        stage: usize,
        types: Vec<usize>,
        actions: Vec<usize>,
        probability: Vec<Probability>,
        utility: Vec<Utility>,
        reward: Vec<Utility>,
    ) -> Result<Self> {
        let types = Radix::new(types)?;
        let actions = Radix::new(actions)?;
        if types.len() != actions.len() {
            return Err(PlanError::Invariant(format!(
                "{} type sets for {} action sets",
                types.len(),
                actions.len()
            )));
        }
        let cells = types
            .size()
            .checked_mul(actions.size())
            .ok_or_else(|| PlanError::overflow("joint type × joint action table"))?;
        if probability.len() != types.size() || utility.len() != cells || reward.len() != cells {
            return Err(PlanError::Invariant("game tables do not match the type and action spaces".into()));
        }
        let digits = (0..types.size()).map(|jt| types.split(jt)).collect();
        let game = Self {
            stage,
            types,
            actions,
            digits,
            probability,
            utility,
            reward,
        };
        game.validate()?;
        Ok(game)
    }

    /// Random game with a seeded type distribution and payoffs uniform in
    /// [-10, 10]. Immediate rewards equal the payoffs.
    pub fn random(types: Vec<usize>, actions: Vec<usize>, seed: u64) -> Result<Self> {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let jt = Radix::new(types.clone())?.size();
        let ja = Radix::new(actions.clone())?.size();
        let weights = (0..jt)
            .map(|_| rng.random_range(0.05..1.0))
            .collect::<Vec<Probability>>();
        let total = weights.iter().sum::<Probability>();
        let probability = weights.into_iter().map(|w| w / total).collect();
        let utility = (0..jt * ja)
            .map(|_| rng.random_range(-10.0..=10.0))
            .collect::<Vec<Utility>>();
        Self::new(0, types, actions, probability, utility.clone(), utility)
    }

    pub fn stage(&self) -> usize {
        self.stage
    }
    pub fn agents(&self) -> usize {
        self.types.len()
    }
    pub fn types(&self, agent: usize) -> usize {
        self.types.base(agent)
    }
    pub fn actions(&self, agent: usize) -> usize {
        self.actions.base(agent)
    }
    pub fn type_counts(&self) -> &[usize] {
        self.types.sizes()
    }
    pub fn action_counts(&self) -> &[usize] {
        self.actions.sizes()
    }
    pub fn joint_types(&self) -> usize {
        self.types.size()
    }
    pub fn joint_actions(&self) -> usize {
        self.actions.size()
    }
    pub fn action_radix(&self) -> &Radix {
        &self.actions
    }
    /// Individual types making up a joint type.
    pub fn type_digits(&self, jt: usize) -> &[usize] {
        &self.digits[jt]
    }
    pub fn probability(&self, jt: usize) -> Probability {
        self.probability[jt]
    }
    pub fn utility(&self, jt: usize, ja: usize) -> Utility {
        self.utility[jt * self.actions.size() + ja]
    }
    pub fn reward(&self, jt: usize, ja: usize) -> Utility {
        self.reward[jt * self.actions.size() + ja]
    }
    /// Utilities of every joint action for one joint type.
    pub fn row(&self, jt: usize) -> &[Utility] {
        let n = self.actions.size();
        &self.utility[jt * n..(jt + 1) * n]
    }
    /// Probability-weighted payoff of the best joint action for `jt`, as
    /// if every agent knew the joint type.
    pub fn ceiling(&self, jt: usize) -> Utility {
        self.probability(jt)
            * self
                .row(jt)
                .iter()
                .copied()
                .fold(Utility::NEG_INFINITY, Utility::max)
    }
    pub fn joint_action(&self, policy: &LocalPolicy, jt: usize) -> usize {
        self.digits[jt]
            .iter()
            .enumerate()
            .map(|(i, ty)| self.actions.stride(i) * policy.action(i, *ty))
            .sum()
    }
    /// Expected heuristic payoff of a local policy.
    pub fn value(&self, policy: &LocalPolicy) -> Utility {
        (0..self.joint_types())
            .filter(|jt| self.probability(*jt) > 0.0)
            .map(|jt| self.probability(jt) * self.utility(jt, self.joint_action(policy, jt)))
            .sum()
    }
    /// Expected immediate reward of a local policy at this stage.
    pub fn immediate(&self, policy: &LocalPolicy) -> Utility {
        (0..self.joint_types())
            .filter(|jt| self.probability(*jt) > 0.0)
            .map(|jt| self.probability(jt) * self.reward(jt, self.joint_action(policy, jt)))
            .sum()
    }
    /// Number of local policies, `∏ nA_i^nT_i`.
    pub fn policies(&self) -> Result<u128> {
        policies(self.actions.sizes(), self.types.sizes())
    }
    pub fn validate(&self) -> Result<()> {
        let total = self.probability.iter().sum::<Probability>();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE || self.probability.iter().any(|p| *p < 0.0) {
            return Err(PlanError::Invariant(format!(
                "stage {} joint type probabilities sum to {}",
                self.stage, total
            )));
        }
        if self.utility.iter().chain(self.reward.iter()).any(|u| !u.is_finite()) {
            return Err(PlanError::Invariant(format!("stage {} has non-finite payoffs", self.stage)));
        }
        Ok(())
    }
}

/// `∏ actions_i^types_i` in 128 bits, failing on overflow.
pub fn policies(actions: &[usize], types: &[usize]) -> Result<u128> {
    actions
        .iter()
        .zip(types)
        .try_fold(1u128, |acc, (a, t)| {
            u32::try_from(*t)
                .ok()
                .and_then(|t| (*a as u128).checked_pow(t))
                .and_then(|n| acc.checked_mul(n))
        })
        .ok_or_else(|| PlanError::overflow(format!("local policies for {:?} actions, {:?} types", actions, types)))
}
