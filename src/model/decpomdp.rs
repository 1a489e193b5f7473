use super::Problem;
use super::Shape;
use crate::PROBABILITY_TOLERANCE;
use crate::PlanError;
use crate::Probability;
use crate::Radix;
use crate::Result;
use crate::Utility;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Dense tabular Dec-POMDP.
///
/// | table         | layout          |
/// |---------------|-----------------|
/// | `transitions` | `[s][ja][s']`   |
/// | `emissions`   | `[ja][s'][jo]`  |
/// | `rewards`     | `[s][ja]`       |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecPomdp {
    pub(super) name: String,
    pub(super) states: usize,
    pub(super) actions: Vec<usize>,
    pub(super) observations: Vec<usize>,
    pub(super) discount: f64,
    pub(super) initial: Vec<Probability>,
    pub(super) transitions: Vec<Probability>,
    pub(super) emissions: Vec<Probability>,
    pub(super) rewards: Vec<Utility>,
}

impl DecPomdp {
    /// Fill every table from closures, then validate.
    pub fn tabulate<T, O, R>(
        name: &str,
        shape: Shape,
        discount: f64,
        initial: Vec<Probability>,
        transition: T,
        observation: O,
        reward: R,
    ) -> Result<Self>
    where
        T: Fn(usize, usize, usize) -> Probability,
        O: Fn(usize, usize, usize) -> Probability,
        R: Fn(usize, usize) -> Utility,
    {
        let n = shape.states;
        let ja = Radix::new(shape.actions.clone())?.size();
        let jo = Radix::new(shape.observations.clone())?.size();
        [n * n, n * jo]
            .iter()
            .try_fold(ja, |acc, x| acc.checked_mul(*x))
            .ok_or_else(|| PlanError::overflow(format!("model tables for {:?}", shape)))?;
        let transitions = (0..n)
            .flat_map(|s| (0..ja).flat_map(move |a| (0..n).map(move |s2| (s, a, s2))))
            .map(|(s, a, s2)| transition(s, a, s2))
            .collect();
        let emissions = (0..ja)
            .flat_map(|a| (0..n).flat_map(move |s2| (0..jo).map(move |o| (a, s2, o))))
            .map(|(a, s2, o)| observation(a, s2, o))
            .collect();
        let rewards = (0..n)
            .flat_map(|s| (0..ja).map(move |a| (s, a)))
            .map(|(s, a)| reward(s, a))
            .collect();
        let model = Self {
            name: name.to_string(),
            states: n,
            actions: shape.actions,
            observations: shape.observations,
            discount,
            initial,
            transitions,
            emissions,
            rewards,
        };
        model.validate()?;
        Ok(model)
    }

    /// Random problem with stochastic rows drawn from a seeded generator
    /// and rewards uniform in [-10, 10].
    pub fn random(shape: Shape, discount: f64, seed: u64) -> Result<Self> {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let n = shape.states;
        let ja = Radix::new(shape.actions.clone())?.size();
        let jo = Radix::new(shape.observations.clone())?.size();
        let initial = simplex(rng, n);
        let transitions = (0..n * ja).flat_map(|_| simplex(rng, n)).collect::<Vec<_>>();
        let emissions = (0..ja * n).flat_map(|_| simplex(rng, jo)).collect::<Vec<_>>();
        let rewards = (0..n * ja)
            .map(|_| rng.random_range(-10.0..=10.0))
            .collect::<Vec<Utility>>();
        Self::tabulate(
            "random",
            shape,
            discount,
            initial,
            |s, a, s2| transitions[(s * ja + a) * n + s2],
            |a, s2, o| emissions[(a * n + s2) * jo + o],
            |s, a| rewards[s * ja + a],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn shape(&self) -> Shape {
        Shape {
            states: self.states,
            actions: self.actions.clone(),
            observations: self.observations.clone(),
        }
    }

    /// Check dimensions, stochasticity and finiteness of every table.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: String| Err(PlanError::Setup(format!("{}: {}", self.name, what)));
        if self.actions.is_empty() || self.actions.len() != self.observations.len() {
            return invalid(format!(
                "agent count mismatch: {} action sets, {} observation sets",
                self.actions.len(),
                self.observations.len()
            ));
        }
        if self.states == 0 || self.actions.contains(&0) || self.observations.contains(&0) {
            return invalid("empty state, action or observation set".into());
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return invalid(format!("discount {} outside (0, 1]", self.discount));
        }
        let n = self.states;
        let ja = self.joint_actions()?.size();
        let jo = self.joint_observations()?.size();
        if self.initial.len() != n
            || self.transitions.len() != n * ja * n
            || self.emissions.len() != ja * n * jo
            || self.rewards.len() != n * ja
        {
            return invalid("table dimensions do not match the shape".into());
        }
        if !stochastic(&self.initial) {
            return invalid("initial distribution is not stochastic".into());
        }
        if let Some(row) = self.transitions.chunks(n).position(|r| !stochastic(r)) {
            return invalid(format!("transition row {} is not stochastic", row));
        }
        if let Some(row) = self.emissions.chunks(jo).position(|r| !stochastic(r)) {
            return invalid(format!("observation row {} is not stochastic", row));
        }
        if self.rewards.iter().any(|r| !r.is_finite()) {
            return invalid("non-finite reward".into());
        }
        Ok(())
    }

    fn joint_action_count(&self) -> usize {
        self.rewards.len() / self.states
    }
    fn joint_observation_count(&self) -> usize {
        self.emissions.len() / (self.joint_action_count() * self.states)
    }
}

impl Problem for DecPomdp {
    fn agents(&self) -> usize {
        self.actions.len()
    }
    fn states(&self) -> usize {
        self.states
    }
    fn actions(&self, agent: usize) -> usize {
        self.actions[agent]
    }
    fn observations(&self, agent: usize) -> usize {
        self.observations[agent]
    }
    fn discount(&self) -> f64 {
        self.discount
    }
    fn initial(&self) -> &[Probability] {
        &self.initial
    }
    fn transition(&self, state: usize, joint: usize, next: usize) -> Probability {
        self.transitions[(state * self.joint_action_count() + joint) * self.states + next]
    }
    fn observation(&self, joint: usize, next: usize, observed: usize) -> Probability {
        self.emissions[(joint * self.states + next) * self.joint_observation_count() + observed]
    }
    fn reward(&self, state: usize, joint: usize) -> Utility {
        self.rewards[state * self.joint_action_count() + joint]
    }
}

fn stochastic(row: &[Probability]) -> bool {
    row.iter().all(|p| p.is_finite() && *p >= 0.0)
        && (row.iter().sum::<Probability>() - 1.0).abs() <= PROBABILITY_TOLERANCE
}

fn simplex(rng: &mut SmallRng, n: usize) -> Vec<Probability> {
    let weights = (0..n)
        .map(|_| rng.random_range(0.05..1.0))
        .collect::<Vec<Probability>>();
    let total = weights.iter().sum::<Probability>();
    weights.into_iter().map(|w| w / total).collect()
}
