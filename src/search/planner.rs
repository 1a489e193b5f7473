use super::Engine;
use super::Outcome;
use super::Settings;
use crate::Deadline;
use crate::Heuristic;
use crate::Histories;
use crate::PROBABILITY_TOLERANCE;
use crate::PlanError;
use crate::Probability;
use crate::Problem;
use crate::Result;
use crate::StageBuilder;
use crate::Utility;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::time::Instant;

/// Lifecycle of a [`Planner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Expanding,
    Terminated,
}

/// GMAA* planner over a problem `P` guided by a heuristic `H`.
///
/// The heuristic is usually computed from the planner's own problem, so
/// the planner is created without one and it is injected afterwards:
///
/// ```ignore
/// let mut planner = Planner::new(DecPomdp::tiger(), settings)?;
/// let heuristic = Qmdp::new(planner.problem(), planner.horizon())?;
/// planner.inject(heuristic)?;
/// let outcome = planner.plan()?;
/// ```
pub struct Planner<P, H>
where
    P: Problem,
    H: Heuristic,
{
    problem: P,
    heuristic: Option<H>,
    histories: Histories,
    settings: Settings,
    phase: Phase,
    outcome: Option<Outcome>,
}

impl<P, H> Planner<P, H>
where
    P: Problem,
    H: Heuristic,
{
    pub fn new(problem: P, settings: Settings) -> Result<Self> {
        settings.validate()?;
        if problem.agents() == 0 {
            return Err(PlanError::Setup("problem has no agents".into()));
        }
        if !(problem.discount() > 0.0 && problem.discount() <= 1.0) {
            return Err(PlanError::Setup(format!("discount {} outside (0, 1]", problem.discount())));
        }
        let mass = problem.initial().iter().sum::<Probability>();
        if (mass - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(PlanError::Setup(format!("initial distribution sums to {}", mass)));
        }
        problem.joint_actions()?;
        problem.joint_observations()?;
        let histories = Histories::new(&problem, settings.horizon)?;
        Ok(Self {
            problem,
            heuristic: None,
            histories,
            settings,
            phase: Phase::Idle,
            outcome: None,
        })
    }

    /// Supply the heuristic. It must span exactly the planning horizon,
    /// since its stage `t` values are read as the return from stage `t`.
    pub fn inject(&mut self, heuristic: H) -> Result<()> {
        if heuristic.horizon() != self.settings.horizon {
            return Err(PlanError::Setup(format!(
                "heuristic spans {} stages, horizon is {}",
                heuristic.horizon(),
                self.settings.horizon
            )));
        }
        self.heuristic = Some(heuristic);
        Ok(())
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }
    pub fn horizon(&self) -> usize {
        self.settings.horizon
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Run every restart and keep the best complete policy.
    ///
    /// A restart that runs out of time is abandoned and the next one still
    /// runs. When all of them are abandoned the call fails with the best
    /// lower bound any of them reached. Other errors end the run at once.
    pub fn plan(&mut self) -> Result<&Outcome> {
        let Self {
            problem,
            heuristic,
            histories,
            settings,
            phase,
            outcome,
        } = self;
        let heuristic = heuristic
            .as_ref()
            .ok_or_else(|| PlanError::Setup("no heuristic injected".into()))?;
        let builder = StageBuilder::new(&*problem, heuristic, &*histories)?;
        let start = Instant::now();
        let mut result = Outcome::new(settings.horizon);
        let mut abandoned = Utility::NEG_INFINITY;
        *phase = Phase::Expanding;
        log::info!(
            "planning horizon {} with {} ({:?}, {:?}, clustering {})",
            settings.horizon,
            settings.solver.name(),
            settings.variant,
            settings.expansion,
            settings.cluster
        );
        for restart in 0..settings.restarts {
            let deadline = settings.budget().map(Deadline::after).unwrap_or_default();
            let ref mut rng = SmallRng::seed_from_u64(settings.seed.wrapping_add(restart as u64));
            let mut engine = Engine::new(&builder, settings, problem.discount(), deadline);
            match engine.run(rng, &mut result) {
                Ok(found) => {
                    result.restarts_completed += 1;
                    if let Some((policy, value)) = found {
                        log::info!("restart {} found value {:.6}", restart, value);
                        if value > result.value {
                            result.value = value;
                            result.policy = Some(policy);
                        }
                    }
                }
                Err(e) if e.is_recoverable() => {
                    result.restarts_aborted += 1;
                    abandoned = abandoned.max(engine.lower());
                    log::warn!("restart {} abandoned at lower bound {:.6}: {}", restart, engine.lower(), e);
                }
                Err(e) => {
                    *phase = Phase::Terminated;
                    return Err(e);
                }
            }
        }
        result.elapsed = start.elapsed();
        *phase = Phase::Terminated;
        let completed = result.restarts_completed;
        let outcome = outcome.insert(result);
        match completed {
            0 => Err(PlanError::DeadlineExceeded {
                context: format!("all {} restarts", settings.restarts),
                lower_bound: Some(abandoned).filter(|lb| lb.is_finite()),
            }),
            _ => Ok(&*outcome),
        }
    }
}
