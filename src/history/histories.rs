use crate::PlanError;
use crate::Problem;
use crate::Result;

/// Per-agent observation history spaces for stages `0..horizon`.
///
/// A stage-t history of agent i is a sequence of t observations, numbered
/// `0..nO_i^t` with the first observation most significant. Extending a
/// history by one observation is therefore `h * nO_i + o`, and truncating
/// it is integer division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histories {
    observations: Vec<usize>,
    counts: Vec<Vec<usize>>,
}

impl Histories {
    pub fn new<P>(problem: &P, horizon: usize) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        let observations = (0..problem.agents())
            .map(|i| problem.observations(i))
            .collect::<Vec<_>>();
        let counts = observations
            .iter()
            .map(|n| {
                (0..horizon)
                    .map(|t| {
                        u32::try_from(t)
                            .ok()
                            .and_then(|t| n.checked_pow(t))
                            .ok_or_else(|| PlanError::overflow(format!("{}^{} histories", n, t)))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            observations,
            counts,
        })
    }
    pub fn agents(&self) -> usize {
        self.observations.len()
    }
    pub fn horizon(&self) -> usize {
        self.counts.first().map(Vec::len).unwrap_or_default()
    }
    /// Number of histories of length `stage`.
    pub fn count(&self, agent: usize, stage: usize) -> usize {
        self.counts[agent][stage]
    }
    /// Per-agent history counts at `stage`.
    pub fn counts(&self, stage: usize) -> Vec<usize> {
        self.counts.iter().map(|c| c[stage]).collect()
    }
    /// Index of the first stage-t history in a flat numbering of all
    /// histories of lengths `0..horizon`.
    pub fn offset(&self, agent: usize, stage: usize) -> usize {
        self.counts[agent][..stage].iter().sum()
    }
    /// Total number of histories of lengths `0..horizon`.
    pub fn total(&self, agent: usize) -> usize {
        self.counts[agent].iter().sum()
    }
    pub fn extend(&self, agent: usize, history: usize, observation: usize) -> usize {
        history * self.observations[agent] + observation
    }
    /// Observation sequence of a stage-t history, oldest first.
    pub fn decode(&self, agent: usize, history: usize, stage: usize) -> Vec<usize> {
        let n = self.observations[agent];
        let mut sequence = (0..stage)
            .scan(history, |h, _| {
                let o = *h % n;
                *h /= n;
                Some(o)
            })
            .collect::<Vec<_>>();
        sequence.reverse();
        sequence
    }
}
