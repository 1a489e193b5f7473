use std::fmt::Display;
use std::fmt::Formatter;

/// A complete joint policy detached from any arena.
///
/// `actions[agent][stage][history]` is the action `agent` takes after
/// observing history `history` (see [`crate::Histories`]) at `stage`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JointPolicy {
    actions: Vec<Vec<Vec<usize>>>,
}

impl JointPolicy {
    pub fn new(actions: Vec<Vec<Vec<usize>>>) -> Self {
        Self { actions }
    }
    pub fn agents(&self) -> usize {
        self.actions.len()
    }
    pub fn horizon(&self) -> usize {
        self.actions.first().map(Vec::len).unwrap_or_default()
    }
    pub fn action(&self, agent: usize, stage: usize, history: usize) -> usize {
        self.actions[agent][stage][history]
    }
    pub fn stage(&self, agent: usize, stage: usize) -> &[usize] {
        &self.actions[agent][stage]
    }
}

impl Display for JointPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, stages) in self.actions.iter().enumerate() {
            writeln!(f, "agent {}", i)?;
            for (t, actions) in stages.iter().enumerate() {
                let row = actions
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "  t={} │ {}", t, row)?;
            }
        }
        Ok(())
    }
}
