use crate::Belief;
use crate::PlanError;
use crate::Probability;
use crate::Problem;
use crate::Result;

/// A joint action-observation history together with the belief it induces.
///
/// `index` enumerates the stage-t histories as a mixed-radix number over
/// (joint action, joint observation) pairs, oldest pair most significant.
/// Tabular heuristics key their values on it.
#[derive(Debug, Clone, PartialEq)]
pub struct JointHistory {
    stage: usize,
    index: u64,
    belief: Belief,
    probability: Probability,
}

impl JointHistory {
    pub fn root<P>(problem: &P) -> Self
    where
        P: Problem + ?Sized,
    {
        Self {
            stage: 0,
            index: 0,
            belief: Belief::initial(problem),
            probability: 1.0,
        }
    }
    pub fn stage(&self) -> usize {
        self.stage
    }
    pub fn index(&self) -> u64 {
        self.index
    }
    pub fn belief(&self) -> &Belief {
        &self.belief
    }
    /// Probability of this history under the actions that produced it.
    pub fn probability(&self) -> Probability {
        self.probability
    }
    pub fn reachable(&self) -> bool {
        self.probability > 0.0
    }
    /// Append one (joint action, joint observation) step. Impossible
    /// observations leave a history with probability zero and the stale
    /// belief.
    pub fn step<P>(&self, problem: &P, joint: usize, observed: usize, pairs: (usize, usize)) -> Result<Self>
    where
        P: Problem + ?Sized,
    {
        self.branch(problem, joint, observed, pairs).map(|(child, _)| child)
    }
    /// Like [`JointHistory::step`], also returning P(observed | belief, joint).
    pub fn branch<P>(
        &self,
        problem: &P,
        joint: usize,
        observed: usize,
        pairs: (usize, usize),
    ) -> Result<(Self, Probability)>
    where
        P: Problem + ?Sized,
    {
        let (actions, observations) = pairs;
        let index = (actions as u64)
            .checked_mul(observations as u64)
            .and_then(|width| self.index.checked_mul(width))
            .and_then(|i| i.checked_add((joint * observations + observed) as u64))
            .ok_or_else(|| PlanError::overflow(format!("joint history index at stage {}", self.stage + 1)))?;
        let (belief, p) = match self.reachable() {
            true => self
                .belief
                .update(problem, joint, observed)
                .unwrap_or_else(|| (self.belief.clone(), 0.0)),
            false => (self.belief.clone(), 0.0),
        };
        let child = Self {
            stage: self.stage + 1,
            index,
            belief,
            probability: self.probability * p,
        };
        Ok((child, p))
    }
    /// Number of stage-t joint histories, if it fits in a `u64`.
    pub fn space(actions: usize, observations: usize, stage: usize) -> Result<u64> {
        (actions as u64)
            .checked_mul(observations as u64)
            .and_then(|w| w.checked_pow(stage as u32))
            .ok_or_else(|| PlanError::overflow(format!("joint histories at stage {}", stage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;

    #[test]
    fn steps_fold_into_mixed_radix_indices() {
        let tiger = DecPomdp::tiger();
        let root = JointHistory::root(&tiger);
        let one = root.step(&tiger, 2, 3, (9, 4)).unwrap();
        let two = one.step(&tiger, 1, 0, (9, 4)).unwrap();
        assert_eq!(one.index(), 11);
        assert_eq!(two.index(), 11 * 36 + 4);
        assert_eq!(two.stage(), 2);
    }

    #[test]
    fn probabilities_multiply_along_the_path() {
        let tiger = DecPomdp::tiger();
        let root = JointHistory::root(&tiger);
        let h = root.step(&tiger, 4, 0, (9, 4)).unwrap();
        assert!((h.probability() - 0.25).abs() < 1e-12);
        let h = h.step(&tiger, 4, 2, (9, 4)).unwrap();
        assert!((h.probability() - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn index_space_overflow_is_reported() {
        assert_eq!(JointHistory::space(9, 4, 2).unwrap(), 1296);
        assert!(matches!(JointHistory::space(9, 4, 13), Err(PlanError::Overflow(_))));
    }
}
