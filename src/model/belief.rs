use super::Problem;
use crate::Probability;
use crate::Utility;

/// Probability distribution over states.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief(Vec<Probability>);

impl Belief {
    pub fn initial<P>(problem: &P) -> Self
    where
        P: Problem + ?Sized,
    {
        Self(problem.initial().to_vec())
    }
    pub fn states(&self) -> &[Probability] {
        &self.0
    }
    /// Bayes update after `joint` was taken and `observed` was received.
    /// Returns the posterior together with P(observed | self, joint), or
    /// `None` when the observation is impossible.
    pub fn update<P>(&self, problem: &P, joint: usize, observed: usize) -> Option<(Self, Probability)>
    where
        P: Problem + ?Sized,
    {
        let n = problem.states();
        let mut next = vec![0.0; n];
        for (s, b) in self.0.iter().enumerate().filter(|(_, b)| **b > 0.0) {
            for (s2, p) in next.iter_mut().enumerate() {
                *p += b * problem.transition(s, joint, s2);
            }
        }
        for (s2, p) in next.iter_mut().enumerate() {
            *p *= problem.observation(joint, s2, observed);
        }
        let total = next.iter().sum::<Probability>();
        if total <= 0.0 {
            return None;
        }
        next.iter_mut().for_each(|p| *p /= total);
        Some((Self(next), total))
    }
    /// Expected immediate reward of a joint action.
    pub fn reward<P>(&self, problem: &P, joint: usize) -> Utility
    where
        P: Problem + ?Sized,
    {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b > 0.0)
            .map(|(s, b)| b * problem.reward(s, joint))
            .sum()
    }
}

impl From<Vec<Probability>> for Belief {
    fn from(states: Vec<Probability>) -> Self {
        Self(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;

    #[test]
    fn listening_sharpens_the_tiger_belief() {
        let tiger = DecPomdp::tiger();
        let b0 = Belief::initial(&tiger);
        // both agents listen, both hear the tiger on the left
        let (b1, p) = b0.update(&tiger, 0, 0).unwrap();
        assert!((p - 0.5 * (0.85 * 0.85 + 0.15 * 0.15)).abs() < 1e-12);
        assert!(b1.states()[0] > 0.96);
        assert!((b1.states().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn opening_a_door_resets_the_tiger() {
        let tiger = DecPomdp::tiger();
        let b0 = Belief::from(vec![1.0, 0.0]);
        let (b1, p) = b0.update(&tiger, 4, 3).unwrap();
        assert!((p - 0.25).abs() < 1e-12);
        assert_eq!(b1.states(), &[0.5, 0.5]);
    }

    #[test]
    fn uniform_listening_costs_two() {
        let tiger = DecPomdp::tiger();
        assert_eq!(Belief::initial(&tiger).reward(&tiger, 0), -2.0);
        assert_eq!(Belief::initial(&tiger).reward(&tiger, 8), -15.0);
    }
}
