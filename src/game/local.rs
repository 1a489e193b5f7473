/// One action per type per agent: a pure joint policy of a Bayesian game.
///
/// Ordering is lexicographic over `[agent][type]`, which gives solvers a
/// deterministic tie-break between equally valued solutions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LocalPolicy(Vec<Vec<usize>>);

impl LocalPolicy {
    pub fn new(actions: Vec<Vec<usize>>) -> Self {
        Self(actions)
    }
    /// Every type of every agent plays action 0.
    pub fn zeros(types: &[usize]) -> Self {
        Self(types.iter().map(|n| vec![0; *n]).collect())
    }
    pub fn agents(&self) -> usize {
        self.0.len()
    }
    pub fn actions(&self, agent: usize) -> &[usize] {
        &self.0[agent]
    }
    pub fn action(&self, agent: usize, ty: usize) -> usize {
        self.0[agent][ty]
    }
    pub fn set(&mut self, agent: usize, ty: usize, action: usize) {
        self.0[agent][ty] = action;
    }
    /// Step to the next policy in lexicographic order, the last type of
    /// the last agent moving fastest. Returns false after wrapping around
    /// to all zeros.
    pub fn advance(&mut self, actions: &[usize]) -> bool {
        for (agent, row) in self.0.iter_mut().enumerate().rev() {
            for a in row.iter_mut().rev() {
                *a += 1;
                if *a < actions[agent] {
                    return true;
                }
                *a = 0;
            }
        }
        false
    }
    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.0
    }
}

impl From<Vec<Vec<usize>>> for LocalPolicy {
    fn from(actions: Vec<Vec<usize>>) -> Self {
        Self(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_enumerates_every_policy_once() {
        let mut policy = LocalPolicy::zeros(&[2, 1]);
        let mut seen = vec![policy.clone()];
        while policy.advance(&[2, 3]) {
            seen.push(policy.clone());
        }
        assert_eq!(seen.len(), 12);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(policy, LocalPolicy::zeros(&[2, 1]));
    }
}
