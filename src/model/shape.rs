/// Dimensions of a tabular Dec-POMDP.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    pub states: usize,
    pub actions: Vec<usize>,
    pub observations: Vec<usize>,
}

impl Shape {
    /// Every agent gets the same number of actions and observations.
    pub fn uniform(agents: usize, states: usize, actions: usize, observations: usize) -> Self {
        Self {
            states,
            actions: vec![actions; agents],
            observations: vec![observations; agents],
        }
    }
    pub fn agents(&self) -> usize {
        self.actions.len()
    }
}
