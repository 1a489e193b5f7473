use crate::Utility;

/// Index of a node in an [`crate::Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyId(pub(crate) usize);

/// One node of a partial joint policy chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialPolicy {
    depth: usize,
    past: Utility,
    parent: Option<PolicyId>,
    stage: Vec<Vec<usize>>,
}

impl PartialPolicy {
    /// The empty depth-0 policy.
    pub fn root() -> Self {
        Self {
            depth: 0,
            past: 0.0,
            parent: None,
            stage: Vec::new(),
        }
    }
    pub(crate) fn child(parent: PolicyId, depth: usize, past: Utility, stage: Vec<Vec<usize>>) -> Self {
        Self {
            depth,
            past,
            parent: Some(parent),
            stage,
        }
    }
    /// Number of stages with assigned actions.
    pub fn depth(&self) -> usize {
        self.depth
    }
    /// Expected discounted reward collected over the assigned stages.
    pub fn past(&self) -> Utility {
        self.past
    }
    pub fn parent(&self) -> Option<PolicyId> {
        self.parent
    }
    /// Actions of `agent` for each of its histories at stage `depth - 1`.
    pub fn actions(&self, agent: usize) -> &[usize] {
        &self.stage[agent]
    }
    pub fn agents(&self) -> usize {
        self.stage.len()
    }
}
