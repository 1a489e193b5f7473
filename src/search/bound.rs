use crate::PolicyId;
use crate::Utility;

/// The best complete policy found so far and its value.
///
/// Holds one arena reference to the incumbent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    lower: Utility,
    best: Option<PolicyId>,
    slack: Utility,
}

impl Bound {
    pub fn new(slack: Utility) -> Self {
        Self {
            lower: Utility::NEG_INFINITY,
            best: None,
            slack,
        }
    }
    pub fn lower(&self) -> Utility {
        self.lower
    }
    pub fn best(&self) -> Option<PolicyId> {
        self.best
    }
    pub fn slack(&self) -> Utility {
        self.slack
    }
    /// Nothing with this priority can improve on the incumbent by more
    /// than the slack.
    pub fn dead(&self, priority: Utility) -> bool {
        priority + self.slack < self.lower
    }
    /// Consider a complete policy. Returns the handle that lost, either
    /// the displaced incumbent or `id` itself, for the caller to release.
    pub fn offer(&mut self, id: PolicyId, value: Utility) -> Option<PolicyId> {
        match value > self.lower {
            true => {
                self.lower = value;
                self.best.replace(id)
            }
            false => Some(id),
        }
    }
    pub fn take(&mut self) -> Option<PolicyId> {
        self.best.take()
    }
}
