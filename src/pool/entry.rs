use crate::PolicyId;
use crate::Utility;
use std::cmp::Ordering;

/// A pool item: a partial policy and its optimistic value.
///
/// Entries order by priority, then by depth so that deeper policies
/// (closer to complete) win ties, then by insertion order.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub priority: Utility,
    pub depth: usize,
    pub(crate) seq: u64,
    pub id: PolicyId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.depth.cmp(&other.depth))
            .then(other.seq.cmp(&self.seq))
    }
}
