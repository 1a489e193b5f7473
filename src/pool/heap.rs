use super::Entry;
use crate::PlanError;
use crate::PolicyId;
use crate::Result;
use crate::Utility;
use std::collections::BinaryHeap;

/// Binary max-heap over [`Entry`], O(log n) push and pop.
///
/// The pool owns one arena reference per entry; ids leaving through
/// [`Pool::clear`] or [`Pool::prune`] are handed back for release.
#[derive(Debug, Default)]
pub struct Pool {
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl Pool {
    pub fn push(&mut self, id: PolicyId, priority: Utility, depth: usize) {
        self.seq += 1;
        self.heap.push(Entry {
            priority,
            depth,
            seq: self.seq,
            id,
        });
    }
    pub fn pop(&mut self) -> Result<Entry> {
        self.heap.pop().ok_or(PlanError::EmptyPool)
    }
    pub fn peek(&self) -> Option<&Entry> {
        self.heap.peek()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn clear(&mut self) -> Vec<PolicyId> {
        self.heap.drain().map(|e| e.id).collect()
    }
    /// Remove every entry strictly below `threshold`.
    pub fn prune(&mut self, threshold: Utility) -> Vec<PolicyId> {
        let (keep, drop) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition::<Vec<Entry>, _>(|e| e.priority >= threshold);
        self.heap = BinaryHeap::from(keep);
        drop.into_iter().map(|e| e.id).collect()
    }
    /// Reserve room for `additional` entries or report exhaustion.
    pub fn try_grow(&mut self, additional: usize) -> Result<()> {
        Ok(self.heap.try_reserve(additional)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(i: usize) -> PolicyId {
        PolicyId(i)
    }

    #[test]
    fn empty_pool_pop_fails() {
        assert!(matches!(Pool::default().pop(), Err(PlanError::EmptyPool)));
    }

    #[test]
    fn ties_prefer_depth_then_age() {
        let mut pool = Pool::default();
        pool.push(id(0), 1.0, 1);
        pool.push(id(1), 1.0, 2);
        pool.push(id(2), 1.0, 1);
        assert_eq!(pool.pop().unwrap().id, id(1));
        assert_eq!(pool.pop().unwrap().id, id(0));
        assert_eq!(pool.pop().unwrap().id, id(2));
    }

    #[test]
    fn prune_returns_what_it_removes() {
        let mut pool = Pool::default();
        for i in 0..10 {
            pool.push(id(i), i as Utility, 0);
        }
        let mut gone = pool.prune(4.0);
        gone.sort_by_key(|p| p.0);
        assert_eq!(gone, (0..4).map(id).collect::<Vec<_>>());
        assert_eq!(pool.len(), 6);
        assert_eq!(pool.peek().map(|e| e.id), Some(id(9)));
        assert_eq!(pool.clear().len(), 6);
        assert!(pool.is_empty());
    }

    proptest! {
        #[test]
        fn pops_are_non_increasing(priorities in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            let mut pool = Pool::default();
            for (i, p) in priorities.iter().enumerate() {
                pool.push(id(i), *p, i % 3);
            }
            let mut last = f64::INFINITY;
            while let Ok(entry) = pool.pop() {
                prop_assert!(entry.priority <= last);
                last = entry.priority;
            }
        }
    }
}
