use super::Solution;
use super::Width;
use crate::LocalPolicy;
use crate::REWARD_TOLERANCE;
use crate::Utility;
use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::HashSet;

/// Heap entry: higher value ranks first, then the smaller policy.
#[derive(Debug, Clone, PartialEq)]
struct Ranked {
    value: Utility,
    policy: LocalPolicy,
}

impl Eq for Ranked {}
impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.policy.cmp(&self.policy))
    }
}
impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Collects the k best distinct local policies offered to it.
///
/// Bounded widths keep a min-heap of size k so the worst kept solution is
/// evicted in O(log k); [`Width::All`] keeps everything. Offers below the
/// lower bound are discarded outright.
#[derive(Debug)]
pub struct Ranking {
    width: Width,
    lower: Utility,
    kept: BinaryHeap<Reverse<Ranked>>,
    seen: HashSet<LocalPolicy>,
    best: Utility,
    offers: usize,
}

impl Ranking {
    pub fn new(width: Width, lower: Utility) -> Self {
        Self {
            width,
            lower,
            kept: BinaryHeap::new(),
            seen: HashSet::new(),
            best: Utility::NEG_INFINITY,
            offers: 0,
        }
    }
    /// Returns whether the policy was kept.
    pub fn offer(&mut self, policy: &LocalPolicy, value: Utility) -> bool {
        self.offers += 1;
        if value < self.lower || self.seen.contains(policy) || self.width.limit() == Some(0) {
            return false;
        }
        if self.width.full(self.kept.len()) {
            let candidate = Ranked {
                value,
                policy: policy.clone(),
            };
            match self.kept.peek() {
                Some(Reverse(worst)) if candidate > *worst => {}
                _ => return false,
            }
            if let Some(Reverse(evicted)) = self.kept.pop() {
                self.seen.remove(&evicted.policy);
            }
            self.seen.insert(candidate.policy.clone());
            self.kept.push(Reverse(candidate));
        } else {
            self.seen.insert(policy.clone());
            self.kept.push(Reverse(Ranked {
                value,
                policy: policy.clone(),
            }));
        }
        self.best = self.best.max(value);
        true
    }
    /// Value a branch must be able to reach to still matter.
    pub fn floor(&self) -> Utility {
        match self.width.full(self.kept.len()) {
            true => self
                .kept
                .peek()
                .map(|Reverse(worst)| worst.value.max(self.lower))
                .unwrap_or(self.lower),
            false => self.lower,
        }
    }
    /// Whether a branch bounded by `bound` can be skipped.
    pub fn prunes(&self, bound: Utility) -> bool {
        bound + REWARD_TOLERANCE < self.floor()
    }
    pub fn best(&self) -> Utility {
        self.best
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
    /// Number of offers received, kept or not.
    pub fn offers(&self) -> usize {
        self.offers
    }
    /// Best first, truncated to `width`.
    pub fn into_solutions(self, width: Width) -> Vec<Solution> {
        let mut solutions = self
            .kept
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(r)| Solution {
                policy: r.policy,
                value: r.value,
            })
            .collect::<Vec<_>>();
        if let Some(k) = width.limit() {
            solutions.truncate(k);
        }
        solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(a: usize) -> LocalPolicy {
        LocalPolicy::new(vec![vec![a]])
    }

    #[test]
    fn keeps_the_k_best() {
        let mut ranking = Ranking::new(Width::Top(2), Utility::NEG_INFINITY);
        for (a, v) in [(0, 1.0), (1, 5.0), (2, 3.0), (3, 4.0)] {
            ranking.offer(&policy(a), v);
        }
        let solutions = ranking.into_solutions(Width::Top(2));
        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[0].policy, policy(1));
        assert_eq!(solutions[1].policy, policy(3));
    }

    #[test]
    fn duplicates_and_low_values_are_ignored() {
        let mut ranking = Ranking::new(Width::All, 0.0);
        assert!(ranking.offer(&policy(0), 1.0));
        assert!(!ranking.offer(&policy(0), 1.0));
        assert!(!ranking.offer(&policy(1), -1.0));
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.offers(), 3);
    }

    #[test]
    fn ties_break_toward_smaller_policies() {
        let mut ranking = Ranking::new(Width::Top(1), Utility::NEG_INFINITY);
        ranking.offer(&policy(2), 1.0);
        ranking.offer(&policy(1), 1.0);
        ranking.offer(&policy(3), 1.0);
        assert_eq!(ranking.into_solutions(Width::Top(1))[0].policy, policy(1));
    }

    #[test]
    fn floor_rises_once_full() {
        let mut ranking = Ranking::new(Width::Top(2), -10.0);
        ranking.offer(&policy(0), 2.0);
        assert_eq!(ranking.floor(), -10.0);
        ranking.offer(&policy(1), 3.0);
        assert_eq!(ranking.floor(), 2.0);
        assert!(ranking.prunes(1.0));
        assert!(!ranking.prunes(2.0));
    }

    proptest! {
        #[test]
        fn solutions_are_sorted_and_distinct(values in prop::collection::vec((0usize..20, -50.0f64..50.0), 1..60), k in 1usize..8) {
            let mut ranking = Ranking::new(Width::Top(k), Utility::NEG_INFINITY);
            for (a, v) in values.iter() {
                ranking.offer(&policy(*a), *v);
            }
            let solutions = ranking.into_solutions(Width::Top(k));
            prop_assert!(solutions.len() <= k);
            prop_assert!(solutions.windows(2).all(|w| w[0].value >= w[1].value));
            let set = solutions.iter().map(|s| s.policy.clone()).collect::<HashSet<_>>();
            prop_assert_eq!(set.len(), solutions.len());
        }
    }
}
