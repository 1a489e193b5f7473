use super::Bound;
use super::Variant;
use crate::LocalPolicy;
use crate::Utility;

/// A candidate child produced by NEXT.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub policy: LocalPolicy,
    pub priority: Utility,
    pub past: Utility,
}

/// Which NEXT candidates survive into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Select {
    KeepAll,
    Best(usize),
}

impl From<Variant> for Select {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Exact => Self::KeepAll,
            Variant::KBest { k } => Self::Best(k),
        }
    }
}

impl Select {
    /// Drop dominated children and keep the survivors in non-increasing
    /// priority order, at most k of them for [`Select::Best`].
    pub fn apply(&self, mut children: Vec<Child>, bound: &Bound) -> Vec<Child> {
        children.retain(|c| !bound.dead(c.priority));
        children.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        if let Self::Best(k) = self {
            children.truncate(*k);
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PolicyId;

    fn child(priority: Utility) -> Child {
        Child {
            policy: LocalPolicy::zeros(&[1]),
            priority,
            past: 0.0,
        }
    }

    #[test]
    fn best_keeps_at_most_k() {
        let mut bound = Bound::new(0.0);
        bound.offer(PolicyId(0), 1.5);
        let children = [3.0, 1.0, 5.0, 2.0, 4.0].map(child).to_vec();
        let kept = Select::Best(2).apply(children.clone(), &bound);
        assert_eq!(kept.iter().map(|c| c.priority).collect::<Vec<_>>(), vec![5.0, 4.0]);
        let kept = Select::KeepAll.apply(children, &bound);
        assert_eq!(kept.len(), 4);
    }
}
