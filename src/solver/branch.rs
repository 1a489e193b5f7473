use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use super::Ticker;
use super::Width;
use crate::BayesianGame;
use crate::LocalPolicy;
use crate::Result;
use crate::Utility;
use rand::rngs::SmallRng;

const UNSET: usize = usize::MAX;

/// Order in which joint types are assigned during the depth-first search.
///
/// Zero-probability joint types always come last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeOrder {
    /// Joint type index order.
    Index,
    /// Largest complete-information contribution first.
    #[default]
    MaxContribution,
    /// Smallest complete-information contribution first.
    MinContribution,
    /// Largest gap between best and worst joint action first.
    ContributionSpread,
    /// Most probable joint type first.
    Probability,
}

/// How found solutions are retained while searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Retention {
    /// Keep the k best in a heap and prune against the k-th.
    #[default]
    Heap,
    /// Keep every solution above the lower bound, truncate at the end.
    Unbounded,
}

/// Depth-first branch and bound over joint type assignments.
///
/// Assigning a joint type fixes the actions of the (agent, type) pairs it
/// involves. The value collected so far plus the complete-information
/// maximum of every unassigned joint type bounds any completion, and
/// branches that cannot reach the current floor are cut.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BranchAndBound {
    pub order: TypeOrder,
    pub retention: Retention,
}

impl BranchAndBound {
    fn order(&self, game: &BayesianGame) -> Vec<usize> {
        let spread = |jt: usize| {
            let row = game.row(jt);
            let max = row.iter().copied().fold(Utility::NEG_INFINITY, Utility::max);
            let min = row.iter().copied().fold(Utility::INFINITY, Utility::min);
            game.probability(jt) * (max - min)
        };
        let mut order = (0..game.joint_types()).collect::<Vec<_>>();
        match self.order {
            TypeOrder::Index => {}
            TypeOrder::MaxContribution => order.sort_by(|a, b| game.ceiling(*b).total_cmp(&game.ceiling(*a))),
            TypeOrder::MinContribution => order.sort_by(|a, b| game.ceiling(*a).total_cmp(&game.ceiling(*b))),
            TypeOrder::ContributionSpread => order.sort_by(|a, b| spread(*b).total_cmp(&spread(*a))),
            TypeOrder::Probability => {
                order.sort_by(|a, b| game.probability(*b).total_cmp(&game.probability(*a)))
            }
        }
        order.sort_by_key(|jt| game.probability(*jt) <= 0.0);
        order
    }
}

impl Solve for BranchAndBound {
    fn solve(&self, game: &BayesianGame, request: &Request, _: &mut SmallRng) -> Result<Vec<Solution>> {
        let order = self.order(game);
        let mut suffix = vec![0.0; order.len() + 1];
        for d in (0..order.len()).rev() {
            suffix[d] = suffix[d + 1] + game.ceiling(order[d]);
        }
        let retained = match self.retention {
            Retention::Heap => request.width,
            Retention::Unbounded => Width::All,
        };
        let mut search = Search {
            game,
            request,
            order,
            suffix,
            assigned: game.type_counts().iter().map(|n| vec![UNSET; *n]).collect(),
            ranking: Ranking::new(retained, request.bounds.lower),
            ticker: request.deadline.ticker("branch and bound"),
            done: false,
        };
        search.visit(0, 0.0)?;
        log::trace!("branch and bound evaluated {} leaves", search.ranking.offers());
        Ok(search.ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        true
    }
}

struct Search<'a> {
    game: &'a BayesianGame,
    request: &'a Request,
    order: Vec<usize>,
    suffix: Vec<Utility>,
    assigned: Vec<Vec<usize>>,
    ranking: Ranking,
    ticker: Ticker<'a>,
    done: bool,
}

impl Search<'_> {
    fn visit(&mut self, depth: usize, collected: Utility) -> Result<()> {
        self.ticker.tick()?;
        if self.done || self.ranking.prunes(collected + self.suffix[depth]) {
            return Ok(());
        }
        if depth == self.order.len() {
            return self.leaf();
        }
        let game = self.game;
        let jt = self.order[depth];
        let p = game.probability(jt);
        let digits = game.type_digits(jt);
        let radix = game.action_radix();
        let mut candidates = (0..game.joint_actions())
            .filter(|ja| {
                digits.iter().enumerate().all(|(i, ty)| {
                    let fixed = self.assigned[i][*ty];
                    fixed == UNSET || fixed == radix.digit(*ja, i)
                })
            })
            .map(|ja| (ja, game.utility(jt, ja)))
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let free = digits
            .iter()
            .enumerate()
            .filter(|(i, ty)| self.assigned[*i][**ty] == UNSET)
            .map(|(i, ty)| (i, *ty))
            .collect::<Vec<_>>();
        for (ja, u) in candidates {
            for (i, ty) in free.iter() {
                self.assigned[*i][*ty] = radix.digit(ja, *i);
            }
            self.visit(depth + 1, collected + p * u)?;
            for (i, ty) in free.iter() {
                self.assigned[*i][*ty] = UNSET;
            }
            if self.done {
                break;
            }
        }
        Ok(())
    }

    /// Every (agent, type) pair occurs in some joint type, so once all
    /// joint types are assigned the local policy is complete.
    fn leaf(&mut self) -> Result<()> {
        let policy = LocalPolicy::new(self.assigned.clone());
        let value = self.game.value(&policy);
        self.ranking.offer(&policy, value);
        if self.request.stops_at_upper() && self.request.bounds.reaches(value) {
            self.done = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BruteForce;
    use rand::SeedableRng;

    const ORDERS: [TypeOrder; 5] = [
        TypeOrder::Index,
        TypeOrder::MaxContribution,
        TypeOrder::MinContribution,
        TypeOrder::ContributionSpread,
        TypeOrder::Probability,
    ];

    #[test]
    fn matches_brute_force_rankings() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        for seed in 0..4 {
            let game = BayesianGame::random(vec![2, 3], vec![2, 3], seed).unwrap();
            for k in [1, 3, 10] {
                let request = Request::new(Width::Top(k));
                let truth = BruteForce::default().solve(&game, &request, rng).unwrap();
                for order in ORDERS {
                    for retention in [Retention::Heap, Retention::Unbounded] {
                        let bnb = BranchAndBound { order, retention };
                        let found = bnb.solve(&game, &request, rng).unwrap();
                        assert_eq!(found.len(), truth.len());
                        for (a, b) in found.iter().zip(truth.iter()) {
                            assert!((a.value - b.value).abs() < 1e-9, "{:?} {:?} k={}", order, retention, k);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn all_enumerates_the_full_space() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let game = BayesianGame::random(vec![2, 2], vec![2, 2], 3).unwrap();
        let found = BranchAndBound::default()
            .solve(&game, &Request::new(Width::All), rng)
            .unwrap();
        assert_eq!(found.len() as u128, game.policies().unwrap());
    }

    #[test]
    fn zero_probability_types_go_last() {
        let probability = vec![0.0, 0.5, 0.5, 0.0];
        let utility = vec![1.0; 16];
        let game = BayesianGame::new(0, vec![2, 2], vec![2, 2], probability, utility.clone(), utility).unwrap();
        let order = BranchAndBound::default().order(&game);
        assert_eq!(&order[2..], &[0, 3]);
    }
}
