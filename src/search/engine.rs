use super::Bound;
use super::Child;
use super::Expansion;
use super::Outcome;
use super::Pruning;
use super::Select;
use super::Settings;
use super::Variant;
use crate::Arena;
use crate::Bounds;
use crate::Clusters;
use crate::Deadline;
use crate::Entry;
use crate::Heuristic;
use crate::JointPolicy;
use crate::PlanError;
use crate::PolicyId;
use crate::Pool;
use crate::Problem;
use crate::Request;
use crate::Result;
use crate::Solve;
use crate::StageBuilder;
use crate::Utility;
use crate::Width;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::collections::VecDeque;

/// Selected children of an incrementally expanded node not yet emitted.
#[derive(Debug)]
struct Pending {
    types: Vec<usize>,
    children: VecDeque<Child>,
}

/// One restart of the search: arena, pool and bound from scratch.
///
/// Every pool entry holds one arena reference to its policy, and so does
/// the incumbent in the [`Bound`]. A popped node gives its reference back
/// once its children hold their own.
pub struct Engine<'a, P, H>
where
    P: Problem + ?Sized,
    H: Heuristic + ?Sized,
{
    builder: &'a StageBuilder<'a, P, H>,
    settings: &'a Settings,
    select: Select,
    discount: f64,
    deadline: Deadline,
    arena: Arena,
    pool: Pool,
    bound: Bound,
    pending: BTreeMap<PolicyId, Pending>,
}

impl<'a, P, H> Engine<'a, P, H>
where
    P: Problem + ?Sized,
    H: Heuristic + ?Sized,
{
    pub fn new(builder: &'a StageBuilder<'a, P, H>, settings: &'a Settings, discount: f64, deadline: Deadline) -> Self {
        Self {
            builder,
            settings,
            select: Select::from(settings.variant),
            discount,
            deadline,
            arena: Arena::default(),
            pool: Pool::default(),
            bound: Bound::new(settings.slack),
            pending: BTreeMap::new(),
        }
    }

    pub fn lower(&self) -> Utility {
        self.bound.lower()
    }
    pub fn live(&self) -> usize {
        self.arena.live()
    }

    /// Search until the pool runs dry or its top is dominated. Returns the
    /// best complete policy, if any, and releases everything else.
    pub fn run(&mut self, rng: &mut SmallRng, outcome: &mut Outcome) -> Result<Option<(JointPolicy, Utility)>> {
        let root = self.arena.root();
        let game = self.builder.build(&self.arena, root)?;
        let priority = (0..game.joint_types()).map(|jt| game.ceiling(jt)).sum::<Utility>();
        self.pool.push(root, priority, 0);
        outcome.max_pool = outcome.max_pool.max(self.pool.len());
        log::debug!("root upper bound {:.6}", priority);
        while let Some(top) = self.pool.peek().copied() {
            self.deadline.check("search")?;
            if self.bound.dead(top.priority) {
                log::debug!("pool top {:.6} cannot beat {:.6}", top.priority, self.bound.lower());
                break;
            }
            let entry = self.pool.pop()?;
            self.expand(entry, rng, outcome)?;
            if self.settings.pruning == Pruning::Eager {
                for id in self.pool.prune(self.bound.lower() - self.bound.slack()) {
                    self.discard(id)?;
                }
            }
            outcome.max_pool = outcome.max_pool.max(self.pool.len());
            if let Some(limit) = self.settings.pool_limit.filter(|limit| self.pool.len() > *limit) {
                return Err(PlanError::ResourceExhausted(format!(
                    "pool grew past {} entries",
                    limit
                )));
            }
        }
        for id in self.pool.clear() {
            self.discard(id)?;
        }
        match self.bound.take() {
            None => Ok(None),
            Some(best) => {
                let policy = self.arena.flatten(best)?;
                self.arena.release(best)?;
                Ok(Some((policy, self.bound.lower())))
            }
        }
    }

    fn expand(&mut self, entry: Entry, rng: &mut SmallRng, outcome: &mut Outcome) -> Result<()> {
        let Entry { id, priority, .. } = entry;
        let node = self.arena.get(id)?;
        let depth = node.depth();
        let past = node.past();
        if self.pending.contains_key(&id) {
            return self.advance(id, depth, outcome);
        }
        let last = depth + 1 == self.settings.horizon;
        let scale = self.discount.powi(depth as i32);
        let (game, clusters) = match self.settings.cluster {
            true => self.builder.cluster(&self.arena, id)?,
            false => {
                let game = self.builder.build(&self.arena, id)?;
                let clusters = Clusters::identity(game.type_counts());
                (game, clusters)
            }
        };
        outcome.games += 1;
        outcome.expandable[depth] = outcome.expandable[depth].saturating_add(game.policies().unwrap_or(u128::MAX));
        let width = match (self.settings.variant, last) {
            (_, true) => Width::Top(1),
            (Variant::Exact, false) => Width::All,
            (Variant::KBest { k }, false) => Width::Top(k),
        };
        let bounds = Bounds {
            lower: match self.bound.lower().is_finite() {
                true => (self.bound.lower() - self.bound.slack() - past) / scale,
                false => Utility::NEG_INFINITY,
            },
            upper: match last && self.discount == 1.0 {
                true => priority - past,
                false => Utility::INFINITY,
            },
        };
        let request = Request::new(width).bounds(bounds).deadline(self.deadline);
        let solutions = self.settings.solver.solve(&game, &request, rng)?;
        outcome.evaluated += solutions.len();
        log::trace!("depth {} game yields {} solutions", depth, solutions.len());
        let types = clusters.types();
        let children = solutions
            .into_iter()
            .map(|s| {
                let now = past + scale * game.immediate(&s.policy);
                Child {
                    priority: if last { now } else { past + scale * s.value },
                    past: now,
                    policy: clusters.expand(&s.policy),
                }
            })
            .collect::<Vec<Child>>();
        if last {
            if let Some(best) = children.into_iter().max_by(|a, b| a.priority.total_cmp(&b.priority)) {
                let leaf = self.arena.extend(id, &best.policy, &types, best.past)?;
                outcome.expanded[depth + 1] += 1;
                if let Some(loser) = self.bound.offer(leaf, best.priority) {
                    self.arena.release(loser)?;
                }
                if self.bound.best() == Some(leaf) {
                    log::debug!("lower bound rises to {:.6}", best.priority);
                }
            }
            return self.arena.release(id);
        }
        let children = self.select.apply(children, &self.bound);
        match self.settings.expansion {
            Expansion::Full => {
                self.pool.try_grow(children.len())?;
                for child in children {
                    self.push(id, depth, child, &types, outcome)?;
                }
                self.arena.release(id)
            }
            Expansion::Incremental => {
                let children = children.into();
                self.pending.insert(id, Pending { types, children });
                self.advance(id, depth, outcome)
            }
        }
    }

    /// Emit the next pending child of `id` and requeue `id` behind it.
    fn advance(&mut self, id: PolicyId, depth: usize, outcome: &mut Outcome) -> Result<()> {
        let pending = self
            .pending
            .get_mut(&id)
            .ok_or_else(|| PlanError::Invariant(format!("{:?} has no pending children", id)))?;
        let child = pending.children.pop_front();
        let next = pending.children.front().map(|c| c.priority);
        let types = pending.types.clone();
        if let Some(child) = child.filter(|c| !self.bound.dead(c.priority)) {
            self.push(id, depth, child, &types, outcome)?;
        }
        match next {
            Some(priority) => {
                self.pool.try_grow(1)?;
                self.pool.push(id, priority, depth);
                Ok(())
            }
            None => {
                self.pending.remove(&id);
                self.arena.release(id)
            }
        }
    }

    fn push(&mut self, parent: PolicyId, depth: usize, child: Child, types: &[usize], outcome: &mut Outcome) -> Result<()> {
        let id = self.arena.extend(parent, &child.policy, types, child.past)?;
        self.pool.push(id, child.priority, depth + 1);
        outcome.expanded[depth + 1] += 1;
        Ok(())
    }

    fn discard(&mut self, id: PolicyId) -> Result<()> {
        self.pending.remove(&id);
        self.arena.release(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecPomdp;
    use crate::Histories;
    use crate::Qmdp;
    use crate::Shape;
    use rand::SeedableRng;

    fn settings(variant: Variant, expansion: Expansion, pruning: Pruning) -> Settings {
        Settings {
            horizon: 3,
            variant,
            expansion,
            pruning,
            ..Settings::default()
        }
    }

    #[test]
    fn every_reference_is_returned() {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), 1.0, 5).unwrap();
        let heuristic = Qmdp::new(&problem, 3).unwrap();
        let histories = Histories::new(&problem, 3).unwrap();
        let builder = StageBuilder::new(&problem, &heuristic, &histories).unwrap();
        for expansion in [Expansion::Full, Expansion::Incremental] {
            for pruning in [Pruning::Eager, Pruning::Lazy] {
                let ref settings = settings(Variant::Exact, expansion, pruning);
                let mut engine = Engine::new(&builder, settings, 1.0, Deadline::none());
                let ref mut outcome = Outcome::new(3);
                let found = engine.run(&mut SmallRng::seed_from_u64(0), outcome).unwrap();
                assert!(found.is_some());
                assert_eq!(engine.live(), 0);
                assert!(engine.pending.is_empty());
            }
        }
    }

    #[test]
    fn children_extend_their_parent_by_one_discounted_stage() {
        let problem = DecPomdp::tiger();
        let heuristic = Qmdp::new(&problem, 3).unwrap();
        let histories = Histories::new(&problem, 3).unwrap();
        let builder = StageBuilder::new(&problem, &heuristic, &histories).unwrap();
        let ref settings = settings(Variant::KBest { k: 3 }, Expansion::Full, Pruning::Lazy);
        let mut engine = Engine::new(&builder, settings, problem.discount(), Deadline::none());
        let ref mut outcome = Outcome::new(3);
        let ref mut rng = SmallRng::seed_from_u64(0);
        let root = engine.arena.root();
        let entry = Entry {
            priority: Utility::INFINITY,
            depth: 0,
            seq: 0,
            id: root,
        };
        engine.expand(entry, rng, outcome).unwrap();
        assert_eq!(engine.pool.len(), 3);
        let child = engine.pool.pop().unwrap();
        let node = engine.arena.get(child.id).unwrap();
        assert_eq!(node.depth(), 1);
        assert_eq!(node.parent(), Some(root));
        let game = builder.build(&engine.arena, root).unwrap();
        let local = crate::LocalPolicy::new((0..2).map(|i| node.actions(i).to_vec()).collect());
        assert!((node.past() - game.immediate(&local)).abs() < 1e-9);
        assert!((child.priority - game.value(&local)).abs() < 1e-9);
    }

    #[test]
    fn greedy_search_keeps_a_single_entry() {
        let problem = DecPomdp::tiger();
        let heuristic = Qmdp::new(&problem, 3).unwrap();
        let histories = Histories::new(&problem, 3).unwrap();
        let builder = StageBuilder::new(&problem, &heuristic, &histories).unwrap();
        for expansion in [Expansion::Full, Expansion::Incremental] {
            let ref settings = settings(Variant::KBest { k: 1 }, expansion, Pruning::Lazy);
            let mut engine = Engine::new(&builder, settings, 1.0, Deadline::none());
            let ref mut outcome = Outcome::new(3);
            engine.run(&mut SmallRng::seed_from_u64(0), outcome).unwrap();
            assert_eq!(outcome.max_pool, 1);
            assert_eq!(outcome.expanded, vec![0, 1, 1, 1]);
        }
    }
}
