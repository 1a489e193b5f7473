use super::JointPolicy;
use super::PartialPolicy;
use super::PolicyId;
use crate::LocalPolicy;
use crate::PlanError;
use crate::Result;
use crate::Utility;

#[derive(Debug)]
struct Slot {
    policy: PartialPolicy,
    refs: usize,
}

/// Reference-counted storage for partial policy chains.
///
/// Every handle returned by [`Arena::root`] or [`Arena::extend`] owns one
/// reference. Children own a reference to their parent, so a node is
/// reclaimed only after the last pool entry, driver handle and child that
/// points at it has let go. Slots are recycled through a free list.
#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    live: usize,
}

impl Arena {
    pub fn root(&mut self) -> PolicyId {
        self.alloc(PartialPolicy::root())
    }

    /// Create the child of `parent` that plays `local` at the next stage.
    /// `types` are the per-agent history counts of that stage.
    pub fn extend(
        &mut self,
        parent: PolicyId,
        local: &LocalPolicy,
        types: &[usize],
        past: Utility,
    ) -> Result<PolicyId> {
        let depth = self.get(parent)?.depth() + 1;
        if local.agents() != types.len() {
            return Err(PlanError::Invariant(format!(
                "local policy covers {} agents, stage has {}",
                local.agents(),
                types.len()
            )));
        }
        if let Some(i) = (0..types.len()).find(|i| local.actions(*i).len() != types[*i]) {
            return Err(PlanError::Invariant(format!(
                "agent {} has {} actions for {} types",
                i,
                local.actions(i).len(),
                types[i]
            )));
        }
        self.retain(parent)?;
        let stage = (0..types.len()).map(|i| local.actions(i).to_vec()).collect();
        Ok(self.alloc(PartialPolicy::child(parent, depth, past, stage)))
    }

    pub fn get(&self, id: PolicyId) -> Result<&PartialPolicy> {
        self.slot(id).map(|slot| &slot.policy)
    }

    pub fn retain(&mut self, id: PolicyId) -> Result<()> {
        self.slot_mut(id)?.refs += 1;
        Ok(())
    }

    /// Drop one reference, reclaiming the node and then walking up the
    /// chain for as long as counts reach zero.
    pub fn release(&mut self, id: PolicyId) -> Result<()> {
        let mut next = Some(id);
        while let Some(id) = next {
            let slot = self.slot_mut(id)?;
            slot.refs -= 1;
            if slot.refs > 0 {
                break;
            }
            next = self.slots[id.0]
                .take()
                .and_then(|slot| slot.policy.parent());
            self.free.push(id.0);
            self.live -= 1;
        }
        Ok(())
    }

    /// Number of nodes currently alive.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Ancestors of `id` ordered by stage: entry k assigns stage k.
    /// The depth-0 root is not included.
    pub fn chain(&self, id: PolicyId) -> Result<Vec<&PartialPolicy>> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id)?;
        while let Some(parent) = cursor.parent() {
            chain.push(cursor);
            cursor = self.get(parent)?;
        }
        chain.reverse();
        match chain.len() == self.get(id)?.depth() {
            true => Ok(chain),
            false => Err(PlanError::Invariant(format!(
                "policy of depth {} has a chain of {} stages",
                self.get(id)?.depth(),
                chain.len()
            ))),
        }
    }

    /// Action of `agent` after observation history `history` of length `stage`.
    pub fn action(&self, id: PolicyId, agent: usize, stage: usize, history: usize) -> Result<usize> {
        self.chain(id)?
            .get(stage)
            .and_then(|node| node.actions(agent).get(history).copied())
            .ok_or_else(|| {
                PlanError::InconsistentScope(format!(
                    "no action for agent {} history {} at stage {}",
                    agent, history, stage
                ))
            })
    }

    /// Copy the chain ending at `id` into a standalone joint policy.
    pub fn flatten(&self, id: PolicyId) -> Result<JointPolicy> {
        let chain = self.chain(id)?;
        let agents = chain.first().map(|p| p.agents()).unwrap_or_default();
        let actions = (0..agents)
            .map(|i| chain.iter().map(|p| p.actions(i).to_vec()).collect())
            .collect();
        Ok(JointPolicy::new(actions))
    }

    fn alloc(&mut self, policy: PartialPolicy) -> PolicyId {
        let slot = Some(Slot { policy, refs: 1 });
        self.live += 1;
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = slot;
                PolicyId(i)
            }
            None => {
                self.slots.push(slot);
                PolicyId(self.slots.len() - 1)
            }
        }
    }
    fn slot(&self, id: PolicyId) -> Result<&Slot> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| PlanError::Invariant(format!("dangling policy {:?}", id)))
    }
    fn slot_mut(&mut self, id: PolicyId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| PlanError::Invariant(format!("dangling policy {:?}", id)))
    }
}
