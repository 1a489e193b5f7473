use super::LocalPolicy;
use super::Tables;
use crate::CLUSTER_TOLERANCE;
use crate::Probability;
use crate::Radix;
use crate::Result;

/// The cluster every type of every agent fell into.
///
/// Two types of an agent share a cluster when they induce the same
/// distribution over the other agents' types and, for each of those,
/// the same belief over states. Acting identically on such types loses
/// nothing, so the clustered game is solved instead and its policies are
/// spread back over the original types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clusters {
    map: Vec<Vec<usize>>,
    counts: Vec<usize>,
}

impl Clusters {
    /// Every type in a cluster of its own.
    pub fn identity(types: &[usize]) -> Self {
        Self {
            map: types.iter().map(|n| (0..*n).collect()).collect(),
            counts: types.to_vec(),
        }
    }
    pub fn agents(&self) -> usize {
        self.map.len()
    }
    pub fn cluster(&self, agent: usize, ty: usize) -> usize {
        self.map[agent][ty]
    }
    /// Clusters per agent.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
    /// Types per agent before clustering.
    pub fn types(&self) -> Vec<usize> {
        self.map.iter().map(Vec::len).collect()
    }
    pub fn is_identity(&self) -> bool {
        self.map.iter().zip(self.counts.iter()).all(|(m, n)| m.len() == *n)
    }
    /// A policy of the clustered game, played type by type.
    pub fn expand(&self, policy: &LocalPolicy) -> LocalPolicy {
        self.map
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().map(|c| policy.action(i, *c)).collect())
            .collect::<Vec<Vec<usize>>>()
            .into()
    }
    fn merge(&mut self, agent: usize, classes: &[usize], count: usize) {
        self.map[agent].iter_mut().for_each(|c| *c = classes[*c]);
        self.counts[agent] = count;
    }
}

impl Tables {
    /// Merge equivalent types one agent at a time until a whole pass
    /// over the agents merges nothing.
    pub(super) fn cluster(&mut self) -> Result<Clusters> {
        let mut clusters = Clusters::identity(&self.types);
        loop {
            let mut merged = false;
            for agent in 0..self.types.len() {
                let (classes, count) = self.classes(agent)?;
                if count < self.types[agent] {
                    self.merge(agent, &classes, count)?;
                    clusters.merge(agent, &classes, count);
                    merged = true;
                }
            }
            if !merged {
                return Ok(clusters);
            }
        }
    }

    /// Class of every type of `agent`, and the number of classes. Types
    /// that never occur join class 0.
    fn classes(&self, agent: usize) -> Result<(Vec<usize>, usize)> {
        let types = Radix::new(self.types.clone())?;
        let mut rest = self.types.clone();
        rest[agent] = 1;
        let others = Radix::new(rest)?;
        let n = self.types[agent];
        let mut joint = vec![vec![0.0; others.size()]; n];
        let mut index = vec![vec![0; others.size()]; n];
        for jt in 0..types.size() {
            let mut digits = types.split(jt);
            let ty = std::mem::replace(&mut digits[agent], 0);
            let other = others.joint(&digits);
            joint[ty][other] = self.probability[jt];
            index[ty][other] = jt;
        }
        let marginal = joint
            .iter()
            .map(|row| row.iter().sum::<Probability>())
            .collect::<Vec<_>>();
        let equivalent = |a: usize, b: usize| {
            (0..others.size()).all(|o| {
                let (pa, pb) = (joint[a][o], joint[b][o]);
                (pa / marginal[a] - pb / marginal[b]).abs() <= CLUSTER_TOLERANCE
                    && (pa <= 0.0 || pb <= 0.0 || same(&self.beliefs[index[a][o]], &self.beliefs[index[b][o]]))
            })
        };
        let mut leaders = Vec::<usize>::new();
        let mut classes = vec![0; n];
        for ty in (0..n).filter(|ty| marginal[*ty] > 0.0) {
            match leaders.iter().position(|leader| equivalent(*leader, ty)) {
                Some(class) => classes[ty] = class,
                None => {
                    classes[ty] = leaders.len();
                    leaders.push(ty);
                }
            }
        }
        Ok((classes, leaders.len().max(1)))
    }

    /// Collapse the types of `agent` onto their classes. Payoffs of a
    /// merged joint type are the probability-weighted mean of its members,
    /// so every clustered policy keeps the value of its expansion.
    fn merge(&mut self, agent: usize, classes: &[usize], count: usize) -> Result<()> {
        let before = Radix::new(self.types.clone())?;
        let mut types = self.types.clone();
        types[agent] = count;
        let after = Radix::new(types.clone())?;
        let width = self.width;
        let mut probability = vec![0.0; after.size()];
        let mut beliefs = vec![Vec::new(); after.size()];
        let mut utility = vec![0.0; after.size() * width];
        let mut reward = vec![0.0; after.size() * width];
        for jt in (0..before.size()).filter(|jt| self.probability[*jt] > 0.0) {
            let p = self.probability[jt];
            let mut digits = before.split(jt);
            digits[agent] = classes[digits[agent]];
            let kt = after.joint(&digits);
            probability[kt] += p;
            for ja in 0..width {
                utility[kt * width + ja] += p * self.utility[jt * width + ja];
                reward[kt * width + ja] += p * self.reward[jt * width + ja];
            }
            if beliefs[kt].is_empty() {
                beliefs[kt] = std::mem::take(&mut self.beliefs[jt]);
            }
        }
        for kt in (0..after.size()).filter(|kt| probability[*kt] > 0.0) {
            let p = probability[kt];
            utility[kt * width..(kt + 1) * width].iter_mut().for_each(|u| *u /= p);
            reward[kt * width..(kt + 1) * width].iter_mut().for_each(|r| *r /= p);
        }
        self.types = types;
        self.probability = probability;
        self.beliefs = beliefs;
        self.utility = utility;
        self.reward = reward;
        Ok(())
    }
}

fn same(a: &[Probability], b: &[Probability]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= CLUSTER_TOLERANCE)
}
