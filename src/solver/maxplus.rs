use super::Ranking;
use super::Request;
use super::Solution;
use super::Solve;
use crate::BayesianGame;
use crate::LocalPolicy;
use crate::MP_DAMPING;
use crate::MP_ITERATIONS;
use crate::MP_RESTARTS;
use crate::MP_TOLERANCE;
use crate::PlanError;
use crate::Result;
use crate::Utility;
use petgraph::graph::EdgeIndex;
use petgraph::graph::NodeIndex;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::Rng;
use rand::rngs::SmallRng;

/// Message update order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// Every message is computed from the previous iteration's messages.
    #[default]
    Parallel,
    /// Factors are visited in turn, each seeing the updates before it.
    Serial,
}

/// Max-plus message passing on the factor graph of a Bayesian game.
///
/// Variables are (agent, type) pairs with one value per action. Every
/// joint type of positive probability is a factor over the types it
/// combines, with potential `P(θ)·u(θ, a)`. Messages are normalised to
/// zero mean and damped. The argmax decoding of each iteration is offered
/// as a candidate solution.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaxPlus {
    pub restarts: usize,
    pub iterations: usize,
    pub damping: f64,
    pub schedule: Schedule,
    pub tolerance: Utility,
}

impl Default for MaxPlus {
    fn default() -> Self {
        Self {
            restarts: MP_RESTARTS,
            iterations: MP_ITERATIONS,
            damping: MP_DAMPING,
            schedule: Schedule::default(),
            tolerance: MP_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertex {
    Variable { agent: usize, ty: usize },
    Factor,
}

/// Both directions of the messages along one edge.
#[derive(Debug, Clone)]
struct Messages {
    /// variable to factor
    up: Vec<Utility>,
    /// factor to variable
    down: Vec<Utility>,
}

/// A factor node with its edges in agent order.
struct Factor {
    jt: usize,
    links: Vec<(EdgeIndex, NodeIndex)>,
}

struct FactorGraph {
    graph: UnGraph<Vertex, Messages>,
    factors: Vec<Factor>,
}

impl FactorGraph {
    fn new(game: &BayesianGame) -> Result<Self> {
        let mut graph = UnGraph::<Vertex, Messages>::new_undirected();
        let mut variables = Vec::with_capacity(game.agents());
        for agent in 0..game.agents() {
            let mut nodes = Vec::with_capacity(game.types(agent));
            for ty in 0..game.types(agent) {
                nodes.push(graph.add_node(Vertex::Variable { agent, ty }));
            }
            variables.push(nodes);
        }
        let mut factors = Vec::new();
        for jt in (0..game.joint_types()).filter(|jt| game.probability(*jt) > 0.0) {
            let node = graph.add_node(Vertex::Factor);
            let mut links = Vec::with_capacity(game.agents());
            for (agent, ty) in game.type_digits(jt).iter().enumerate() {
                let variable = variables[agent][*ty];
                let messages = Messages {
                    up: vec![0.0; game.actions(agent)],
                    down: vec![0.0; game.actions(agent)],
                };
                links.push((graph.add_edge(node, variable, messages), variable));
            }
            factors.push(Factor { jt, links });
        }
        match factors.is_empty() {
            true => Err(PlanError::Invariant(format!(
                "stage {} game has no joint type with positive probability",
                game.stage()
            ))),
            false => Ok(Self { graph, factors }),
        }
    }

    fn perturb(&mut self, rng: &mut SmallRng) {
        for edge in self.graph.edge_indices().collect::<Vec<_>>() {
            for m in self.graph[edge].down.iter_mut() {
                *m = rng.random::<Utility>();
            }
        }
    }

    /// Sum of the other factors' messages into `variable`.
    fn up(&self, edge: EdgeIndex, variable: NodeIndex) -> Vec<Utility> {
        let n = self.graph[edge].up.len();
        self.graph
            .edges(variable)
            .filter(|e| e.id() != edge)
            .fold(vec![0.0; n], |mut sum, e| {
                sum.iter_mut().zip(e.weight().down.iter()).for_each(|(s, m)| *s += m);
                sum
            })
    }

    /// Outgoing messages of one factor, in agent order.
    fn down(&self, game: &BayesianGame, factor: &Factor) -> Vec<Vec<Utility>> {
        let radix = game.action_radix();
        let mut out = factor
            .links
            .iter()
            .map(|(e, _)| vec![Utility::NEG_INFINITY; self.graph[*e].up.len()])
            .collect::<Vec<_>>();
        for ja in 0..game.joint_actions() {
            let digits = radix.split(ja);
            let incoming = factor
                .links
                .iter()
                .zip(digits.iter())
                .map(|((e, _), a)| self.graph[*e].up[*a])
                .sum::<Utility>();
            let total = game.probability(factor.jt) * game.utility(factor.jt, ja) + incoming;
            for (i, ((e, _), a)) in factor.links.iter().zip(digits.iter()).enumerate() {
                let excluded = total - self.graph[*e].up[*a];
                if excluded > out[i][*a] {
                    out[i][*a] = excluded;
                }
            }
        }
        out
    }

    fn iterate(&mut self, game: &BayesianGame, schedule: Schedule, damping: f64) -> Utility {
        let mut delta = 0.0;
        match schedule {
            Schedule::Parallel => {
                let ups = self
                    .factors
                    .iter()
                    .flat_map(|f| f.links.iter())
                    .map(|(e, v)| (*e, self.up(*e, *v)))
                    .collect::<Vec<_>>();
                let downs = self
                    .factors
                    .iter()
                    .map(|f| self.down(game, f))
                    .collect::<Vec<_>>();
                for (edge, up) in ups {
                    delta = f64::max(delta, blend(&mut self.graph[edge].up, up, damping));
                }
                for (f, down) in downs.into_iter().enumerate() {
                    for (i, message) in down.into_iter().enumerate() {
                        let edge = self.factors[f].links[i].0;
                        delta = f64::max(delta, blend(&mut self.graph[edge].down, message, damping));
                    }
                }
            }
            Schedule::Serial => {
                for f in 0..self.factors.len() {
                    for i in 0..self.factors[f].links.len() {
                        let (edge, variable) = self.factors[f].links[i];
                        let up = self.up(edge, variable);
                        delta = f64::max(delta, blend(&mut self.graph[edge].up, up, damping));
                    }
                    let down = self.down(game, &self.factors[f]);
                    for (i, message) in down.into_iter().enumerate() {
                        let edge = self.factors[f].links[i].0;
                        delta = f64::max(delta, blend(&mut self.graph[edge].down, message, damping));
                    }
                }
            }
        }
        delta
    }

    /// Per-variable argmax of the incoming messages, lowest action on ties.
    fn decode(&self, game: &BayesianGame) -> LocalPolicy {
        let mut policy = LocalPolicy::zeros(game.type_counts());
        for node in self.graph.node_indices() {
            if let Vertex::Variable { agent, ty } = self.graph[node] {
                let mut belief = vec![0.0; game.actions(agent)];
                for edge in self.graph.edges(node) {
                    belief
                        .iter_mut()
                        .zip(edge.weight().down.iter())
                        .for_each(|(b, m)| *b += m);
                }
                let best = belief
                    .iter()
                    .enumerate()
                    .fold((0, Utility::NEG_INFINITY), |acc, (a, b)| if *b > acc.1 { (a, *b) } else { acc })
                    .0;
                policy.set(agent, ty, best);
            }
        }
        policy
    }
}

/// Damped, zero-mean update in place. Returns the largest change.
fn blend(old: &mut [Utility], new: Vec<Utility>, damping: f64) -> Utility {
    let mean = new.iter().sum::<Utility>() / new.len().max(1) as Utility;
    let mut delta = 0.0;
    for (o, n) in old.iter_mut().zip(new) {
        let x = damping * *o + (1.0 - damping) * (n - mean);
        delta = f64::max(delta, (x - *o).abs());
        *o = x;
    }
    delta
}

impl Solve for MaxPlus {
    fn solve(&self, game: &BayesianGame, request: &Request, rng: &mut SmallRng) -> Result<Vec<Solution>> {
        let ref mut ticker = request.deadline.ticker("max-plus");
        let mut ranking = Ranking::new(request.width, request.bounds.lower);
        for restart in 0..self.restarts.max(1) {
            let mut graph = FactorGraph::new(game)?;
            if restart > 0 {
                graph.perturb(rng);
            }
            for _ in 0..self.iterations.max(1) {
                ticker.tick()?;
                let delta = graph.iterate(game, self.schedule, self.damping);
                let policy = graph.decode(game);
                ranking.offer(&policy, game.value(&policy));
                if delta < self.tolerance {
                    break;
                }
            }
        }
        Ok(ranking.into_solutions(request.width))
    }
    fn is_exact(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Width;
    use rand::SeedableRng;

    #[test]
    fn factors_cover_the_support() {
        let game = BayesianGame::random(vec![2, 3], vec![2, 2], 0).unwrap();
        let graph = FactorGraph::new(&game).unwrap();
        let supported = (0..game.joint_types()).filter(|jt| game.probability(*jt) > 0.0).count();
        assert_eq!(graph.factors.len(), supported);
        assert_eq!(graph.graph.edge_count(), supported * game.agents());
        assert_eq!(graph.graph.node_count(), supported + 2 + 3);
    }

    #[test]
    fn single_type_games_are_solved_exactly() {
        // one joint type is a tree, where max-plus is exact
        for seed in 0..5 {
            let game = BayesianGame::random(vec![1, 1], vec![3, 4], seed).unwrap();
            let best = (0..game.joint_actions())
                .map(|ja| game.utility(0, ja))
                .fold(Utility::NEG_INFINITY, f64::max);
            let found = MaxPlus::default()
                .solve(&game, &Request::new(Width::Top(1)), &mut SmallRng::seed_from_u64(seed))
                .unwrap();
            assert!((found[0].value - best).abs() < 1e-9);
        }
    }
}
