//! Stage Bayesian games.
//!
//! Expanding a partial policy of depth t means choosing actions for every
//! length-t observation history of every agent. Those histories are the
//! agents' private types; the shared payoff of a joint type and joint
//! action is the heuristic Q-value of the induced joint history.

mod bayesian;
mod builder;
mod cluster;
mod local;

pub use bayesian::*;
pub use builder::*;
pub use cluster::*;
pub use local::*;
