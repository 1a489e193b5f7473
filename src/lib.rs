//! Generalized MAA* planning for decentralized POMDPs.
//!
//! Anytime heuristic search over partial joint policies. Every expansion
//! builds a one-shot identical-payoff Bayesian game for the next stage and
//! hands it to a pluggable solver; the ranked solutions become children in
//! a priority pool bounded by the best complete policy found so far.
//!
//! # Module Structure
//!
//! - `index`: Mixed-radix joint indexing with overflow checks
//! - `model`: Dec-POMDP problem interface, tabular models, beliefs
//! - `history`: Observation histories and joint action-observation histories
//! - `heuristic`: Admissible Q-value functions (QMDP, QPOMDP, QBG)
//! - `policy`: Partial joint policies in a reference-counted arena
//! - `game`: Stage Bayesian games, their builder, lossless type clustering
//! - `solver`: Bayesian game solvers (exact and approximate)
//! - `pool`: Max-priority policy pool
//! - `search`: The NEXT/SELECT planning loop
//! - `eval`: Exact evaluation, simulation, exhaustive enumeration
//! - `error`: Error taxonomy

mod error;
mod eval;
mod game;
mod heuristic;
mod history;
mod index;
mod model;
mod policy;
mod pool;
mod search;
mod solver;

#[cfg(test)]
mod tests;

pub use error::*;
pub use eval::*;
pub use game::*;
pub use heuristic::*;
pub use history::*;
pub use index::*;
pub use model::*;
pub use policy::*;
pub use pool::*;
pub use search::*;
pub use solver::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Expected rewards, heuristic values, and Bayesian game payoffs.
pub type Utility = f64;
/// Beliefs, joint type probabilities, and sampling distributions.
pub type Probability = f64;

// ============================================================================
// NUMERICAL TOLERANCES
// ============================================================================
/// Slack allowed when checking that a distribution sums to one.
pub const PROBABILITY_TOLERANCE: Probability = 1e-6;
/// Two rewards closer than this are considered equal.
pub const REWARD_TOLERANCE: Utility = 1e-9;
/// Largest gap between two probabilities of types merged by clustering.
pub const CLUSTER_TOLERANCE: Probability = 1e-9;

// ============================================================================
// SEARCH DEFAULTS
// ============================================================================
/// Default slack on the early-stop test `priority + slack < lower`.
pub const SEARCH_SLACK: Utility = 0.0;
/// Default number of sequential search restarts.
pub const SEARCH_RESTARTS: usize = 1;
/// Default width of the k-best search variant.
pub const SEARCH_WIDTH: usize = 1;
/// Default seed for the per-restart random generators.
pub const SEARCH_SEED: u64 = 0;

// ============================================================================
// SOLVER DEFAULTS
// Iteration budgets for the approximate Bayesian game solvers.
// ============================================================================
/// Inner-loop iterations between two wall-clock deadline checks.
pub const DEADLINE_PERIOD: usize = 1024;
/// Random restarts for alternating maximization.
pub const AM_RESTARTS: usize = 10;
/// Random restarts for cross-entropy optimization.
pub const CE_RESTARTS: usize = 10;
/// Distribution updates per cross-entropy restart.
pub const CE_ITERATIONS: usize = 50;
/// Local policies sampled per cross-entropy iteration.
pub const CE_SAMPLES: usize = 50;
/// Elite samples kept per cross-entropy iteration.
pub const CE_ELITES: usize = 5;
/// Learning rate of the cross-entropy distribution update.
pub const CE_ALPHA: Probability = 0.2;
/// Random restarts for max-plus message passing.
pub const MP_RESTARTS: usize = 10;
/// Message passing rounds per max-plus restart.
pub const MP_ITERATIONS: usize = 50;
/// Weight kept from the previous message, in [0, 1).
pub const MP_DAMPING: Utility = 0.5;
/// Messages moving less than this are considered converged.
pub const MP_TOLERANCE: Utility = 1e-9;
/// Samples drawn by the random baseline when every solution is requested.
pub const RANDOM_SAMPLES: usize = 64;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() -> std::io::Result<()> {
    std::fs::create_dir_all("logs")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time))?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).map_err(std::io::Error::other)
}
