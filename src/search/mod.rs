//! The NEXT/SELECT planning loop.
//!
//! A [`Planner`] owns the problem and the injected heuristic. Each restart
//! runs an [`Engine`] over a fresh arena, pool and [`Bound`]:
//!
//! 1. pop the most promising partial policy
//! 2. build its stage Bayesian game and solve it (NEXT)
//! 3. score the children and keep the ones [`Select`] allows
//! 4. push them back, or on the last stage offer the best to the bound
//!
//! until the pool is exhausted or its top can no longer beat the bound.

mod bound;
mod engine;
mod outcome;
mod planner;
mod select;
mod settings;

pub use bound::*;
pub use engine::*;
pub use outcome::*;
pub use planner::*;
pub use select::*;
pub use settings::*;
