//! Ground truth for joint policies.
//!
//! [`evaluate`] computes the exact expected return by forward propagation
//! over joint observation histories. [`simulate`] estimates it by sampling
//! episodes, and [`exhaustive`] finds the optimal policy by enumerating
//! every joint policy of a small problem.

mod exact;
mod exhaustive;
mod simulate;

pub use exact::*;
pub use exhaustive::*;
pub use simulate::*;
