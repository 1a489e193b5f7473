//! Dec-POMDP problem models.
//!
//! The planner only ever reads a model through [`Problem`]. [`DecPomdp`]
//! is the dense tabular implementation used by the binary, the tests and
//! the benchmarks.

mod belief;
mod decpomdp;
mod shape;
mod tiger;

pub use belief::*;
pub use decpomdp::*;
pub use shape::*;

use crate::Probability;
use crate::Radix;
use crate::Result;
use crate::Utility;

/// Read-only view of a discrete Dec-POMDP.
///
/// Joint actions and joint observations are mixed-radix indices with
/// agent 0 most significant (see [`Radix`]).
pub trait Problem: Send + Sync {
    fn agents(&self) -> usize;
    fn states(&self) -> usize;
    fn actions(&self, agent: usize) -> usize;
    fn observations(&self, agent: usize) -> usize;
    fn discount(&self) -> f64;
    /// Initial state distribution.
    fn initial(&self) -> &[Probability];
    /// P(s' | s, ja)
    fn transition(&self, state: usize, joint: usize, next: usize) -> Probability;
    /// P(jo | ja, s')
    fn observation(&self, joint: usize, next: usize, observed: usize) -> Probability;
    /// R(s, ja)
    fn reward(&self, state: usize, joint: usize) -> Utility;

    fn joint_actions(&self) -> Result<Radix> {
        Radix::new((0..self.agents()).map(|i| self.actions(i)).collect())
    }
    fn joint_observations(&self) -> Result<Radix> {
        Radix::new((0..self.agents()).map(|i| self.observations(i)).collect())
    }
}
