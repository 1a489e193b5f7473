//! Admissible heuristic Q-value functions.
//!
//! A heuristic estimates, for a joint action-observation history at stage
//! t and a joint action, the expected discounted return collected from t
//! onward (discounting restarts at t). For exact search the estimate must
//! never fall below what any policy can actually achieve.
//!
//! | heuristic | relaxation                                  | tightness |
//! |-----------|---------------------------------------------|-----------|
//! | QMDP      | state fully observed after stage t          | loose     |
//! | QPOMDP    | joint history shared by all agents          | tighter   |
//! | QBG       | joint history shared with a one-stage delay | tightest  |

mod qbg;
mod qmdp;
mod qpomdp;

pub use qbg::*;
pub use qmdp::*;
pub use qpomdp::*;

use crate::JointHistory;
use crate::Utility;

/// Q-value source consumed by the stage game builder.
pub trait Heuristic: Send + Sync {
    /// Expected return from `history.stage()` onward after taking `joint`.
    fn q(&self, history: &JointHistory, joint: usize) -> Utility;
    /// Number of stages the values cover.
    fn horizon(&self) -> usize;
}
