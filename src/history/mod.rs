//! Observation histories and joint action-observation histories.

mod histories;
mod joint;

pub use histories::*;
pub use joint::*;
