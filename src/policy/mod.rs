//! Partial joint policies.
//!
//! A partial joint policy of depth d assigns an action to every
//! observation history of length < d of every agent. Children extend
//! their parent by exactly one stage, so a node only stores the newest
//! stage and reaches older stages through its parent. All nodes live in
//! an [`Arena`] and refer to their parent by [`PolicyId`].

mod arena;
mod joint;
mod partial;

pub use arena::*;
pub use joint::*;
pub use partial::*;
