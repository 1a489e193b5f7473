//! Max-priority pool of partial policies awaiting expansion.

mod entry;
mod heap;

pub use entry::*;
pub use heap::*;
