//! Mixed-radix joint indexing.

mod radix;

pub use radix::*;
