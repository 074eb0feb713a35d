//! Hardware topology model and its reverse mapping.
//!
//! The [`Topology`] model is produced by an external discovery tool and loaded
//! from JSON. [`ReverseMap`] turns it around: instead of nodes containing cores
//! containing CPUs, it answers "which core, cache domain or NUMA node does this
//! CPU belong to" and "which CPUs belong to this domain".
mod error;
mod model;
mod rmap;

pub use error::{Error, Result};
pub use model::{Cache, Core, Node, NodeMemory, Topology};
pub use rmap::ReverseMap;

/// Cache level treated as last level cache. Levels at or above this count.
pub const LLC_MIN_LEVEL: u8 = 3;
