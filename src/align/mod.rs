//! Alignment checks of a container's resources against the machine topology.
//!
//! Four independent dimensions are checked:
//!
//! - **SMT**: the container owns either all hyperthread siblings of a core or none.
//! - **LLC**: all container cpus sit in a single last level cache domain.
//! - **NUMA**: all container cpus sit in a single NUMA node.
//! - **Memory**: the memory nodes of the container are exactly the NUMA nodes
//!   its cpus sit on.
//!
//! Each check fills its part of the [`Allocation`] report.
//!
//! # Example
//!
//! ```
//! use ctralign::align;
//! use ctralign::resources::ContainerResources;
//! use ctralign::topology::{Core, Node, Topology};
//!
//! let topology = Topology {
//!     nodes: vec![Node {
//!         id: 0,
//!         cores: vec![Core { id: 0, logical_processors: vec![0, 1] }],
//!         ..Default::default()
//!     }],
//! };
//! let container = ContainerResources::new([0].into(), Default::default());
//!
//! let alloc = align::check_topology(&container, &topology).unwrap();
//! assert!(!alloc.alignment.smt);
//! assert_eq!(alloc.unaligned.unwrap().smt.cpus, vec![1]);
//! ```
mod domain;
mod memory;
mod smt;

use crate::api::v0::Allocation;
use crate::cpuset::CpuSet;
use crate::resources::ContainerResources;
use crate::topology::{self, ReverseMap, Topology};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "memory nodes {mems} assigned but no memory information available from the machine topology"
    )]
    MemoryTopologyUnavailable { mems: CpuSet },
    #[error(transparent)]
    Topology(#[from] topology::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Checks the alignment of `container` against a prebuilt reverse map.
///
/// # Errors
///
/// Returns [`Error::MemoryTopologyUnavailable`] if the container has memory
/// nodes assigned but the topology reports no usable memory at all. No partial
/// report is returned in that case.
pub fn check(container: &ContainerResources, rmap: &ReverseMap) -> Result<Allocation> {
    if !container.mems.is_empty() && rmap.total_memory_bytes() == 0 {
        return Err(Error::MemoryTopologyUnavailable {
            mems: container.mems.clone(),
        });
    }

    let mut alloc = Allocation::default();

    smt::check(&mut alloc, &container.cpus, rmap);
    domain::check(&mut alloc, domain::Domain::Llc, &container.cpus, rmap.llc_domains());
    domain::check(&mut alloc, domain::Domain::Numa, &container.cpus, rmap.numa_nodes());
    memory::check(&mut alloc, &container.cpus, &container.mems, rmap);

    log::debug!("alignment of {container}: {:?}", alloc.alignment);
    Ok(alloc)
}

/// Builds a fresh reverse map of `topology` and checks `container` against it.
///
/// # Errors
///
/// Returns [`Error::Topology`] if the topology is malformed, and the errors
/// of [`check`].
pub fn check_topology(container: &ContainerResources, topology: &Topology) -> Result<Allocation> {
    let rmap = ReverseMap::build(topology)?;
    check(container, &rmap)
}
