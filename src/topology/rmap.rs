use std::collections::BTreeMap;
use std::fmt;

use super::{Cache, Error, LLC_MIN_LEVEL, Result, Topology};
use crate::cpuset::CpuSet;

/// Lookup tables keyed the opposite way of [`Topology`].
///
/// All domain maps are ordered by domain id, so walking them is deterministic.
/// A reverse map is cheap to build and is meant to be built fresh for every
/// alignment check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseMap {
    /// logical cpu -> canonical physical core id
    cpu_to_core: BTreeMap<usize, usize>,
    /// canonical physical core id -> logical cpus (SMT siblings)
    core_siblings: BTreeMap<usize, CpuSet>,
    /// llc id -> logical cpus
    llc: BTreeMap<usize, CpuSet>,
    /// numa node id -> logical cpus
    numa: BTreeMap<usize, CpuSet>,
    /// numa node id -> usable bytes
    numa_memory: BTreeMap<usize, u64>,
    total_memory: u64,
}

impl ReverseMap {
    /// Builds the reverse map of `topology`.
    ///
    /// NUMA nodes are visited in ascending id order. Within a node, caches of
    /// level [`LLC_MIN_LEVEL`] or above are visited by (level, lowest member cpu)
    /// and receive sequential LLC ids in that order.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCore`] if a core lists no logical processors.
    /// - [`Error::DuplicateCpus`] if a core lists a logical processor twice.
    /// - [`Error::MemoryOverflow`] if the usable memory does not fit in 64 bits.
    pub fn build(topology: &Topology) -> Result<Self> {
        let mut rmap = Self::default();

        let mut nodes: Vec<_> = topology.nodes.iter().collect();
        nodes.sort_by_key(|node| node.id);

        for node in nodes {
            let node_cpus = rmap.numa.entry(node.id).or_default();
            for core in &node.cores {
                let core_id = canonical_core_id(node.id, core.id, &core.logical_processors)?;
                let members = CpuSet::from(core.logical_processors.as_slice());
                log::trace!(
                    "rmap core {core_id} (reported {}) -> cpus [{members}]",
                    core.id
                );

                for cpu in members.iter() {
                    rmap.cpu_to_core.insert(cpu, core_id);
                }
                node_cpus.extend(&members);
                rmap.core_siblings
                    .entry(core_id)
                    .or_default()
                    .extend(&members);
            }

            if let Some(memory) = node.memory {
                let overflow = || Error::MemoryOverflow { node: node.id };
                let node_bytes = rmap.numa_memory.entry(node.id).or_default();
                *node_bytes = node_bytes
                    .checked_add(memory.total_usable_bytes)
                    .ok_or_else(overflow)?;
                rmap.total_memory = rmap
                    .total_memory
                    .checked_add(memory.total_usable_bytes)
                    .ok_or_else(overflow)?;
                log::trace!(
                    "rmap numa {} -> {} usable bytes",
                    node.id,
                    memory.total_usable_bytes
                );
            }

            // LLC is approximated as L3.
            let mut caches: Vec<(&Cache, CpuSet)> = node
                .caches
                .iter()
                .filter(|cache| cache.level >= LLC_MIN_LEVEL)
                .map(|cache| (cache, CpuSet::from(cache.logical_processors.as_slice())))
                .collect();
            caches.sort_by_key(|(cache, members)| (cache.level, members.first()));

            for (_, members) in caches {
                let llc_id = rmap.llc.len();
                log::trace!("rmap llc {llc_id} -> cpus [{members}]");
                rmap.llc.insert(llc_id, members);
            }
        }

        log::debug!("reverse mapping: {rmap}");
        Ok(rmap)
    }

    /// Returns the canonical physical core id owning `cpu`.
    pub fn physical_core_of(&self, cpu: usize) -> Option<usize> {
        self.cpu_to_core.get(&cpu).copied()
    }

    /// Returns all logical cpus of the physical core `core_id`.
    pub fn siblings(&self, core_id: usize) -> Option<&CpuSet> {
        self.core_siblings.get(&core_id)
    }

    /// LLC id -> member cpus.
    pub fn llc_domains(&self) -> &BTreeMap<usize, CpuSet> {
        &self.llc
    }

    /// NUMA node id -> member cpus.
    pub fn numa_nodes(&self) -> &BTreeMap<usize, CpuSet> {
        &self.numa
    }

    /// Usable memory of `node` in bytes, zero when unknown.
    pub fn numa_memory_bytes(&self, node: usize) -> u64 {
        self.numa_memory.get(&node).copied().unwrap_or_default()
    }

    /// Usable memory summed over all NUMA nodes.
    pub fn total_memory_bytes(&self) -> u64 {
        self.total_memory
    }
}

/// Computes a platform unique core id as the lowest logical cpu id of the core.
/// Discovery tools may report core ids which are only unique per package.
fn canonical_core_id(node: usize, reported: usize, cpus: &[usize]) -> Result<usize> {
    let Some(&lowest) = cpus.iter().min() else {
        return Err(Error::EmptyCore {
            node,
            core: reported,
        });
    };

    let unique = CpuSet::from(cpus);
    if unique.len() != cpus.len() {
        let mut sorted = cpus.to_vec();
        sorted.sort_unstable();
        let mut duplicates: Vec<usize> = sorted
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .map(|pair| pair[0])
            .collect();
        duplicates.dedup();
        return Err(Error::DuplicateCpus {
            node,
            core: reported,
            cpus: duplicates,
        });
    }

    Ok(lowest)
}

struct DomainsDisplay<'a>(&'a BTreeMap<usize, CpuSet>);

impl fmt::Display for DomainsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (id, cpus)) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{id:02}->[{cpus}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReverseMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<phys={{{}}} llc={{{}}} numa={{{}}} memory={}>",
            DomainsDisplay(&self.core_siblings),
            DomainsDisplay(&self.llc),
            DomainsDisplay(&self.numa),
            self.total_memory
        )
    }
}
