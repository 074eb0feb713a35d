use crate::api::v0::{Allocation, ResourceDetails};
use crate::cpuset::CpuSet;
use crate::topology::ReverseMap;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Compares the memory nodes of the container with the NUMA nodes its cpus
/// sit on. Skipped entirely when the container has no memory nodes.
pub(super) fn check(alloc: &mut Allocation, cpus: &CpuSet, mems: &CpuSet, rmap: &ReverseMap) {
    if mems.is_empty() {
        log::info!("no memory node info available, skipping memory alignment check");
        return;
    }

    let cpu_nodes: CpuSet = rmap
        .numa_nodes()
        .iter()
        .filter(|(_, node_cpus)| !cpus.is_disjoint(node_cpus))
        .map(|(&id, _)| id)
        .collect();
    let total = rmap.total_memory_bytes();

    log::debug!(
        "check memory alignment: cpu nodes [{cpu_nodes}] memory nodes [{mems}] total memory {total}"
    );

    alloc.alignment.memory = cpu_nodes == *mems;

    // nodes holding both container cpus and container memory
    for node in cpu_nodes.intersection(mems).iter() {
        let bytes = rmap.numa_memory_bytes(node);
        let details = ResourceDetails {
            cpus: cpus_on_node(cpus, node, rmap).to_vec(),
            memory_mib: bytes / BYTES_PER_MIB,
            memory_percent: percent_of(bytes, total),
            ..Default::default()
        };
        alloc.aligned_mut().memory.insert(node, details);
    }

    if alloc.alignment.memory {
        return;
    }

    let unaligned = &mut alloc.unaligned_mut().memory;
    unaligned.numa_nodes = mems.to_vec();

    // memory nodes without container cpus
    let extra_mems = mems.difference(&cpu_nodes);
    if !extra_mems.is_empty() {
        let bytes = extra_mems
            .iter()
            .map(|node| rmap.numa_memory_bytes(node))
            .fold(0u64, u64::saturating_add);
        unaligned.memory_mib = bytes / BYTES_PER_MIB;
        unaligned.memory_percent = percent_of(bytes, total);
    }

    // container cpus without local memory
    for node in cpu_nodes.difference(mems).iter() {
        unaligned
            .cpus
            .extend(cpus_on_node(cpus, node, rmap).iter());
    }
}

fn cpus_on_node(cpus: &CpuSet, node: usize, rmap: &ReverseMap) -> CpuSet {
    rmap.numa_nodes()
        .get(&node)
        .map(|node_cpus| cpus.intersection(node_cpus))
        .unwrap_or_default()
}

fn percent_of(bytes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    bytes as f64 / total as f64 * 100.0
}
