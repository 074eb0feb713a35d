use crate::api::v0::Allocation;
use crate::cpuset::CpuSet;
use crate::topology::ReverseMap;

/// Expands `cpus` to every SMT sibling of their physical cores. The container
/// is SMT aligned when the expansion adds nothing.
pub(super) fn check(alloc: &mut Allocation, cpus: &CpuSet, rmap: &ReverseMap) {
    let mut computed = cpus.clone();
    for cpu in cpus.iter() {
        let Some(core) = rmap.physical_core_of(cpu) else {
            log::warn!("cpu {cpu} is not part of the machine topology, treating it as its own core");
            continue;
        };
        if let Some(siblings) = rmap.siblings(core) {
            log::trace!("check SMT alignment: cpu {cpu} -> core {core} -> siblings [{siblings}]");
            computed.extend(siblings);
        }
    }

    log::debug!("check SMT alignment: cpus [{cpus}] computed [{computed}]");

    alloc.alignment.smt = computed == *cpus;
    if !alloc.alignment.smt {
        // computed is a superset of cpus
        alloc.unaligned_mut().smt.cpus = computed.difference(cpus).to_vec();
    }
}
