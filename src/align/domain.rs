use std::collections::BTreeMap;
use std::fmt;

use crate::api::v0::{AlignedInfo, Allocation, Alignment, ResourceDetails, UnalignedInfo};
use crate::cpuset::CpuSet;

/// Topology dimensions checked by greedy partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Domain {
    Llc,
    Numa,
}

impl Domain {
    fn verdict(self, alignment: &mut Alignment) -> &mut bool {
        match self {
            Domain::Llc => &mut alignment.llc,
            Domain::Numa => &mut alignment.numa,
        }
    }

    fn aligned(self, info: &mut AlignedInfo) -> &mut BTreeMap<usize, ResourceDetails> {
        match self {
            Domain::Llc => &mut info.llc,
            Domain::Numa => &mut info.numa,
        }
    }

    fn unaligned(self, info: &mut UnalignedInfo) -> &mut ResourceDetails {
        match self {
            Domain::Llc => &mut info.llc,
            Domain::Numa => &mut info.numa,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Llc => f.write_str("LLC"),
            Domain::Numa => f.write_str("NUMA"),
        }
    }
}

/// Distributes `cpus` over `domains`, visited in ascending id order, and
/// records the share of every domain which received at least one cpu.
///
/// The container is aligned when every cpu was placed and all of them landed
/// in one single domain. Cpus no domain claimed are reported as unaligned.
pub(super) fn check(
    alloc: &mut Allocation,
    domain: Domain,
    cpus: &CpuSet,
    domains: &BTreeMap<usize, CpuSet>,
) {
    let mut remaining = cpus.clone();
    let mut shares = BTreeMap::new();

    for (&id, members) in domains {
        if remaining.is_empty() {
            break;
        }
        let share = remaining.intersection(members);
        if share.is_empty() {
            continue;
        }
        log::trace!("check {domain} alignment: domain {id} holds cpus [{share}]");
        remaining = remaining.difference(&share);
        shares.insert(
            id,
            ResourceDetails {
                cpus: share.to_vec(),
                ..Default::default()
            },
        );
    }

    let aligned = remaining.is_empty() && shares.len() == 1;
    log::debug!(
        "check {domain} alignment: cpus [{cpus}] spread over {} domain(s), leftover [{remaining}]",
        shares.len()
    );

    *domain.verdict(&mut alloc.alignment) = aligned;
    if !shares.is_empty() {
        domain.aligned(alloc.aligned_mut()).extend(shares);
    }
    if !aligned {
        domain.unaligned(alloc.unaligned_mut()).cpus = remaining.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> BTreeMap<usize, CpuSet> {
        BTreeMap::from([
            (0, CpuSet::from([0, 1])),
            (1, CpuSet::from([2, 3])),
            (2, CpuSet::from([4, 5])),
        ])
    }

    #[test]
    fn single_domain_sets_only_its_own_dimension() {
        let mut alloc = Allocation::default();
        check(&mut alloc, Domain::Numa, &CpuSet::from([2, 3]), &domains());
        assert!(alloc.alignment.numa);
        assert!(!alloc.alignment.llc);
        let aligned = alloc.aligned.unwrap();
        assert!(aligned.llc.is_empty());
        assert_eq!(aligned.numa[&1].cpus, vec![2, 3]);
        assert!(alloc.unaligned.is_none());
    }

    #[test]
    fn skips_domains_without_share() {
        let mut alloc = Allocation::default();
        check(&mut alloc, Domain::Llc, &CpuSet::from([1, 5]), &domains());
        assert!(!alloc.alignment.llc);
        let aligned = alloc.aligned.unwrap();
        assert_eq!(aligned.llc.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert!(alloc.unaligned.unwrap().llc.cpus.is_empty());
    }

    #[test]
    fn no_domains_leaves_everything_over() {
        let mut alloc = Allocation::default();
        check(&mut alloc, Domain::Llc, &CpuSet::from([0, 1]), &BTreeMap::new());
        assert!(!alloc.alignment.llc);
        assert!(alloc.aligned.is_none());
        assert_eq!(alloc.unaligned.unwrap().llc.cpus, vec![0, 1]);
    }
}
