//! Allocation report, revision 0.
//!
//! This revision carries the memory dimension and reports LLC/NUMA as aligned
//! only when the container is confined to a single domain.
//!
//! Empty lists and zero numbers are left out of the JSON output, as are the
//! `aligned` and `unaligned` sections when no check wrote to them. Every field
//! decodes to its default when absent.

use std::collections::BTreeMap;

/// Resources found in one domain, or the mismatching resources of a dimension.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetails {
    /// Logical cpu ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpus: Vec<usize>,
    /// NUMA node ids involved in an unaligned memory allocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numa_nodes: Vec<usize>,
    /// Usable memory in MiB on the relevant NUMA node(s).
    #[serde(rename = "memoryMiB", default, skip_serializing_if = "is_zero")]
    pub memory_mib: u64,
    /// Share of the total machine memory held by the relevant NUMA node(s).
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub memory_percent: f64,
    #[serde(rename = "hugepages2Mi", default, skip_serializing_if = "is_zero")]
    pub hugepages_2mi: u64,
    #[serde(rename = "hugepages1Gi", default, skip_serializing_if = "is_zero")]
    pub hugepages_1gi: u64,
    /// Devices, by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
}

impl ResourceDetails {
    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// Per-domain details of the resources which are aligned.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlignedInfo {
    /// physical core id -> resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub smt: BTreeMap<usize, ResourceDetails>,
    /// llc id -> resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub llc: BTreeMap<usize, ResourceDetails>,
    /// numa node id -> resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub numa: BTreeMap<usize, ResourceDetails>,
    /// numa node id -> resources, for nodes holding both cpus and memory
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub memory: BTreeMap<usize, ResourceDetails>,
}

/// Mismatching resources, one entry per dimension.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnalignedInfo {
    #[serde(default)]
    pub smt: ResourceDetails,
    #[serde(default)]
    pub llc: ResourceDetails,
    #[serde(default)]
    pub numa: ResourceDetails,
    #[serde(default)]
    pub memory: ResourceDetails,
}

/// The verdict of each dimension check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Alignment {
    pub smt: bool,
    pub llc: bool,
    pub numa: bool,
    pub memory: bool,
}

impl Alignment {
    /// Returns `true` if every dimension is aligned.
    pub fn all(&self) -> bool {
        self.smt && self.llc && self.numa && self.memory
    }
}

/// Alignment report of a container's resources.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Allocation {
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aligned: Option<AlignedInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unaligned: Option<UnalignedInfo>,
}

impl Allocation {
    /// Returns the aligned section, creating it on first use.
    pub fn aligned_mut(&mut self) -> &mut AlignedInfo {
        self.aligned.get_or_insert_with(AlignedInfo::default)
    }

    /// Returns the unaligned section, creating it on first use.
    pub fn unaligned_mut(&mut self) -> &mut UnalignedInfo {
        self.unaligned.get_or_insert_with(UnalignedInfo::default)
    }
}
