use std::fmt;
use std::path::Path;

use crate::cgroup;
use crate::cpuset::CpuSet;
use crate::error::ResultOkLogExt;

/// The cpus and memory nodes assigned to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerResources {
    /// Logical cpu ids.
    pub cpus: CpuSet,
    /// NUMA node ids the container may allocate memory from.
    pub mems: CpuSet,
}

impl ContainerResources {
    pub fn new(cpus: CpuSet, mems: CpuSet) -> Self {
        Self { cpus, mems }
    }

    /// Reads the effective cpuset of the cgroup at `cgroup_root`.
    ///
    /// A missing or unreadable memory nodes file is not fatal: the memory nodes
    /// are left empty, which skips the memory check. A missing file is logged
    /// at info level, any other failure as a warning.
    ///
    /// # Errors
    ///
    /// Returns a [`cgroup::Error`] if the effective cpus file cannot be read
    /// or parsed.
    pub fn discover(cgroup_root: impl AsRef<Path>) -> cgroup::Result<Self> {
        let cgroup_root = cgroup_root.as_ref();
        let cpus = cgroup::read_cpuset(cgroup::cpuset_path(cgroup_root))?;
        let mems = match cgroup::read_cpuset(cgroup::memset_path(cgroup_root)) {
            Err(cgroup::Error::FileRead(err)) if err.is_not_found() => {
                log::info!("No memory nodes file `{}`", err.path.display());
                CpuSet::new()
            }
            res => res.ok_log(log::Level::Warn).unwrap_or_default(),
        };

        let resources = Self::new(cpus, mems);
        log::debug!(
            "Discovered {resources} in cgroup `{}`",
            cgroup_root.display()
        );
        Ok(resources)
    }
}

impl fmt::Display for ContainerResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpus=[{}] mems=[{}]", self.cpus, self.mems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_cgroup(cpus: Option<&str>, mems: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(cpus) = cpus {
            std::fs::write(cgroup::cpuset_path(dir.path()), cpus).unwrap();
        }
        if let Some(mems) = mems {
            std::fs::write(cgroup::memset_path(dir.path()), mems).unwrap();
        }
        dir
    }

    #[test]
    fn non_existent_path_is_an_error() {
        let err = ContainerResources::discover("/this/path/does/not/exist").unwrap_err();
        assert!(matches!(err, cgroup::Error::FileRead(_)));
    }

    #[test]
    fn simple_happy_path() {
        let dir = fake_cgroup(Some("0-9\n"), Some("0\n"));
        let got = ContainerResources::discover(dir.path()).unwrap();
        assert_eq!(got.cpus, (0..=9).collect::<CpuSet>());
        assert_eq!(got.mems, CpuSet::from([0]));
    }

    #[test]
    fn missing_mems_degrades_gracefully() {
        let dir = fake_cgroup(Some("0-3"), None);
        let got = ContainerResources::discover(dir.path()).unwrap();
        assert_eq!(got.cpus, CpuSet::from([0, 1, 2, 3]));
        assert!(got.mems.is_empty());
    }

    #[test]
    fn malformed_mems_degrades_gracefully() {
        let dir = fake_cgroup(Some("0-3"), Some("0-"));
        let got = ContainerResources::discover(dir.path()).unwrap();
        assert!(got.mems.is_empty());
    }

    #[test]
    fn unreadable_mems_degrades_gracefully() {
        let dir = fake_cgroup(Some("0-3"), None);
        std::fs::create_dir(cgroup::memset_path(dir.path())).unwrap();
        let got = ContainerResources::discover(dir.path()).unwrap();
        assert_eq!(got.cpus, CpuSet::from([0, 1, 2, 3]));
        assert!(got.mems.is_empty());
    }

    #[test]
    fn malformed_cpus_is_an_error() {
        let dir = fake_cgroup(Some("3-1"), Some("0"));
        let err = ContainerResources::discover(dir.path()).unwrap_err();
        assert!(matches!(err, cgroup::Error::CpuSet { .. }));
    }

    #[test]
    fn display_uses_list_format() {
        let res = ContainerResources::new(CpuSet::from([0, 1, 2, 5]), CpuSet::from([0]));
        assert_eq!(res.to_string(), "cpus=[0-2,5] mems=[0]");
    }
}
