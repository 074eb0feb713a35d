//! Access to the cpuset controller files of the container's cgroup.
//!
//! Inside a container with its own cgroup namespace, the cgroup v2 hierarchy
//! mounted at `/sys/fs/cgroup` is the container's own cgroup. The effective
//! cpuset interface files there hold the cpus and memory nodes the container
//! can actually use:
//!
//! - `cpuset.cpus.effective`
//! - `cpuset.mems.effective`
mod error;
mod mountinfo;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};
pub use mountinfo::{MountInfo, ParseError, detect_cgroup2_mount_points, parse_mount_info_line};

use crate::cpuset::CpuSet;
use crate::error::ResultOkLogExt;
use crate::fsutil;

pub const CPUS_FILE: &str = "cpuset.cpus.effective";
pub const MEMS_FILE: &str = "cpuset.mems.effective";

/// Path of the effective cpus file in `cgroup_root`.
pub fn cpuset_path(cgroup_root: impl AsRef<Path>) -> PathBuf {
    cgroup_root.as_ref().join(CPUS_FILE)
}

/// Path of the effective memory nodes file in `cgroup_root`.
pub fn memset_path(cgroup_root: impl AsRef<Path>) -> PathBuf {
    cgroup_root.as_ref().join(MEMS_FILE)
}

/// Picks the cgroup directory to read from.
///
/// An explicit root wins. Otherwise `<sys_root>/fs/cgroup` is used if it
/// holds the cpuset files, then the first `cgroup2` mount listed in
/// `<proc_root>/self/mountinfo` that holds them. When nothing matches,
/// `<sys_root>/fs/cgroup` is returned as is.
pub fn resolve_root(explicit: Option<&Path>, proc_root: &Path, sys_root: &Path) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }

    let sys_cgroup = sys_root.join("fs/cgroup");
    if has_cpuset(&sys_cgroup) {
        return sys_cgroup;
    }

    let detected = detect_cgroup2_mount_points(proc_root.join("self/mountinfo"))
        .ok_log(log::Level::Warn)
        .unwrap_or_default()
        .into_iter()
        .find(|mount| {
            let usable = has_cpuset(mount);
            if !usable {
                log::debug!("Skipping `cgroup2` mount `{}` without cpuset files", mount.display());
            }
            usable
        });

    detected.unwrap_or_else(|| {
        log::info!("Falling back to cgroup root `{}`", sys_cgroup.display());
        sys_cgroup
    })
}

fn has_cpuset(cgroup_root: &Path) -> bool {
    cpuset_path(cgroup_root).is_file()
}

/// Reads and parses a list-format cpuset file.
///
/// # Errors
///
/// - [`Error::FileRead`] if the file cannot be read.
/// - [`Error::CpuSet`] if its content is not a valid cpu list.
pub fn read_cpuset(path: impl AsRef<Path>) -> Result<CpuSet> {
    let path = path.as_ref();
    let content = fsutil::read_trimmed(path)?;
    content.parse().map_err(|source| Error::CpuSet {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let root = resolve_root(
            Some(Path::new("/custom/cgroup")),
            Path::new("/does/not/exist"),
            Path::new("/sys"),
        );
        assert_eq!(root, PathBuf::from("/custom/cgroup"));
    }

    fn fake_proc(mount_points: &[&Path]) -> tempfile::TempDir {
        let proc_root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(proc_root.path().join("self")).unwrap();
        let mut mountinfo = String::from("25 1 0:24 / /proc rw,relatime - proc proc rw\n");
        for (id, mount_point) in mount_points.iter().enumerate() {
            mountinfo.push_str(&format!(
                "{} 24 0:30 / {} rw,nosuid - cgroup2 cgroup2 rw,nsdelegate\n",
                40 + id,
                mount_point.display()
            ));
        }
        std::fs::write(proc_root.path().join("self/mountinfo"), mountinfo).unwrap();
        proc_root
    }

    fn fake_cgroup(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(cpuset_path(dir), "0-3\n").unwrap();
    }

    #[test]
    fn detected_mount_is_used() {
        let mount = tempfile::tempdir().unwrap();
        fake_cgroup(mount.path());
        let proc_root = fake_proc(&[mount.path()]);
        let root = resolve_root(None, proc_root.path(), Path::new("/does/not/exist/sys"));
        assert_eq!(root, mount.path());
    }

    #[test]
    fn sys_root_with_cpuset_wins_over_detected_mount() {
        let sys_root = tempfile::tempdir().unwrap();
        fake_cgroup(&sys_root.path().join("fs/cgroup"));
        let mount = tempfile::tempdir().unwrap();
        fake_cgroup(mount.path());
        let proc_root = fake_proc(&[mount.path()]);

        let root = resolve_root(None, proc_root.path(), sys_root.path());
        assert_eq!(root, sys_root.path().join("fs/cgroup"));
    }

    #[test]
    fn sys_root_with_cpuset_wins_over_host_mountinfo() {
        let sys_root = tempfile::tempdir().unwrap();
        fake_cgroup(&sys_root.path().join("fs/cgroup"));
        let root = resolve_root(None, Path::new("/proc"), sys_root.path());
        assert_eq!(root, sys_root.path().join("fs/cgroup"));
    }

    #[test]
    fn mounts_without_cpuset_are_skipped() {
        let unified = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();
        fake_cgroup(mount.path());
        let proc_root = fake_proc(&[unified.path(), mount.path()]);

        let root = resolve_root(None, proc_root.path(), Path::new("/does/not/exist/sys"));
        assert_eq!(root, mount.path());
    }

    #[test]
    fn falls_back_to_sys_root() {
        let proc_root = tempfile::tempdir().unwrap();
        let root = resolve_root(None, proc_root.path(), Path::new("/host/sys"));
        assert_eq!(root, PathBuf::from("/host/sys/fs/cgroup"));
    }

    #[test]
    fn falls_back_when_no_mount_has_cpuset() {
        let unified = tempfile::tempdir().unwrap();
        let proc_root = fake_proc(&[unified.path()]);
        let root = resolve_root(None, proc_root.path(), Path::new("/host/sys"));
        assert_eq!(root, PathBuf::from("/host/sys/fs/cgroup"));
    }

    #[test]
    fn reads_cpuset_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(cpuset_path(dir.path()), "0-3,8\n").unwrap();
        let cpus = read_cpuset(cpuset_path(dir.path())).unwrap();
        assert_eq!(cpus.to_vec(), vec![0, 1, 2, 3, 8]);
    }

    #[test]
    fn malformed_cpuset_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = memset_path(dir.path());
        std::fs::write(&path, "zero").unwrap();
        match read_cpuset(&path).unwrap_err() {
            Error::CpuSet { path: err_path, .. } => assert_eq!(err_path, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
