//! Runtime configuration.
//!
//! Values come from environment variables, falling back to defaults. The
//! command line may override any of them afterwards.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::cgroup;

pub const SYS_ROOT_ENV: &str = "CTRALIGN_SYS_ROOT";
pub const PROC_ROOT_ENV: &str = "CTRALIGN_PROC_ROOT";
pub const CGROUP_ROOT_ENV: &str = "CTRALIGN_CGROUP_ROOT";
pub const TOPOLOGY_ENV: &str = "CTRALIGN_TOPOLOGY";

const DEFAULT_SYS_ROOT: &str = "/sys";
const DEFAULT_PROC_ROOT: &str = "/proc";
const DEFAULT_TOPOLOGY: &str = "/etc/ctralign/topology.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Mount point of sysfs.
    pub sys_root: PathBuf,
    /// Mount point of procfs.
    pub proc_root: PathBuf,
    /// Cgroup directory holding the container's cpuset files. Detected when unset.
    pub cgroup_root: Option<PathBuf>,
    /// Topology document, `-` for standard input.
    pub topology: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sys_root: PathBuf::from(DEFAULT_SYS_ROOT),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cgroup_root: None,
            topology: PathBuf::from(DEFAULT_TOPOLOGY),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let defaults = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        Self {
            sys_root: path(SYS_ROOT_ENV).unwrap_or(defaults.sys_root),
            proc_root: path(PROC_ROOT_ENV).unwrap_or(defaults.proc_root),
            cgroup_root: path(CGROUP_ROOT_ENV),
            topology: path(TOPOLOGY_ENV).unwrap_or(defaults.topology),
        }
    }

    /// The cgroup directory to read the container's cpuset from.
    pub fn resolve_cgroup_root(&self) -> PathBuf {
        cgroup::resolve_root(
            self.cgroup_root.as_deref(),
            &self.proc_root,
            &self.sys_root,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (SYS_ROOT_ENV, "/host/sys"),
            (CGROUP_ROOT_ENV, "/host/sys/fs/cgroup/kubepods.slice"),
            (TOPOLOGY_ENV, "-"),
        ]));
        assert_eq!(config.sys_root, PathBuf::from("/host/sys"));
        assert_eq!(config.proc_root, PathBuf::from(DEFAULT_PROC_ROOT));
        assert_eq!(
            config.cgroup_root,
            Some(PathBuf::from("/host/sys/fs/cgroup/kubepods.slice"))
        );
        assert_eq!(config.topology, PathBuf::from("-"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[(CGROUP_ROOT_ENV, "")]));
        assert_eq!(config.cgroup_root, None);
    }

    #[test]
    fn explicit_cgroup_root_is_resolved_as_is() {
        let config = Config {
            cgroup_root: Some(PathBuf::from("/tmp/cg")),
            ..Default::default()
        };
        assert_eq!(config.resolve_cgroup_root(), PathBuf::from("/tmp/cg"));
    }
}
