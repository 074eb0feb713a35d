//! Locating the cgroup v2 hierarchy through `/proc/[pid]/mountinfo`.
//!
//! See [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for the line format. Only the fields needed to find the `cgroup2` mount are
//! extracted.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use super::{Error, Result};
use crate::fsutil;

/// The parts of a mountinfo line this crate cares about.
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    /// Root of the mount within the filesystem.
    pub root: &'a str,
    /// Mount point relative to the process's root.
    pub mount_point: &'a str,
    /// Filesystem type (e.g., `ext4`, `cgroup2`).
    pub fs_type: &'a str,
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("missing mount point in line: `{0}`")]
    MissingMountPoint(String),

    #[error("missing filesystem type in line: `{0}`")]
    MissingFsType(String),
}

/// Parses a single line of mountinfo data.
///
/// # Errors
///
/// Returns a [`ParseError`] if the separator, the mount point or the
/// filesystem type cannot be found.
pub fn parse_mount_info_line(line: &str) -> std::result::Result<MountInfo<'_>, ParseError> {
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.to_owned()))?;

    // mount id, parent id, major:minor, root, mount point, optional fields...
    let mut pre_fields = pre.split_whitespace().skip(3);
    let (Some(root), Some(mount_point)) = (pre_fields.next(), pre_fields.next()) else {
        return Err(ParseError::MissingMountPoint(line.to_owned()));
    };

    let fs_type = post
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::MissingFsType(line.to_owned()))?;

    Ok(MountInfo {
        root,
        mount_point,
        fs_type,
    })
}

/// Returns the mount points of all `cgroup2` entries of the given mountinfo
/// file, in file order.
///
/// # Errors
///
/// - [`Error::FileRead`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if parsing any line fails.
/// - [`Error::MissingCgroup2Mount`] if no `cgroup2` mount is found.
pub fn detect_cgroup2_mount_points(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;
    detect_cgroup2_mount_points_from_reader(reader, path)
}

fn detect_cgroup2_mount_points_from_reader<R: BufRead>(
    reader: R,
    origin: &Path,
) -> Result<Vec<PathBuf>> {
    let mut mounts = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?;
        let mount = parse_mount_info_line(&line).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if mount.fs_type == "cgroup2" {
            log::debug!(
                "Found `cgroup2` mount point with root `{}`: {}",
                mount.root,
                mount.mount_point
            );
            mounts.push(PathBuf::from(mount.mount_point));
        }
    }

    if mounts.is_empty() {
        return Err(Error::MissingCgroup2Mount {
            path: origin.to_path_buf(),
        });
    }
    Ok(mounts)
}
