use std::path::PathBuf;

use crate::{cpuset, fsutil};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileRead(#[from] fsutil::FileReadError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to detect cgroup v2 mount point in file `{path}`")]
    MissingCgroup2Mount { path: PathBuf },
    #[error("failed to parse line in file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: super::mountinfo::ParseError,
    },
    #[error("failed to parse cpuset file `{path}`: {source}")]
    CpuSet {
        path: PathBuf,
        #[source]
        source: cpuset::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
