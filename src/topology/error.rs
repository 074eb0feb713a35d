use std::path::PathBuf;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileRead(#[from] fsutil::FileReadError),
    #[error("failed to read topology from standard input: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("failed to decode topology from `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode topology: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("core {core} on NUMA node {node} has no logical processors")]
    EmptyCore { node: usize, core: usize },
    #[error("core {core} on NUMA node {node} lists duplicate logical processors: {cpus:?}")]
    DuplicateCpus {
        node: usize,
        core: usize,
        cpus: Vec<usize>,
    },
    #[error("usable memory of NUMA node {node} overflows the memory total")]
    MemoryOverflow { node: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
