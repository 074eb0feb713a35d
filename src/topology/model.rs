//! Serializable hardware topology model.
//!
//! The JSON layout is:
//!
//! ```json
//! {
//!   "nodes": [
//!     {
//!       "id": 0,
//!       "cores": [{ "id": 0, "logical_processors": [0, 4] }],
//!       "caches": [{ "level": 3, "logical_processors": [0, 1, 2, 3, 4, 5, 6, 7] }],
//!       "memory": { "total_usable_bytes": 16777216000 }
//!     }
//!   ]
//! }
//! ```
//!
//! Unknown keys are ignored, so richer discovery dumps can be fed in as is.

use std::io::{Read, Write};
use std::path::Path;

use super::{Error, Result};
use crate::fsutil;

/// Path value that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

/// Hardware topology as reported by a discovery tool.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
}

/// One NUMA node.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: usize,
    #[serde(default)]
    pub cores: Vec<Core>,
    #[serde(default)]
    pub caches: Vec<Cache>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<NodeMemory>,
}

/// A physical core and the logical processors (SMT threads) it runs.
///
/// `id` is whatever the discovery tool reports and is not trusted to be
/// unique across the machine.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Core {
    pub id: usize,
    pub logical_processors: Vec<usize>,
}

/// A cache shared by a set of logical processors.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cache {
    pub level: u8,
    pub logical_processors: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeMemory {
    pub total_usable_bytes: u64,
}

impl Topology {
    /// Loads a topology from a JSON file, or from standard input when `path` is `-`.
    ///
    /// # Errors
    ///
    /// - [`Error::FileRead`] if the file cannot be opened.
    /// - [`Error::Stdin`] if standard input cannot be read.
    /// - [`Error::Decode`] if the content is not a valid topology document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(STDIN_PATH) {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).map_err(Error::Stdin)?;
            return Self::from_reader(buf.as_slice(), path);
        }

        let reader = fsutil::open_file_reader(path)?;
        Self::from_reader(reader, path)
    }

    /// Decodes a topology from a JSON reader. `origin` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let topology: Topology =
            serde_json::from_reader(reader).map_err(|source| Error::Decode {
                path: origin.to_path_buf(),
                source,
            })?;
        log::debug!(
            "Loaded topology with {} NUMA node(s) from `{}`",
            topology.nodes.len(),
            origin.display()
        );
        Ok(topology)
    }

    /// Writes the topology as a single line of JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self).map_err(Error::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_NODES: &str = r#"{
        "nodes": [
            {
                "id": 0,
                "cores": [{"id": 0, "logical_processors": [0, 2]}],
                "caches": [
                    {"level": 2, "logical_processors": [0, 2]},
                    {"level": 3, "logical_processors": [0, 2]}
                ],
                "memory": {"total_usable_bytes": 1048576000, "total_physical_bytes": 2097152000}
            },
            {
                "id": 1,
                "cores": [{"id": 0, "logical_processors": [1, 3]}]
            }
        ],
        "architecture": "NUMA"
    }"#;

    #[test]
    fn decodes_nodes_and_ignores_unknown_keys() {
        let topo = Topology::from_reader(TWO_NODES.as_bytes(), Path::new("inline")).unwrap();
        assert_eq!(topo.nodes.len(), 2);
        assert_eq!(topo.nodes[0].cores[0].logical_processors, vec![0, 2]);
        assert_eq!(topo.nodes[0].caches.len(), 2);
        assert_eq!(
            topo.nodes[0].memory,
            Some(NodeMemory {
                total_usable_bytes: 1_048_576_000
            })
        );
        assert!(topo.nodes[1].caches.is_empty());
        assert!(topo.nodes[1].memory.is_none());
    }

    #[test]
    fn decode_error_names_origin() {
        let err = Topology::from_reader("{".as_bytes(), Path::new("/tmp/topo.json")).unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, Path::new("/tmp/topo.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{TWO_NODES}").unwrap();
        let topo = Topology::from_path(tmp.path()).unwrap();
        assert_eq!(topo.nodes[1].id, 1);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Topology::from_path("/definitely/does/not/exist.json").unwrap_err();
        assert!(matches!(err, Error::FileRead(_)));
    }

    #[test]
    fn writes_back_what_it_read() {
        let topo = Topology::from_reader(TWO_NODES.as_bytes(), Path::new("inline")).unwrap();
        let mut out = Vec::new();
        topo.to_writer(&mut out).unwrap();
        let again = Topology::from_reader(out.as_slice(), Path::new("inline")).unwrap();
        assert_eq!(topo, again);
    }
}
