use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening or reading a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileReadError {
    /// Returns `true` if the underlying I/O error says the file does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use ctralign::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/mountinfo")?;
/// # Ok::<(), fsutil::FileReadError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads a small pseudo-file (e.g. a cgroup interface file) into a string
/// with surrounding whitespace removed.
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be read.
pub fn read_trimmed(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_owned())
        .map_err(|source| FileReadError {
            path: path.to_path_buf(),
            source,
        })
}
