use crate::{align, cgroup, topology};

/// Top level error of the command line operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] topology::Error),
    #[error(transparent)]
    Cgroup(#[from] cgroup::Error),
    #[error(transparent)]
    Align(#[from] align::Error),
    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write report: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to wait for termination signal: {0}")]
    Signal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    /// Converts into an [`Option`], logging the error at `level` if there was one.
    fn ok_log(self, level: log::Level) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, level: log::Level) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{err}");
                None
            }
        }
    }
}
