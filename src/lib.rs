//! ctralign: checks whether the resources granted to a container are aligned
//! with the hardware topology of the machine.
//!
//! The topology (NUMA nodes, physical cores, caches and per-node memory) comes
//! from an external discovery tool as JSON. The container's effective cpus and
//! memory nodes are read from its cgroup. The alignment engine in [`align`]
//! produces an [`Allocation`] report covering SMT, LLC, NUMA and memory.

use std::io::Write;

use api::v0::Allocation;
use config::Config;
use error::{Error, Result};
use resources::ContainerResources;
use topology::Topology;

pub mod align;
pub mod api;
pub mod cgroup;
pub mod config;
pub mod cpuset;
pub mod error;
pub mod fsutil;
pub mod resources;
pub mod topology;

/// Checks the alignment of the container this process runs in and writes the
/// report as one line of JSON to `out`.
///
/// # Errors
///
/// Possible errors include:
/// - The topology document cannot be read or is malformed.
/// - The effective cpus of the cgroup cannot be read.
/// - Memory nodes are assigned but the topology carries no memory information.
/// - Writing to `out` fails.
pub fn run_align(config: &Config, mut out: impl Write) -> Result<Allocation> {
    let topology = Topology::from_path(&config.topology)?;
    let cgroup_root = config.resolve_cgroup_root();
    log::debug!("Final cgroup root: {}", cgroup_root.display());
    let container = ContainerResources::discover(&cgroup_root)?;

    let alloc = align::check_topology(&container, &topology)?;
    if alloc.alignment.all() {
        log::info!("{container} is fully aligned");
    } else {
        log::info!("{container} is not fully aligned: {:?}", alloc.alignment);
    }

    serde_json::to_writer(&mut out, &alloc).map_err(Error::Encode)?;
    writeln!(out).map_err(Error::Write)?;
    Ok(alloc)
}

/// Writes the topology the alignment engine works with as one line of JSON.
///
/// # Errors
///
/// Returns an error if the topology cannot be loaded or `out` cannot be written.
pub fn run_info(config: &Config, mut out: impl Write) -> Result<()> {
    let topology = Topology::from_path(&config.topology)?;
    topology.to_writer(&mut out)?;
    writeln!(out).map_err(Error::Write)?;
    Ok(())
}

/// Idles until SIGINT or SIGTERM is received.
///
/// # Errors
///
/// Returns [`Error::Signal`] if the signal handlers cannot be installed.
pub async fn wait_for_termination() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    log::debug!("Waiting for SIGINT or SIGTERM");
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map_err(Error::Signal)?,
        _ = terminate.recv() => {}
    }
    log::info!("Termination signal received, exiting");
    Ok(())
}
