use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ctralign::config::Config;

/// Entry point of ctralign.
///
/// Reports whether the cpus and memory actually granted to the container this
/// process runs in are aligned with the machine's SMT, LLC and NUMA topology.
///
/// # Examples
///
/// ```bash
/// ctralign --topology /etc/ctralign/topology.json --oneshot align
/// ```
#[derive(Parser)]
#[command(name = "ctralign")]
#[command(version)]
#[command(about = "Inspects the alignment of the resources actually allocated to a container")]
struct Cli {
    /// Log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report and exit immediately instead of running until terminated
    #[arg(short = 's', long, global = true)]
    oneshot: bool,

    /// Topology JSON document, `-` for standard input
    #[arg(long, global = true)]
    topology: Option<PathBuf>,

    /// Mount point of sysfs
    #[arg(long, global = true)]
    sys_root: Option<PathBuf>,

    /// Mount point of procfs
    #[arg(long, global = true)]
    proc_root: Option<PathBuf>,

    /// Cgroup directory holding the cpuset files, detected when omitted
    #[arg(long, global = true)]
    cgroup_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the alignment of the container resources and print the report
    Align,
    /// Print the machine topology the checks work with
    Info,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(topology) = &self.topology {
            config.topology = topology.clone();
        }
        if let Some(sys_root) = &self.sys_root {
            config.sys_root = sys_root.clone();
        }
        if let Some(proc_root) = &self.proc_root {
            config.proc_root = proc_root.clone();
        }
        if let Some(cgroup_root) = &self.cgroup_root {
            config.cgroup_root = Some(cgroup_root.clone());
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let mut builder = match verbose {
        0 => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
        level => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(match level {
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            });
            builder
        }
    };
    builder.init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    log::debug!("Configuration: {config:?}");

    let stdout = std::io::stdout();
    let result = match cli.command {
        Commands::Align => ctralign::run_align(&config, stdout.lock()).map(|_| ()),
        Commands::Info => ctralign::run_info(&config, stdout.lock()),
    };

    let result = match result {
        Ok(()) if !cli.oneshot => ctralign::wait_for_termination().await,
        other => other,
    };

    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}
