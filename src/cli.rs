use crate::config::types::{MountCheckConfig, DEFAULT_TIMEOUT_SECS};
use crate::config::{resolve_config, ConfigOverrides};
use crate::core::prober::IsolatedProber;
use crate::core::sweep::SweepController;
use crate::core::types::ProbeOutcome;
use crate::kernel::signal::ShutdownFlag;
use crate::observability::{JsonLinesSink, StatusEmitter, SystemClock};
use crate::runtime::Scheduler;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Tag attached to emitted events
    #[arg(long)]
    tag: Option<String>,
    /// Seconds between sweeps
    #[arg(long)]
    interval: Option<u64>,
    /// Seconds before a probe is killed
    #[arg(long)]
    timeout: Option<u64>,
    /// Only probe these filesystem types (repeatable)
    #[arg(long = "enable-fs-type", value_name = "FSTYPE")]
    enabled_fs_types: Vec<String>,
    /// Never probe these filesystem types (repeatable; replaces the default list)
    #[arg(long = "disable-fs-type", value_name = "FSTYPE")]
    disabled_fs_types: Vec<String>,
    /// Emit records for healthy mounts too
    #[arg(long)]
    emit_healthy: bool,
    /// Mount table to read instead of /proc/mounts
    #[arg(long, value_name = "PATH")]
    mount_table: Option<PathBuf>,
}

impl ConfigArgs {
    fn overrides(&self) -> ConfigOverrides {
        let non_empty = |types: &Vec<String>| (!types.is_empty()).then(|| types.clone());
        ConfigOverrides {
            tag: self.tag.clone(),
            interval: self.interval,
            timeout: self.timeout,
            enabled_fs_types: non_empty(&self.enabled_fs_types),
            disabled_fs_types: non_empty(&self.disabled_fs_types),
            emit_healthy: self.emit_healthy,
            mount_table: self.mount_table.clone(),
        }
    }

    fn resolve(&self) -> Result<MountCheckConfig> {
        resolve_config(self.config.as_deref(), &self.overrides())
            .context("invalid configuration")
    }

    /// Filters only; the tag is not required for listing mounts
    fn resolve_filters(&self) -> Result<MountCheckConfig> {
        let base = match &self.config {
            Some(path) => MountCheckConfig::load_from_file(path)?,
            None => MountCheckConfig::with_tag("mounts"),
        };
        Ok(base.apply_overrides(&self.overrides()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep all mounts on the configured interval until signalled
    Run(ConfigArgs),
    /// Run a single sweep; exits 1 if any mount is unhealthy
    Check(ConfigArgs),
    /// Probe one path and print the outcome
    Probe {
        /// Path to stat
        path: PathBuf,
        /// Seconds before the probe is killed
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// List the mounts a sweep would probe
    Mounts(ConfigArgs),
}

fn build_emitter(config: &MountCheckConfig) -> StatusEmitter {
    StatusEmitter::new(
        config.tag.clone(),
        Box::new(JsonLinesSink::stdout()),
        Box::new(SystemClock),
    )
}

fn run_daemon(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    let shutdown = ShutdownFlag::new();
    shutdown
        .register_signals()
        .context("failed to install signal handlers")?;
    info!(
        "Starting mount sweeps: tag={} interval={}s timeout={}s error_only={}",
        config.tag, config.interval, config.timeout, config.error_only
    );

    let controller = SweepController::from_config(&config, IsolatedProber::new());
    let mut emitter = build_emitter(&config);

    let sweeps = Scheduler::new(config.interval()).run(&shutdown, || {
        // Table-read failures are logged by the controller; the next tick retries.
        let _ = controller.run_sweep(&mut emitter);
    });

    info!("Shutdown requested; exiting after {} sweeps", sweeps);
    Ok(())
}

fn run_check(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    let controller = SweepController::from_config(&config, IsolatedProber::new());
    let mut emitter = build_emitter(&config);

    let summary = controller
        .run_sweep(&mut emitter)
        .context("sweep failed")?;
    eprintln!("{}", serde_json::to_string(&summary)?);

    if !summary.all_healthy() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_probe(path: &Path, timeout: u64) -> Result<()> {
    if timeout == 0 {
        anyhow::bail!("timeout must be a positive number of seconds");
    }

    let report = IsolatedProber::new().probe(path, Duration::from_secs(timeout))?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.outcome != ProbeOutcome::Healthy {
        std::process::exit(1);
    }
    Ok(())
}

fn run_list_mounts(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve_filters()?;
    let controller = SweepController::from_config(&config, IsolatedProber::new());
    for mount in controller.candidate_mounts()? {
        println!(
            "{}\t{}\t{}",
            mount.device,
            mount.mountpoint.display(),
            mount.fstype
        );
    }
    Ok(())
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if !cfg!(unix) {
        eprintln!("Error: mountprobe requires a Unix-like system");
        std::process::exit(1);
    }

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(args) => run_daemon(args),
        Commands::Check(args) => run_check(args),
        Commands::Probe { path, timeout } => run_probe(path, *timeout),
        Commands::Mounts(args) => run_list_mounts(args),
    }
}
