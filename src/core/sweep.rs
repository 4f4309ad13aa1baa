use crate::config::types::{FilterSet, MountCheckConfig, ProbeConfig, Result};
use crate::core::prober::MountProber;
use crate::core::types::ProbeOutcome;
use crate::mounts::{filter_mounts, read_mount_table, MountDescriptor};
use crate::observability::emitter::{EmitDecision, StatusEmitter};
use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Counters for one completed sweep
#[derive(Clone, Debug, Default, Serialize)]
pub struct SweepSummary {
    pub sweep_id: String,
    pub probed: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub timed_out: usize,
    pub emitted: usize,
    pub suppressed: usize,
    pub elapsed: Duration,
}

impl SweepSummary {
    fn new() -> Self {
        Self {
            sweep_id: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.unhealthy == 0 && self.timed_out == 0
    }

    fn count(&mut self, outcome: &ProbeOutcome) {
        self.probed += 1;
        match outcome {
            ProbeOutcome::Healthy => self.healthy += 1,
            ProbeOutcome::Unhealthy { .. } => self.unhealthy += 1,
            ProbeOutcome::TimedOut => self.timed_out += 1,
        }
    }
}

/// Sequential sweep over the filtered mount set.
pub struct SweepController<P: MountProber> {
    mount_table: PathBuf,
    filter: FilterSet,
    probe: ProbeConfig,
    prober: P,
}

impl<P: MountProber> SweepController<P> {
    pub fn new(mount_table: PathBuf, filter: FilterSet, probe: ProbeConfig, prober: P) -> Self {
        Self {
            mount_table,
            filter,
            probe,
            prober,
        }
    }

    pub fn from_config(config: &MountCheckConfig, prober: P) -> Self {
        Self::new(
            config.mount_table.clone(),
            config.filter_set(),
            config.probe_config(),
            prober,
        )
    }

    /// Mounts that a sweep would probe right now
    pub fn candidate_mounts(&self) -> Result<Vec<MountDescriptor>> {
        let mounts = read_mount_table(&self.mount_table)?;
        Ok(filter_mounts(mounts, &self.filter))
    }

    /// Run one sweep. Fails only when the mount table cannot be read.
    pub fn run_sweep(&self, emitter: &mut StatusEmitter) -> Result<SweepSummary> {
        let mut summary = SweepSummary::new();
        let started = Instant::now();

        let mounts = self.candidate_mounts().map_err(|e| {
            error!("sweep {}: {}", summary.sweep_id, e);
            e
        })?;

        for mount in &mounts {
            let outcome = self.probe_one(&summary.sweep_id, mount);
            summary.count(&outcome);

            match emitter.emit(mount, &outcome, self.probe.error_only) {
                EmitDecision::Emitted => summary.emitted += 1,
                EmitDecision::Suppressed => summary.suppressed += 1,
                EmitDecision::SinkFailed => {}
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            "sweep {}: probed={} healthy={} unhealthy={} timed_out={} emitted={} in {:?}",
            summary.sweep_id,
            summary.probed,
            summary.healthy,
            summary.unhealthy,
            summary.timed_out,
            summary.emitted,
            summary.elapsed
        );
        Ok(summary)
    }

    fn probe_one(&self, sweep_id: &str, mount: &MountDescriptor) -> ProbeOutcome {
        match self.prober.probe_mount(mount, self.probe.timeout) {
            Ok(outcome) => {
                match &outcome {
                    ProbeOutcome::Healthy => {}
                    ProbeOutcome::Unhealthy { detail } => {
                        warn!(
                            "sweep {}: {} unhealthy: {}",
                            sweep_id,
                            mount.mountpoint.display(),
                            detail
                        )
                    }
                    ProbeOutcome::TimedOut => warn!(
                        "sweep {}: {} did not answer within {:?}",
                        sweep_id,
                        mount.mountpoint.display(),
                        self.probe.timeout
                    ),
                }
                outcome
            }
            Err(e) => {
                error!(
                    "sweep {}: probe of {} failed: {}",
                    sweep_id,
                    mount.mountpoint.display(),
                    e
                );
                ProbeOutcome::Unhealthy {
                    detail: format!("probe failed: {e}"),
                }
            }
        }
    }
}
