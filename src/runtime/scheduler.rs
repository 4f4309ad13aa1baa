/// Periodic sweep driver
use crate::kernel::signal::ShutdownFlag;
use crossbeam_channel::{tick, RecvTimeoutError};
use log::info;
use std::time::Duration;

/// Intervals longer than this get one sweep at startup instead of waiting a full period
pub const IMMEDIATE_FIRST_SWEEP_AFTER: Duration = Duration::from_secs(60);

/// How often the shutdown flag is checked while waiting for the next tick
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

pub struct Scheduler {
    interval: Duration,
    stop_check: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop_check: STOP_CHECK_INTERVAL.min(interval),
        }
    }

    pub fn runs_immediately(&self) -> bool {
        self.interval > IMMEDIATE_FIRST_SWEEP_AFTER
    }

    /// Call `sweep` on schedule until `shutdown` is requested.
    /// Returns the number of sweeps run.
    pub fn run<F>(&self, shutdown: &ShutdownFlag, mut sweep: F) -> usize
    where
        F: FnMut(),
    {
        let mut sweeps = 0;

        if self.runs_immediately() && !shutdown.is_requested() {
            sweep();
            sweeps += 1;
        }

        let ticker = tick(self.interval);
        loop {
            if shutdown.is_requested() {
                break;
            }

            match ticker.recv_timeout(self.stop_check) {
                Ok(_) => {
                    if shutdown.is_requested() {
                        break;
                    }
                    sweep();
                    sweeps += 1;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Scheduler stopped after {} sweeps", sweeps);
        sweeps
    }
}
