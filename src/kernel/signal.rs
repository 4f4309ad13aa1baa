//! Shutdown requests for the sweep daemon.
//!
//! SIGINT, SIGTERM and SIGHUP set a [`ShutdownFlag`] that the scheduler polls
//! between ticks. The in-flight sweep finishes before the loop exits. A second
//! signal while the flag is already set terminates the process immediately,
//! for a sweep stuck behind a probe timeout the operator does not want to wait
//! out.

use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signals that end the sweep loop
pub const SHUTDOWN_SIGNALS: [libc::c_int; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Exit code used when a second shutdown signal arrives
const FORCED_EXIT_CODE: i32 = 130;

/// Stop flag shared between signal handlers and the sweep loop.
///
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install handlers that set this flag on every shutdown signal.
    pub fn register_signals(&self) -> io::Result<()> {
        for signal in SHUTDOWN_SIGNALS {
            // Order matters: the conditional exit must see the flag before the
            // second handler sets it.
            flag::register_conditional_shutdown(
                signal,
                FORCED_EXIT_CODE,
                Arc::clone(&self.requested),
            )?;
            flag::register(signal, Arc::clone(&self.requested))?;
        }

        info!("Shutdown on SIGINT, SIGTERM or SIGHUP; a second signal exits immediately");
        Ok(())
    }

    /// Ask the sweep loop to stop after the current sweep
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
