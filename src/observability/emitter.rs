/// Status emitter: shapes probe outcomes into flat records and forwards them
use crate::core::types::ProbeOutcome;
use crate::mounts::table::MountDescriptor;
use crate::observability::clock::Clock;
use crate::observability::sink::EventSink;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Flat record delivered to the event sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountStatusRecord {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub mountpoint_healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mountpoint_error: Option<String>,
}

impl MountStatusRecord {
    pub fn new(mount: &MountDescriptor, outcome: &ProbeOutcome) -> Self {
        Self {
            device: mount.device.clone(),
            mountpoint: mount.mountpoint.to_string_lossy().into_owned(),
            fstype: mount.fstype.clone(),
            mountpoint_healthy: outcome.is_healthy(),
            mountpoint_error: outcome.error_text(),
        }
    }
}

/// What happened to one outcome handed to the emitter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitDecision {
    Emitted,
    Suppressed,
    SinkFailed,
}

/// Tags records and hands them to the sink. Whether healthy outcomes are
/// forwarded is decided per call from the sweep's `ProbeConfig`.
pub struct StatusEmitter {
    tag: String,
    sink: Box<dyn EventSink>,
    clock: Box<dyn Clock>,
}

impl StatusEmitter {
    pub fn new(tag: impl Into<String>, sink: Box<dyn EventSink>, clock: Box<dyn Clock>) -> Self {
        Self {
            tag: tag.into(),
            sink,
            clock,
        }
    }

    /// Forward the record for `mount` unless `error_only` suppresses it.
    /// Sink failures are logged and reported, never raised.
    pub fn emit(
        &mut self,
        mount: &MountDescriptor,
        outcome: &ProbeOutcome,
        error_only: bool,
    ) -> EmitDecision {
        debug!(
            "{} ({}): status - {}",
            mount.mountpoint.display(),
            mount.fstype,
            outcome
        );

        if error_only && outcome.is_healthy() {
            return EmitDecision::Suppressed;
        }

        let record = MountStatusRecord::new(mount, outcome);
        match self.sink.emit(&self.tag, self.clock.now(), &record) {
            Ok(()) => EmitDecision::Emitted,
            Err(e) => {
                error!(
                    "failed to emit status for {}: {}",
                    mount.mountpoint.display(),
                    e
                );
                EmitDecision::SinkFailed
            }
        }
    }
}
