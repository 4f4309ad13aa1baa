//! Observability
//!
//! - [`emitter`]: record shaping and `error_only` suppression
//! - [`sink`]: event sinks (JSON lines, in-memory)
//! - [`clock`]: timestamp source for emitted events

pub mod clock;
pub mod emitter;
pub mod sink;

pub use clock::{Clock, FixedClock, SystemClock};
pub use emitter::{EmitDecision, MountStatusRecord, StatusEmitter};
pub use sink::{CollectedEvent, CollectingSink, EventSink, JsonLinesSink};
