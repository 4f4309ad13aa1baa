//! Probe core.
//!
//! Core owns the per-mount process model (fork, pipe, deadline, kill, reap)
//! and the sequential sweep over the filtered mount set. Record shaping and
//! delivery live in observability.

pub mod prober;
pub mod sweep;
pub mod types;
