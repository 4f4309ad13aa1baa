//! mountprobe: bounded-time liveness checks for mounted filesystems
//!
//! A `stat` on a stale network mount can block forever. mountprobe runs each
//! check in a forked child, waits on a pipe with a hard deadline, and
//! SIGKILLs and reaps the child when the deadline passes, so a sweep over
//! every mount always finishes.
//!
//! # Architecture
//!
//! ## Mount Enumeration ([`mounts`])
//! - [`mounts::table`]: mount table reader (`/proc/mounts` format)
//! - [`mounts::filter`]: fstype allow-list / deny-list
//!
//! ## Probe Core ([`core`])
//! - [`core::prober`]: process-per-probe isolation (fork, pipe, poll, kill, reap)
//! - [`core::sweep`]: sequential sweep controller
//! - [`core::types`]: probe outcomes and lifecycle reports
//!
//! ## Observability ([`observability`])
//! - [`observability::emitter`]: record shaping and `error_only` suppression
//! - [`observability::sink`]: event sinks
//! - [`observability::clock`]: timestamp source
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: configuration surface and error type
//! - [`config::loader`]: JSON loading and CLI overrides
//!
//! ## Runtime ([`runtime`], [`kernel`])
//! - [`runtime::scheduler`]: interval-driven sweep loop
//! - [`kernel::signal`]: async-safe shutdown signals

// Configuration
pub mod config;

// Mount enumeration
pub mod mounts;

// Probe core
pub mod core;

// Records, sinks, clock
pub mod observability;

// Scheduling and signals
pub mod kernel;
pub mod runtime;

// CLI entrypoint wiring for the mountprobe binary.
pub mod cli;

pub use crate::config::types::{FilterSet, MountCheckConfig, MountCheckError, ProbeConfig, Result};
pub use crate::core::prober::{IsolatedProber, MountProber};
pub use crate::core::sweep::{SweepController, SweepSummary};
pub use crate::core::types::{ProbeOutcome, ProbeReport};
pub use crate::mounts::MountDescriptor;
