//! Kernel primitives used outside the probe core.
//!
//! - [`signal`]: shutdown signal handling for the sweep daemon

pub mod signal;
