//! Sweep runtime
//!
//! - [`scheduler`]: interval-driven sweep loop with a stop predicate

pub mod scheduler;

pub use scheduler::Scheduler;
