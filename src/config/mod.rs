//! Configuration & Policy
//!
//! - [`types`]: configuration surface, filter/probe parameters, error type
//! - [`loader`]: JSON config loading and command-line overrides

pub mod loader;
pub mod types;

pub use loader::{resolve_config, ConfigOverrides};
