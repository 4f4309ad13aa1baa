/// Core configuration and error types for mountprobe
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default sweep interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default per-mount probe timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default mount table location
pub const DEFAULT_MOUNT_TABLE: &str = "/proc/mounts";

/// Pseudo and virtual filesystems skipped unless the configuration says otherwise
pub const DEFAULT_DISABLED_FS_TYPES: &[&str] = &[
    "sysfs",
    "proc",
    "devpts",
    "bpf",
    "devtmpfs",
    "debugfs",
    "tracefs",
    "binfmt_misc",
    "efivarfs",
    "cgroup",
    "cgroup2",
    "securityfs",
    "configfs",
    "fusectl",
    "mqueue",
];

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_error_only() -> bool {
    true
}

fn default_mount_table() -> PathBuf {
    PathBuf::from(DEFAULT_MOUNT_TABLE)
}

fn default_disabled_fs_types() -> Option<Vec<String>> {
    Some(
        DEFAULT_DISABLED_FS_TYPES
            .iter()
            .map(|fstype| fstype.to_string())
            .collect(),
    )
}

/// Full configuration surface, as read from a JSON config file.
///
/// Every field except `tag` has a default. An explicit `null` for
/// `disabled_fs_types` turns the deny list off entirely.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MountCheckConfig {
    /// Tag attached to every emitted event
    pub tag: String,
    /// Seconds between sweeps
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds a single probe may take before its child is killed
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// When present, only these filesystem types are probed
    #[serde(default)]
    pub enabled_fs_types: Option<Vec<String>>,
    /// Filesystem types that are never probed
    #[serde(default = "default_disabled_fs_types")]
    pub disabled_fs_types: Option<Vec<String>>,
    /// Emit only records for mounts that are not healthy
    #[serde(default = "default_error_only")]
    pub error_only: bool,
    /// Mount table to enumerate
    #[serde(default = "default_mount_table")]
    pub mount_table: PathBuf,
}

impl MountCheckConfig {
    /// Configuration with every default applied and the given tag
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            interval: DEFAULT_INTERVAL_SECS,
            timeout: DEFAULT_TIMEOUT_SECS,
            enabled_fs_types: None,
            disabled_fs_types: default_disabled_fs_types(),
            error_only: true,
            mount_table: default_mount_table(),
        }
    }

    /// Reject configurations that must never reach a sweep
    pub fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(MountCheckError::Config("tag should not be empty".to_string()));
        }
        if self.timeout == 0 {
            return Err(MountCheckError::Config(
                "timeout must be a positive number of seconds".to_string(),
            ));
        }
        if self.interval == 0 {
            return Err(MountCheckError::Config(
                "interval must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new(
            self.enabled_fs_types.as_deref(),
            self.disabled_fs_types.as_deref(),
        )
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: Duration::from_secs(self.timeout),
            error_only: self.error_only,
        }
    }
}

/// Allow-list and deny-list over filesystem types.
///
/// A mount is included iff (`enabled` is absent or contains the fstype) and
/// (`disabled` is absent or does not contain it).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub enabled: Option<BTreeSet<String>>,
    pub disabled: Option<BTreeSet<String>>,
}

impl FilterSet {
    pub fn new(enabled: Option<&[String]>, disabled: Option<&[String]>) -> Self {
        Self {
            enabled: enabled.map(|types| types.iter().cloned().collect()),
            disabled: disabled.map(|types| types.iter().cloned().collect()),
        }
    }

    pub fn includes(&self, fstype: &str) -> bool {
        let allowed = self
            .enabled
            .as_ref()
            .map_or(true, |enabled| enabled.contains(fstype));
        let denied = self
            .disabled
            .as_ref()
            .map_or(false, |disabled| disabled.contains(fstype));
        allowed && !denied
    }
}

/// Per-sweep probing parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub error_only: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            error_only: true,
        }
    }
}

/// Custom error types for mountprobe
#[derive(Error, Debug)]
pub enum MountCheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mount table error: {0}")]
    MountTable(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Event sink error: {0}")]
    Sink(String),
}

/// Result type alias for mountprobe operations
pub type Result<T> = std::result::Result<T, MountCheckError>;
