/// Configuration loading from a JSON config file
use crate::config::types::{MountCheckConfig, MountCheckError, Result};
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the config file
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub tag: Option<String>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    pub enabled_fs_types: Option<Vec<String>>,
    pub disabled_fs_types: Option<Vec<String>>,
    pub emit_healthy: bool,
    pub mount_table: Option<PathBuf>,
}

impl MountCheckConfig {
    /// Load configuration from a JSON file. The result is not yet validated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MountCheckError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| MountCheckError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Apply command-line overrides on top of file (or default) values
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(tag) = &overrides.tag {
            self.tag = tag.clone();
        }
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(enabled) = &overrides.enabled_fs_types {
            self.enabled_fs_types = Some(enabled.clone());
        }
        if let Some(disabled) = &overrides.disabled_fs_types {
            self.disabled_fs_types = Some(disabled.clone());
        }
        if overrides.emit_healthy {
            self.error_only = false;
        }
        if let Some(table) = &overrides.mount_table {
            self.mount_table = table.clone();
        }
        self
    }
}

/// Resolve the effective configuration: file (if any), then overrides, then validation.
///
/// Without a file the tag must come from the overrides.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<MountCheckConfig> {
    let base = match path {
        Some(path) => MountCheckConfig::load_from_file(path)?,
        None => MountCheckConfig::with_tag(String::new()),
    };

    let config = base.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}
