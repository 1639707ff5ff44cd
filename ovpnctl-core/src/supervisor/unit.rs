//! Configuration unit discovery
//!
//! A unit is one tunnel definition: one configuration file in the working
//! directory, optionally accompanied by hook scripts sharing its base name.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SupervisorConfig;
use crate::error::{ConfigError, SupervisorError};

/// One tunnel definition found in the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUnit {
    /// Base name of the configuration file, used for PID and hook files
    pub name: String,

    /// Path of the configuration file
    pub config_path: PathBuf,

    /// Script run before the daemon is launched
    pub start_hook: Option<PathBuf>,
}

impl ConfigUnit {
    /// Build a unit from a configuration file, resolving its pre-start hook
    pub fn from_config_file(config_path: PathBuf, config: &SupervisorConfig) -> Option<Self> {
        let name = config_path.file_stem()?.to_str()?.to_string();
        if name.is_empty() {
            return None;
        }

        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(Self {
            start_hook: existing_file(dir.join(hook_file(&name, &config.unit_hook_extension))),
            name,
            config_path,
        })
    }
}

/// Pre-stop hook of a unit, if one exists in the working directory
///
/// Stop works from PID files rather than configuration files, so the hook is
/// resolved by unit name.
pub fn stop_hook_for(name: &str, config: &SupervisorConfig) -> Option<PathBuf> {
    existing_file(config.work_path(&hook_file(name, &config.unit_stop_hook_extension)))
}

fn hook_file(name: &str, extension: &str) -> String {
    format!("{}.{}", name, extension)
}

fn existing_file(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Discover the configuration units in the working directory
///
/// The iterator is lazy and yields units in directory enumeration order,
/// which is arbitrary. An empty directory yields nothing; a missing or
/// unreadable one is a configuration error.
pub fn discover(
    config: &SupervisorConfig,
) -> Result<impl Iterator<Item = ConfigUnit> + '_, SupervisorError> {
    let entries = fs::read_dir(&config.work_dir).map_err(|e| {
        SupervisorError::Config(ConfigError::WorkDirUnreadable {
            path: config.work_dir.display().to_string(),
            reason: e.to_string(),
        })
    })?;

    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(move |path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str())
                    == Some(config.config_extension.as_str())
        })
        .filter_map(move |path| {
            let unit = ConfigUnit::from_config_file(path, config);
            if let Some(ref unit) = unit {
                debug!("Discovered unit {} at {:?}", unit.name, unit.config_path);
            }
            unit
        }))
}
