//! TOML configuration file I/O
//!
//! Resolves which configuration file to read and loads it into a
//! [`SupervisorConfig`].

use crate::config::SupervisorConfig;
use crate::error::{ConfigError, SupervisorError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an alternative configuration file
pub const CONFIG_ENV_VAR: &str = "OVPNCTL_CONFIG";

/// Configuration file read when nothing else is specified
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ovpnctl/config.toml";

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed explicitly (flag or environment); must exist
    Explicit(PathBuf),
    /// The default path; silently skipped when absent
    Default(PathBuf),
}

/// Decide which file to read
///
/// An explicit path wins over `OVPNCTL_CONFIG`, which wins over the default.
pub fn resolve_config_source(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the configuration from the resolved source
pub fn load_config(source: &ConfigSource) -> Result<SupervisorConfig, SupervisorError> {
    match source {
        ConfigSource::Explicit(path) => load_config_from_path(path),
        ConfigSource::Default(path) if path.exists() => load_config_from_path(path),
        ConfigSource::Default(path) => {
            debug!("No configuration at {:?}, using built-in defaults", path);
            Ok(SupervisorConfig::default())
        }
    }
}

/// Load the supervisor configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<SupervisorConfig, SupervisorError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SupervisorError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => SupervisorError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: SupervisorConfig = toml::from_str(&contents)?;

    config
        .validate()
        .map_err(|e| SupervisorError::Config(ConfigError::ValidationError { message: e }))?;

    info!(
        "Loaded configuration from {:?}: work_dir={:?}, pid_dir={:?}, strict={}",
        path.as_ref(),
        config.work_dir,
        config.pid_dir,
        config.strict
    );

    Ok(config)
}
