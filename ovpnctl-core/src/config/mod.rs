//! Configuration module
//!
//! Describes where tunnels, PID files and the lock marker live, and how the
//! supervisor treats hook and signal failures.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub mod toml_config;

/// Supervisor configuration
///
/// Every field has a default matching a stock OpenVPN install, so an empty
/// TOML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Directory holding one configuration file per tunnel
    pub work_dir: PathBuf,

    /// Directory holding one PID file per running tunnel
    pub pid_dir: PathBuf,

    /// Lock marker path; presence means "instances are running"
    pub lock_file: PathBuf,

    /// Executable name looked up on PATH when no install path holds it
    pub daemon_name: String,

    /// Install locations tried in order for the daemon binary
    pub daemon_paths: Vec<PathBuf>,

    /// Fall back to a PATH lookup of `daemon_name`; off unless configured
    pub search_path: bool,

    /// Extra arguments appended to every daemon launch
    pub extra_args: Vec<String>,

    /// Extension identifying tunnel configuration files
    pub config_extension: String,

    /// Extension of the per-unit pre-start hook (`<name>.<ext>`)
    pub unit_hook_extension: String,

    /// Extension of the per-unit pre-stop hook (`<name>.<ext>`)
    pub unit_stop_hook_extension: String,

    /// Global hook run before any tunnel is launched
    pub startup_hook: String,

    /// Global hook run after every tunnel is stopped
    pub shutdown_hook: String,

    /// Interpreter used to run hook scripts
    pub hook_shell: PathBuf,

    /// Report hook and signal failures instead of swallowing them
    pub strict: bool,

    /// Pause between a forced stop and the following launch
    pub settle_delay_secs: u64,

    /// How long to wait for a process to exit after SIGTERM
    pub stop_timeout_secs: u64,

    /// Kill hooks that run longer than this; unset waits forever
    pub hook_timeout_secs: Option<u64>,
}

impl SupervisorConfig {
    /// Create a configuration rooted at the given directories
    pub fn new(work_dir: PathBuf, pid_dir: PathBuf, lock_file: PathBuf) -> Self {
        Self {
            work_dir,
            pid_dir,
            lock_file,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.work_dir.as_os_str().is_empty() {
            return Err("Working directory cannot be empty".to_string());
        }

        if self.pid_dir.as_os_str().is_empty() {
            return Err("PID directory cannot be empty".to_string());
        }

        if self.lock_file.as_os_str().is_empty() {
            return Err("Lock file cannot be empty".to_string());
        }

        if self.config_extension.is_empty() {
            return Err("Configuration extension cannot be empty".to_string());
        }

        // A unit hook sharing the config extension would be launched as a tunnel
        if self.unit_hook_extension == self.config_extension
            || self.unit_stop_hook_extension == self.config_extension
        {
            return Err("Hook extensions must differ from the configuration extension".to_string());
        }

        if self.daemon_paths.is_empty() && !self.search_path {
            return Err("No daemon paths configured and PATH search disabled".to_string());
        }

        if self.stop_timeout_secs == 0 {
            return Err("Stop timeout cannot be zero".to_string());
        }

        if let Some(0) = self.hook_timeout_secs {
            return Err("Hook timeout cannot be zero".to_string());
        }

        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_secs.map(Duration::from_secs)
    }

    /// Path of a global hook script, relative to the working directory
    pub fn work_path(&self, file: &str) -> PathBuf {
        self.work_dir.join(file)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/etc/openvpn"),
            pid_dir: PathBuf::from("/var/run/openvpn"),
            lock_file: PathBuf::from("/var/lock/subsys/openvpn"),
            daemon_name: "openvpn".to_string(),
            daemon_paths: vec![
                PathBuf::from("/usr/sbin/openvpn"),
                PathBuf::from("/usr/local/sbin/openvpn"),
            ],
            search_path: false,
            extra_args: Vec::new(),
            config_extension: "conf".to_string(),
            unit_hook_extension: "sh".to_string(),
            unit_stop_hook_extension: "down.sh".to_string(),
            startup_hook: "openvpn-startup".to_string(),
            shutdown_hook: "openvpn-shutdown".to_string(),
            hook_shell: PathBuf::from("/bin/sh"),
            strict: false,
            settle_delay_secs: 2,
            stop_timeout_secs: 10,
            hook_timeout_secs: None,
        }
    }
}
