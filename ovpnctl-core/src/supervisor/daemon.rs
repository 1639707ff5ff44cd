//! Daemon binary location and launch
//!
//! The daemon is an opaque executable. It is asked to detach, write its own
//! pid file and use the working directory; the supervisor only observes the
//! exit status of the launching process.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SupervisorConfig;
use crate::error::{ProcessError, SupervisorError};
use crate::supervisor::pidfile::PidFile;
use crate::supervisor::unit::ConfigUnit;

/// A located daemon executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonBinary {
    path: PathBuf,
}

impl DaemonBinary {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Try the configured install paths in order, then PATH if enabled
    pub fn locate(config: &SupervisorConfig) -> Result<Self, SupervisorError> {
        if let Some(path) = config.daemon_paths.iter().find(|p| is_executable(p)) {
            debug!("Using daemon binary {:?}", path);
            return Ok(Self::new(path.clone()));
        }

        let mut searched = config.daemon_paths.clone();
        if config.search_path {
            match which::which(&config.daemon_name) {
                Ok(path) => {
                    debug!("Using daemon binary {:?} from PATH", path);
                    return Ok(Self::new(path));
                }
                Err(_) => searched.push(PathBuf::from(format!("$PATH/{}", config.daemon_name))),
            }
        }

        Err(SupervisorError::BinaryNotFound { searched })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arguments passed to the daemon for one unit
    pub fn launch_args(&self, unit: &ConfigUnit, config: &SupervisorConfig) -> Vec<String> {
        let mut args = vec![
            "--daemon".to_string(),
            "--writepid".to_string(),
            PidFile::named(&config.pid_dir, &unit.name)
                .path()
                .display()
                .to_string(),
            "--config".to_string(),
            unit.config_path.display().to_string(),
            "--cd".to_string(),
            config.work_dir.display().to_string(),
        ];
        args.extend(config.extra_args.iter().cloned());
        args
    }

    /// Launch the daemon for one unit and wait for the launcher to return
    ///
    /// Success means the daemon detached; its later health is not observed.
    pub async fn launch(
        &self,
        unit: &ConfigUnit,
        config: &SupervisorConfig,
    ) -> Result<(), ProcessError> {
        let args = self.launch_args(unit, config);
        debug!("Launching {:?} {:?}", self.path, args);

        let status = Command::new(&self.path)
            .args(&args)
            .current_dir(&config.work_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| ProcessError::LaunchFailed {
                unit: unit.name.clone(),
                reason: e.to_string(),
            })?;

        if status.success() {
            info!("Launched daemon for {}", unit.name);
            Ok(())
        } else {
            Err(ProcessError::LaunchFailed {
                unit: unit.name.clone(),
                reason: format!("launcher {}", status),
            })
        }
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
