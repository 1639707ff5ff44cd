//! Multi-instance daemon supervision
//!
//! One daemon per configuration unit, tracked through PID files, with a lock
//! marker that survives crashes so the next `start` can clean up after them.
//! Every operation runs sequentially on the calling task.

pub mod daemon;
pub mod hooks;
pub mod lock;
pub mod pidfile;
pub mod process;
pub mod report;
pub mod unit;

pub use daemon::DaemonBinary;
pub use lock::LockMarker;
pub use pidfile::PidFile;
pub use process::{ControlSignal, Instance};
pub use report::{LaunchReport, SignalReport};
pub use unit::{discover, ConfigUnit};

use std::fs;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::error::{Result, SupervisorError};

/// What `instances()` knows about one PID file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    pub name: String,
    pub pid: Option<i32>,
    pub alive: bool,
}

/// Supervisor for every tunnel defined in the working directory
pub struct Supervisor {
    config: SupervisorConfig,
    daemon: DaemonBinary,
    lock: LockMarker,
}

impl Supervisor {
    /// Create a supervisor for an already located daemon binary
    pub fn new(config: SupervisorConfig, daemon: DaemonBinary) -> Self {
        let lock = LockMarker::new(config.lock_file.clone());
        Self {
            config,
            daemon,
            lock,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// The lock marker is present
    pub fn is_running(&self) -> bool {
        self.lock.exists()
    }

    /// Enumerate tracked instances from the PID directory
    pub fn instances(&self) -> Result<Vec<InstanceStatus>> {
        let mut statuses: Vec<InstanceStatus> = pidfile::list_pid_files(&self.config.pid_dir)?
            .into_iter()
            .map(|file| {
                let pid = file.read_pid();
                InstanceStatus {
                    alive: pid.map(process::is_alive).unwrap_or(false),
                    name: file.name,
                    pid,
                }
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(statuses)
    }

    /// Launch one daemon per discovered unit
    ///
    /// A lock marker left behind by an unclean shutdown triggers a forced
    /// cleanup of every tracked instance first. The marker is (re)created
    /// when at least one unit launched, even if others failed.
    pub async fn start(&self) -> Result<LaunchReport> {
        if self.lock.exists() {
            warn!("Lock marker {:?} present, cleaning up after unclean shutdown", self.lock.path());
            let cleanup = self.terminate_all(false).await?;
            self.check_strict("cleanup", &cleanup.failed)?;
            self.lock.remove()?;
            self.settle().await;
        }

        let removed = pidfile::remove_all(&self.config.pid_dir)?;
        if removed > 0 {
            debug!("Removed {} leftover PID file(s)", removed);
        }
        fs::create_dir_all(&self.config.pid_dir)?;

        let startup_hook = self.config.work_path(&self.config.startup_hook);
        if let Err(e) = hooks::run_optional_hook(&startup_hook, &self.config).await {
            if self.config.strict {
                return Err(e.into());
            }
            warn!("Startup hook failed, continuing: {}", e);
        }

        let mut report = LaunchReport::default();
        for unit in discover(&self.config)? {
            if let Some(hook) = &unit.start_hook {
                if let Err(e) = hooks::run_hook(hook, &self.config).await {
                    if self.config.strict {
                        error!("Hook for {} failed, not launching: {}", unit.name, e);
                        report.failed.push(unit.name);
                        continue;
                    }
                    warn!("Hook for {} failed, launching anyway: {}", unit.name, e);
                }
            }

            if let Err(e) = PidFile::named(&self.config.pid_dir, &unit.name).remove() {
                warn!("Could not remove old PID file for {}: {}", unit.name, e);
            }

            match self.daemon.launch(&unit, &self.config).await {
                Ok(()) => report.launched.push(unit.name),
                Err(e) => {
                    error!("{}", e);
                    report.failed.push(unit.name);
                }
            }
        }

        if report.any_launched() {
            self.lock.create()?;
        }

        info!(
            "Start finished: {} launched, {} failed",
            report.launched.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Terminate every tracked instance and forget about it
    ///
    /// PID files and the lock marker are removed whatever the termination
    /// outcome. Outside strict mode this never fails on a per-unit basis.
    pub async fn stop(&self) -> Result<SignalReport> {
        let report = self.terminate_all(true).await?;

        let shutdown_hook = self.config.work_path(&self.config.shutdown_hook);
        let hook_result = hooks::run_optional_hook(&shutdown_hook, &self.config).await;
        if let Err(ref e) = hook_result {
            warn!("Shutdown hook failed: {}", e);
        }

        self.lock.remove()?;

        if self.config.strict {
            self.check_strict("stop", &report.failed)?;
            hook_result?;
        }
        Ok(report)
    }

    /// Stop, settle, start
    pub async fn restart(&self) -> Result<LaunchReport> {
        self.stop().await?;
        self.settle().await;
        self.start().await
    }

    /// Restart only if the lock marker says instances are running
    ///
    /// Returns `None` when nothing was done.
    pub async fn condrestart(&self) -> Result<Option<LaunchReport>> {
        if !self.lock.exists() {
            debug!("Not running, condrestart is a no-op");
            return Ok(None);
        }
        self.restart().await.map(Some)
    }

    /// Ask every instance to re-read its configuration
    pub fn reload(&self) -> Result<SignalReport> {
        self.relay(ControlSignal::Reload)
    }

    /// Ask every instance to reopen its log files
    pub fn reopen(&self) -> Result<SignalReport> {
        self.relay(ControlSignal::Reopen)
    }

    /// Ask every instance to write its status to its own log
    pub fn status(&self) -> Result<SignalReport> {
        self.relay(ControlSignal::Status)
    }

    /// Deliver a control signal to every tracked instance
    pub fn relay(&self, signal: ControlSignal) -> Result<SignalReport> {
        if !self.lock.exists() {
            return Err(SupervisorError::NotRunning);
        }

        let mut report = SignalReport::default();
        for file in pidfile::list_pid_files(&self.config.pid_dir)? {
            let Some(pid) = file.read_pid() else {
                debug!("Skipping {}: empty PID file", file.name);
                continue;
            };

            let delivered = Instance::new(file.name.clone(), pid)
                .and_then(|instance| instance.signal(signal.signal()));
            match delivered {
                Ok(()) => {
                    debug!("Sent {} to {} (pid {})", signal, file.name, pid);
                    report.signaled.push(file.name);
                }
                Err(e) => {
                    warn!("Could not send {} to {}: {}", signal, file.name, e);
                    report.failed.push(file.name);
                }
            }
        }

        self.check_strict(signal.as_str(), &report.failed)?;
        Ok(report)
    }

    async fn terminate_all(&self, run_stop_hooks: bool) -> Result<SignalReport> {
        let mut report = SignalReport::default();

        for file in pidfile::list_pid_files(&self.config.pid_dir)? {
            let mut failed = false;

            let stop_hook = if run_stop_hooks {
                unit::stop_hook_for(&file.name, &self.config)
            } else {
                None
            };
            if let Some(hook) = stop_hook {
                if let Err(e) = hooks::run_hook(&hook, &self.config).await {
                    warn!("Stop hook for {} failed: {}", file.name, e);
                    failed = self.config.strict;
                }
            }

            if let Some(pid) = file.read_pid() {
                let terminated = match Instance::new(file.name.clone(), pid) {
                    Ok(instance) => instance.terminate(self.config.stop_timeout()).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = terminated {
                    warn!("Could not terminate {}: {}", file.name, e);
                    failed = true;
                }
            }

            if let Err(e) = file.remove() {
                warn!("Could not remove PID file for {}: {}", file.name, e);
                failed = true;
            }

            if failed {
                report.failed.push(file.name);
            } else {
                report.signaled.push(file.name);
            }
        }

        Ok(report)
    }

    fn check_strict(&self, operation: &'static str, failed: &[String]) -> Result<()> {
        if self.config.strict && !failed.is_empty() {
            return Err(SupervisorError::UnitsFailed {
                operation,
                units: failed.to_vec(),
            });
        }
        Ok(())
    }

    async fn settle(&self) {
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            debug!("Waiting {:?} for resources to be released", delay);
            sleep(delay).await;
        }
    }
}
