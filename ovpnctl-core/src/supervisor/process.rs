//! Daemon process signalling and termination
//!
//! The supervisor never owns a child handle for a running tunnel: the daemon
//! detaches itself and is addressed through the pid recorded in its PID file.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::ProcessError;

/// Interval between liveness checks while waiting for an exit
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra wait granted after SIGKILL
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Control requests relayed to running daemons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Re-read configuration (SIGHUP)
    Reload,
    /// Reopen log files (SIGUSR1)
    Reopen,
    /// Dump status to the daemon's log (SIGUSR2)
    Status,
}

impl ControlSignal {
    pub fn signal(self) -> Signal {
        match self {
            ControlSignal::Reload => Signal::SIGHUP,
            ControlSignal::Reopen => Signal::SIGUSR1,
            ControlSignal::Status => Signal::SIGUSR2,
        }
    }

    /// Operation name used in messages
    pub fn as_str(self) -> &'static str {
        match self {
            ControlSignal::Reload => "reload",
            ControlSignal::Reopen => "reopen",
            ControlSignal::Status => "status",
        }
    }
}

impl std::fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A running daemon instance, addressed by pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub pid: i32,
}

impl Instance {
    /// Create an instance handle; pids that would address a process group,
    /// every process, or init are refused
    pub fn new(name: impl Into<String>, pid: i32) -> Result<Self, ProcessError> {
        if pid <= 1 {
            return Err(ProcessError::InvalidPid { pid });
        }
        Ok(Self {
            name: name.into(),
            pid,
        })
    }

    fn raw(&self) -> Pid {
        Pid::from_raw(self.pid)
    }

    /// Check whether the process still exists; zombies count as exited
    pub fn is_alive(&self) -> bool {
        is_alive(self.pid)
    }

    /// Deliver a signal
    pub fn signal(&self, signal: Signal) -> Result<(), ProcessError> {
        kill(self.raw(), signal).map_err(|e| ProcessError::SignalFailed {
            pid: self.pid,
            reason: e.to_string(),
        })
    }

    /// Terminate gracefully, escalating to SIGKILL after `timeout`
    ///
    /// A process that is already gone counts as terminated.
    pub async fn terminate(&self, timeout: Duration) -> Result<(), ProcessError> {
        match kill(self.raw(), Signal::SIGTERM) {
            Ok(()) => debug!("Sent SIGTERM to {} (pid {})", self.name, self.pid),
            Err(Errno::ESRCH) => {
                debug!("Process {} for {} already terminated", self.pid, self.name);
                return Ok(());
            }
            Err(e) => {
                return Err(ProcessError::SignalFailed {
                    pid: self.pid,
                    reason: e.to_string(),
                })
            }
        }

        if self.wait_for_exit(timeout).await {
            info!("Process {} for {} terminated gracefully", self.pid, self.name);
            return Ok(());
        }

        warn!(
            "Process {} for {} did not respond to SIGTERM, sending SIGKILL",
            self.pid, self.name
        );
        match kill(self.raw(), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => {
                return Err(ProcessError::SignalFailed {
                    pid: self.pid,
                    reason: e.to_string(),
                })
            }
        }

        if self.wait_for_exit(KILL_GRACE).await {
            Ok(())
        } else {
            Err(ProcessError::Unresponsive { pid: self.pid })
        }
    }

    /// Poll until the process is gone or `timeout` elapses
    ///
    /// A timeout too large to represent as an instant waits without a deadline.
    pub async fn wait_for_exit(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if !self.is_alive() {
                return true;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// Check whether a process exists and is not a zombie
pub fn is_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    match kill(Pid::from_raw(pid), None) {
        // EPERM: exists but belongs to someone else
        Ok(()) | Err(Errno::EPERM) => !is_zombie(pid),
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: i32) -> bool {
    // /proc/<pid>/stat: "pid (comm) S ..."; comm may contain spaces or parens
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| {
            let rest = &stat[stat.rfind(')')? + 1..];
            rest.split_whitespace().next().map(|state| state == "Z")
        })
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: i32) -> bool {
    false
}
