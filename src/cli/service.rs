//! Lifecycle and control commands
//!
//! Thin wrappers that run a supervisor operation and print its per-unit
//! outcome.

use ovpnctl_core::error::SupervisorError;
use ovpnctl_core::supervisor::{LaunchReport, SignalReport, Supervisor};

use crate::cli::output;

/// Run the start command
pub async fn run_start(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    output::heading("Starting OpenVPN tunnels...");
    let report = supervisor.start().await?;
    print_launch(supervisor, report)
}

/// Run the stop command
///
/// Termination failures are shown but only fail the command in strict mode.
pub async fn run_stop(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    output::heading("Stopping OpenVPN tunnels...");
    let report = supervisor.stop().await?;
    print_signaled(&report);
    Ok(())
}

/// Run the restart command
pub async fn run_restart(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    output::heading("Restarting OpenVPN tunnels...");
    let report = supervisor.restart().await?;
    print_launch(supervisor, report)
}

/// Run the condrestart command; silent when nothing is running
pub async fn run_condrestart(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    match supervisor.condrestart().await? {
        Some(report) => {
            output::heading("Restarting OpenVPN tunnels...");
            print_launch(supervisor, report)
        }
        None => Ok(()),
    }
}

/// Run the reload command
pub fn run_reload(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    let report = supervisor.reload()?;
    output::heading("Reloading OpenVPN tunnels...");
    print_signaled(&report);
    Ok(())
}

/// Run the reopen command
pub fn run_reopen(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    let report = supervisor.reopen()?;
    output::heading("Reopening OpenVPN log files...");
    print_signaled(&report);
    Ok(())
}

/// Run the status command
///
/// The daemons write their status to their own logs; here we only list what
/// the PID directory tracks.
pub fn run_status(supervisor: &Supervisor) -> Result<(), SupervisorError> {
    let report = supervisor.status()?;
    output::heading("OpenVPN tunnels:");
    for status in supervisor.instances()? {
        output::instance(&status);
    }
    for name in &report.failed {
        output::unit_failed(name);
    }
    output::note("Status written to each daemon's log");
    Ok(())
}

fn print_launch(supervisor: &Supervisor, report: LaunchReport) -> Result<(), SupervisorError> {
    if report.launched.is_empty() && report.failed.is_empty() {
        output::note(&format!(
            "No tunnel configurations found in {}",
            supervisor.config().work_dir.display()
        ));
    }
    for name in &report.launched {
        output::unit_ok(name);
    }
    for name in &report.failed {
        output::unit_failed(name);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(SupervisorError::UnitsFailed {
            operation: "start",
            units: report.failed,
        })
    }
}

fn print_signaled(report: &SignalReport) {
    for name in &report.signaled {
        output::unit_ok(name);
    }
    for name in &report.failed {
        output::unit_warn(name);
    }
}
