//! Console progress messages
//!
//! Init-script style lines on stdout; diagnostics go through tracing.

use colored::Colorize;
use ovpnctl_core::error::SupervisorError;
use ovpnctl_core::supervisor::InstanceStatus;

pub fn heading(message: &str) {
    println!("{}", message.bold());
}

pub fn unit_ok(name: &str) {
    println!("  {:<24} [{}]", name, "  OK  ".green());
}

pub fn unit_failed(name: &str) {
    println!("  {:<24} [{}]", name, " FAIL ".red());
}

pub fn unit_warn(name: &str) {
    println!("  {:<24} [{}]", name, " WARN ".yellow());
}

pub fn note(message: &str) {
    println!("  {}", message.dimmed());
}

pub fn instance(status: &InstanceStatus) {
    let pid = status
        .pid
        .map(|pid| pid.to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = if status.alive {
        "running".green()
    } else {
        "not running".red()
    };
    println!("  {:<24} pid {:<8} {}", status.name, pid, state);
}

pub fn not_found(daemon_name: &str) {
    println!("{}", format!("{} binary not found", daemon_name).yellow());
}

pub fn error(e: &SupervisorError) {
    eprintln!("{} {}", "ovpnctl:".red().bold(), e);
}
