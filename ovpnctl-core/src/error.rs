//! Error types for the ovpnctl supervisor
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the ovpnctl supervisor
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to signalling or terminating daemon processes
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Errors raised by hook scripts
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A signal-relay operation was requested while no lock marker exists
    #[error("not running")]
    NotRunning,

    /// None of the tried daemon locations holds an executable
    #[error("daemon binary not found (searched: {})", display_paths(.searched))]
    BinaryNotFound { searched: Vec<PathBuf> },

    /// One or more units failed an operation that reports per-unit failures
    #[error("{operation} failed for: {}", .units.join(", "))]
    UnitsFailed {
        operation: &'static str,
        units: Vec<String>,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("Cannot read working directory {path}: {reason}")]
    WorkDirUnreadable { path: String, reason: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Daemon process operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Refusing to signal invalid process id {pid}")]
    InvalidPid { pid: i32 },

    #[error("Failed to signal process {pid}: {reason}")]
    SignalFailed { pid: i32, reason: String },

    #[error("Process {pid} did not exit after SIGKILL")]
    Unresponsive { pid: i32 },

    #[error("Failed to launch daemon for {unit}: {reason}")]
    LaunchFailed { unit: String, reason: String },
}

/// Hook script errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Failed to run hook {path}: {reason}")]
    SpawnFailed { path: String, reason: String },

    #[error("Hook {path} exited with {status}")]
    ExitStatus { path: String, status: String },

    #[error("Hook {path} timed out after {seconds} seconds")]
    TimedOut { path: String, seconds: u64 },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SupervisorError>;
