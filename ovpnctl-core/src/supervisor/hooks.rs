//! Hook script execution
//!
//! Hooks run synchronously through the configured shell with the working
//! directory as cwd. Without a configured timeout a hanging hook blocks the
//! supervisor indefinitely.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::SupervisorConfig;
use crate::error::HookError;

/// Run a hook script to completion
pub async fn run_hook(script: &Path, config: &SupervisorConfig) -> Result<(), HookError> {
    let shown = script.display().to_string();
    debug!("Running hook {}", shown);

    let mut child = Command::new(&config.hook_shell)
        .arg(script)
        .current_dir(&config.work_dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| HookError::SpawnFailed {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

    let waited = match config.hook_timeout() {
        Some(limit) => {
            let result = tokio::time::timeout(limit, child.wait()).await;
            match result {
                Ok(waited) => waited,
                Err(_) => {
                    warn!("Hook {} exceeded {:?}, killing it", shown, limit);
                    let _ = child.kill().await;
                    return Err(HookError::TimedOut {
                        path: shown,
                        seconds: limit.as_secs(),
                    });
                }
            }
        }
        None => child.wait().await,
    };

    let status = waited.map_err(|e| HookError::SpawnFailed {
        path: shown.clone(),
        reason: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(HookError::ExitStatus {
            path: shown,
            status: status.to_string(),
        })
    }
}

/// Run a hook if the file exists
///
/// Returns `Ok(false)` when there is nothing to run.
pub async fn run_optional_hook(
    script: &Path,
    config: &SupervisorConfig,
) -> Result<bool, HookError> {
    if !script.is_file() {
        return Ok(false);
    }
    run_hook(script, config).await.map(|()| true)
}
