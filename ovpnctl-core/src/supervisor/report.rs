//! Per-unit outcome accumulators returned by supervisor operations

/// Outcome of the launch phase of `start`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    /// Units whose launcher exited successfully
    pub launched: Vec<String>,
    /// Units whose hook (strict mode) or launcher failed
    pub failed: Vec<String>,
}

impl LaunchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// At least one tunnel is up, so the lock marker belongs on disk
    pub fn any_launched(&self) -> bool {
        !self.launched.is_empty()
    }
}

/// Outcome of delivering a signal to every tracked instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalReport {
    /// Units whose process received the signal (or was already gone, for stop)
    pub signaled: Vec<String>,
    /// Units where delivery or termination failed
    pub failed: Vec<String>,
}

impl SignalReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
