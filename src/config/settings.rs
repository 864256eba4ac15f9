use std::time::Duration;

/// Cadences for watch loops and the supervisor's stop wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Sleep between cycles of an enabled task
    pub poll_interval: Duration,
    /// Sleep between enabled-flag checks of a disabled task
    pub idle_interval: Duration,
    /// Sleep after finding the watch or output folder unavailable
    pub missing_folder_interval: Duration,
    /// Upper bound on waiting for a stopped loop to exit before detaching it
    pub stop_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            idle_interval: Duration::from_millis(500),
            missing_folder_interval: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(1),
        }
    }
}

impl PollSettings {
    /// Same interval for every sleep; handy for fast-cycling loops.
    pub fn uniform(interval: Duration, stop_timeout: Duration) -> Self {
        Self {
            poll_interval: interval,
            idle_interval: interval,
            missing_folder_interval: interval,
            stop_timeout,
        }
    }
}
