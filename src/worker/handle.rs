use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle of one watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopState {
    Starting,
    Running,
    /// Task disabled; only the enabled flag is polled
    Idle,
    Stopping,
    Stopped,
}

/// State shared between a loop and whoever holds its handle.
///
/// Cancellation is cooperative: the loop checks `is_running` once per cycle.
/// The wake-up only shortens the inter-cycle sleep.
#[derive(Debug)]
pub struct LoopControl {
    running: AtomicBool,
    wake: Notify,
    state: Mutex<LoopState>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            wake: Notify::new(),
            state: Mutex::new(LoopState::Starting),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LoopState {
        *self.state.lock()
    }

    /// Records a cycle-level state. Ignored once a stop was requested.
    pub fn enter(&self, state: LoopState) {
        let mut current = self.state.lock();
        if self.is_running() {
            *current = state;
        }
    }

    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
        {
            let mut state = self.state.lock();
            if *state != LoopState::Stopped {
                *state = LoopState::Stopping;
            }
        }
        // notify_one keeps a permit if the loop is mid-cycle
        self.wake.notify_one();
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::Release);
        *self.state.lock() = LoopState::Stopped;
    }

    /// Sleeps for `duration`, returning early if a stop is requested.
    pub async fn sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wake.notified() => {}
        }
    }
}

impl Default for LoopControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner's side of a spawned watch loop.
#[derive(Debug)]
pub struct LoopHandle {
    control: Arc<LoopControl>,
    join: JoinHandle<()>,
}

impl LoopHandle {
    pub(crate) fn new(control: Arc<LoopControl>, join: JoinHandle<()>) -> Self {
        Self { control, join }
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running() && !self.join.is_finished()
    }

    pub fn state(&self) -> LoopState {
        if self.join.is_finished() {
            LoopState::Stopped
        } else {
            self.control.state()
        }
    }

    /// Signals the loop and waits up to `timeout` for it to exit.
    ///
    /// Best effort: a loop stuck in slow I/O is detached rather than awaited,
    /// and finishes on its own once the I/O returns. Returns whether the loop
    /// exited within the timeout.
    pub async fn stop(mut self, timeout: Duration) -> bool {
        self.control.request_stop();

        match tokio::time::timeout(timeout, &mut self.join).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Watch loop ended abnormally: {}", e);
                true
            }
            Err(_) => {
                debug!("Watch loop did not exit within {:?}, detaching", timeout);
                false
            }
        }
    }
}
