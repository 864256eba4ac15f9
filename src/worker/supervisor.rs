//! Owns the task list and the watch loop of every running task.
//!
//! Operations address tasks by their position in the list. The log index of
//! a loop is `position + 1` at the time the loop is started.
//!
//! Callers are expected to serialise supervisor operations (one UI thread or
//! one command queue). Per-task I/O failures are logged, never returned, so
//! one broken task cannot keep the others from running.

use std::path::Path;
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::{ConfigFile, ConfigStore, JsonConfigStore, PollSettings};
use crate::core::{LogSink, SharedTask, Task, TaskLogger};
use crate::utils::{FetchError, FetchResult, ensure_dir, validate_task};

use super::handle::{LoopHandle, LoopState};
use super::watch_loop::WatchLoop;

struct Slot {
    task: SharedTask,
    handle: Option<LoopHandle>,
}

impl Slot {
    fn new(task: Task) -> Self {
        Self {
            task: task.into_shared(),
            handle: None,
        }
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(LoopHandle::is_running)
    }
}

pub struct Supervisor {
    slots: Mutex<Vec<Slot>>,
    store: Arc<dyn ConfigStore>,
    sink: Arc<dyn LogSink>,
    settings: PollSettings,
    /// Enabled flags captured by `pause_all`, by position. `Some` while paused.
    paused: Mutex<Option<Vec<bool>>>,
}

impl Supervisor {
    pub fn new(
        tasks: Vec<Task>,
        store: Arc<dyn ConfigStore>,
        sink: Arc<dyn LogSink>,
        settings: PollSettings,
    ) -> Self {
        Self {
            slots: Mutex::new(tasks.into_iter().map(Slot::new).collect()),
            store,
            sink,
            settings,
            paused: Mutex::new(None),
        }
    }

    /// Builds a supervisor from the store's task list. Loops are not started.
    pub fn load(
        store: Arc<dyn ConfigStore>,
        sink: Arc<dyn LogSink>,
        settings: PollSettings,
    ) -> FetchResult<Self> {
        let tasks = store.load()?;
        info!("Loaded {} task(s)", tasks.len());
        Ok(Self::new(tasks, store, sink, settings))
    }

    // ── Queries ──────────────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.slots.lock().iter().map(|s| s.task.read().clone()).collect()
    }

    pub fn task(&self, position: usize) -> Option<Task> {
        self.slots.lock().get(position).map(|s| s.task.read().clone())
    }

    pub fn is_running(&self, position: usize) -> bool {
        self.slots.lock().get(position).is_some_and(Slot::is_running)
    }

    /// State of the task's loop; `None` when it never started or was stopped.
    pub fn loop_state(&self, position: usize) -> Option<LoopState> {
        self.slots
            .lock()
            .get(position)
            .and_then(|s| s.handle.as_ref().map(LoopHandle::state))
    }

    pub fn is_paused(&self) -> bool {
        self.paused.lock().is_some()
    }

    // ── Loop lifecycle ───────────────────────────────────────────────────────────────

    /// Starts the task's loop unless it is already running.
    ///
    /// The output folder is created first; if that fails the failure is
    /// logged and this task stays stopped.
    pub async fn start_task(&self, position: usize) -> FetchResult<()> {
        let task = self.shared(position)?;
        let logger = TaskLogger::new(position + 1, self.sink.clone());

        let output = task.read().output_folder.clone();
        if let Err(e) = ensure_dir(&output).await {
            logger.error(format!("Could not create output folder: {e}"));
            return Ok(());
        }

        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(position)
            .filter(|s| Arc::ptr_eq(&s.task, &task))
            .ok_or(FetchError::TaskNotFound(position))?;

        if slot.is_running() {
            debug!("Task {} already running", position + 1);
            return Ok(());
        }

        slot.handle = Some(WatchLoop::new(task, logger, self.settings).spawn());
        Ok(())
    }

    /// Stops the task's loop, waiting at most `stop_timeout` for it to exit.
    pub async fn stop_task(&self, position: usize) -> FetchResult<()> {
        let handle = {
            let mut slots = self.slots.lock();
            let slot = slots
                .get_mut(position)
                .ok_or(FetchError::TaskNotFound(position))?;
            slot.handle.take()
        };

        if let Some(handle) = handle {
            if !handle.stop(self.settings.stop_timeout).await {
                debug!("Task {} loop detached", position + 1);
            }
        }
        Ok(())
    }

    /// Starts every enabled task.
    pub async fn start_enabled(&self) {
        for position in 0..self.len() {
            let enabled = self.task(position).is_some_and(|t| t.enabled);
            if enabled {
                if let Err(e) = self.start_task(position).await {
                    error!("Failed to start task {}: {}", position + 1, e);
                }
            }
        }
    }

    /// Stops every loop.
    pub async fn stop_all(&self) {
        let handles: Vec<_> = self
            .slots
            .lock()
            .iter_mut()
            .filter_map(|s| s.handle.take())
            .collect();

        for handle in handles {
            handle.stop(self.settings.stop_timeout).await;
        }
    }

    // ── Enable / disable ─────────────────────────────────────────────────────────────

    /// Sets the enabled flag, persists, and starts or stops the loop to match.
    pub async fn toggle_task(&self, position: usize, enabled: bool) -> FetchResult<()> {
        let running = {
            let slots = self.slots.lock();
            let slot = slots
                .get(position)
                .ok_or(FetchError::TaskNotFound(position))?;
            slot.task.write().enabled = enabled;
            slot.is_running()
        };
        self.persist();

        let logger = TaskLogger::new(position + 1, self.sink.clone());
        if enabled {
            if running {
                logger.info("Enabled");
            } else {
                self.start_task(position).await?;
            }
        } else {
            if running {
                self.stop_task(position).await?;
            }
            logger.info("Disabled");
        }
        Ok(())
    }

    /// Disables every enabled task, remembering which ones were enabled.
    /// No-op while already paused.
    pub async fn pause_all(&self) {
        if self.is_paused() {
            return;
        }

        let snapshot: Vec<bool> = self.tasks().iter().map(|t| t.enabled).collect();
        for (position, _) in snapshot.iter().enumerate().filter(|(_, enabled)| **enabled) {
            if let Err(e) = self.toggle_task(position, false).await {
                error!("Failed to pause task {}: {}", position + 1, e);
            }
        }

        *self.paused.lock() = Some(snapshot);
        info!("All tasks paused");
    }

    /// Re-enables exactly the tasks that were enabled before `pause_all`.
    /// No-op when not paused.
    pub async fn resume_all(&self) {
        let Some(snapshot) = self.paused.lock().take() else {
            return;
        };

        for (position, _) in snapshot.iter().enumerate().filter(|(_, enabled)| **enabled) {
            if position >= self.len() {
                break;
            }
            if let Err(e) = self.toggle_task(position, true).await {
                error!("Failed to resume task {}: {}", position + 1, e);
            }
        }
        info!("All tasks resumed");
    }

    // ── Task list edits ──────────────────────────────────────────────────────────────

    /// Validates and appends a task, starting it when enabled. Returns its position.
    pub async fn add_task(&self, task: Task) -> FetchResult<usize> {
        validate_task(&task).await?;
        let enabled = task.enabled;

        let position = {
            let mut slots = self.slots.lock();
            slots.push(Slot::new(task));
            slots.len() - 1
        };
        self.persist();
        info!("Task {} added", position + 1);

        if enabled {
            self.start_task(position).await?;
        }
        Ok(position)
    }

    /// Replaces the task at `position`.
    ///
    /// Changes to folders, dimensions or format restart the loop; other
    /// changes are applied in place and the running loop picks them up.
    pub async fn edit_task(&self, position: usize, task: Task) -> FetchResult<()> {
        validate_task(&task).await?;
        let current = self
            .task(position)
            .ok_or(FetchError::TaskNotFound(position))?;

        if current.needs_restart(&task) {
            self.stop_task(position).await?;
            self.replace(position, task.clone())?;
            self.persist();
            if task.enabled {
                self.start_task(position).await?;
            }
        } else {
            self.replace(position, task.clone())?;
            self.persist();
            let running = self.is_running(position);
            if task.enabled && !running {
                self.start_task(position).await?;
            } else if !task.enabled && running {
                self.stop_task(position).await?;
            }
        }
        info!("Task {} updated", position + 1);
        Ok(())
    }

    /// Removes the task at `position`, stopping its loop. Returns the removed task.
    pub async fn delete_task(&self, position: usize) -> FetchResult<Task> {
        let slot = {
            let mut slots = self.slots.lock();
            if position >= slots.len() {
                return Err(FetchError::TaskNotFound(position));
            }
            slots.remove(position)
        };
        if let Some(snapshot) = self.paused.lock().as_mut() {
            if position < snapshot.len() {
                snapshot.remove(position);
            }
        }

        if let Some(handle) = slot.handle {
            handle.stop(self.settings.stop_timeout).await;
        }
        self.persist();

        let task = slot.task.read().clone();
        info!("Task '{}' deleted", task.name);
        Ok(task)
    }

    // ── Import / export ──────────────────────────────────────────────────────────────

    /// Writes the current task list to `path`.
    pub fn export_config(&self, path: impl AsRef<Path>) -> FetchResult<()> {
        JsonConfigStore::new(path.as_ref()).save(&self.tasks())
    }

    /// Replaces the task list with the one in `path`: stops every loop,
    /// persists the new list and starts its enabled tasks.
    pub async fn import_config(&self, path: impl AsRef<Path>) -> FetchResult<usize> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FetchError::config(format!("Cannot read {}: {e}", path.as_ref().display())))?;
        let tasks = ConfigFile::from_json(&json)?.tasks;
        let count = tasks.len();

        self.stop_all().await;
        *self.slots.lock() = tasks.into_iter().map(Slot::new).collect();
        *self.paused.lock() = None;
        self.persist();
        self.start_enabled().await;

        info!("Imported {} task(s) from {}", count, path.as_ref().display());
        Ok(count)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────────────

    fn shared(&self, position: usize) -> FetchResult<SharedTask> {
        self.slots
            .lock()
            .get(position)
            .map(|s| s.task.clone())
            .ok_or(FetchError::TaskNotFound(position))
    }

    /// Writes new field values into the existing shared task, so a running
    /// loop sees them on its next cycle.
    fn replace(&self, position: usize, task: Task) -> FetchResult<()> {
        let shared = self.shared(position)?;
        *shared.write() = task;
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.tasks()) {
            error!("Failed to save task list: {}", e);
        }
    }
}
