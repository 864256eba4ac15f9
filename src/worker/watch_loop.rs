//! Per-task polling loop.
//!
//! Every cycle the loop re-reads its task, checks that both folders are
//! available, and converts each supported image in the watch folder that it
//! has not already handled. Nothing short of a supervisor stop ends the loop:
//! missing folders, bad images and I/O errors are logged and retried.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::PollSettings;
use crate::core::{SharedTask, Task, TaskLogger};
use crate::processing::{Conversion, convert, random_name};
use crate::utils::{dir_exists, ensure_dir, is_supported_image};

use super::error::{WatchError, WatchResult};
use super::handle::{LoopControl, LoopHandle, LoopState};
use super::warnings::{Warning, WarningState};

/// Deletes a source once its output is verified.
pub(crate) type RemoveSource = fn(&Path) -> io::Result<()>;

/// A watch loop bound to one task.
pub struct WatchLoop {
    task: SharedTask,
    control: Arc<LoopControl>,
    logger: TaskLogger,
    settings: PollSettings,
    /// File names converted during this loop's lifetime
    processed: HashSet<String>,
    warnings: WarningState,
    remove_source: RemoveSource,
}

impl WatchLoop {
    pub fn new(task: SharedTask, logger: TaskLogger, settings: PollSettings) -> Self {
        Self {
            task,
            control: Arc::new(LoopControl::new()),
            logger,
            settings,
            processed: HashSet::new(),
            warnings: WarningState::default(),
            remove_source: |path| std::fs::remove_file(path),
        }
    }

    /// Spawns the loop on the runtime and returns its handle.
    pub fn spawn(self) -> LoopHandle {
        let control = self.control.clone();
        let join = tokio::spawn(self.run());
        LoopHandle::new(control, join)
    }

    async fn run(mut self) {
        let enabled = self.task.read().enabled;
        self.logger.info(format!("Watcher started (enabled={enabled})"));

        while self.control.is_running() {
            let pause = self.run_cycle().await;
            self.control.sleep(pause).await;
        }

        self.control.mark_stopped();
        self.logger.info("Stopped watching");
    }

    /// Runs one cycle and returns how long to sleep before the next.
    pub(crate) async fn run_cycle(&mut self) -> Duration {
        // Per-cycle snapshot: edits made meanwhile apply next cycle.
        let task = self.task.read().clone();

        if !task.enabled {
            self.control.enter(LoopState::Idle);
            return self.settings.idle_interval;
        }
        self.control.enter(LoopState::Running);

        match self.scan(&task).await {
            Ok(pause) => pause,
            Err(e) => {
                self.logger.error(format!("Unexpected error: {e}"));
                self.settings.poll_interval
            }
        }
    }

    async fn scan(&mut self, task: &Task) -> WatchResult<Duration> {
        if self.check_folders(task).await.is_err() {
            return Ok(self.settings.missing_folder_interval);
        }

        for (name, path) in self.pending_files(task).await? {
            self.process_file(task, &name, path).await;
        }

        Ok(self.settings.poll_interval)
    }

    /// Checks both folders, creating the output folder if needed. Logs each
    /// problem once per onset.
    async fn check_folders(&mut self, task: &Task) -> WatchResult<()> {
        if !dir_exists(&task.watch_folder).await {
            let err = WatchError::FolderMissing(task.watch_folder.clone());
            self.report(Warning::WatchFolderMissing, &err);
            return Err(err);
        }
        self.warnings.clear(Warning::WatchFolderMissing);

        if let Err(e) = ensure_dir(&task.output_folder).await {
            let err = WatchError::FolderUnwritable {
                path: task.output_folder.clone(),
                reason: e.to_string(),
            };
            self.report(Warning::OutputFolderMissing, &err);
            return Err(err);
        }
        self.warnings.clear(Warning::OutputFolderMissing);

        Ok(())
    }

    /// Logs `err` on the onset of `warning`; repeats only reach debug output.
    fn report(&mut self, warning: Warning, err: &WatchError) {
        if self.warnings.raise(warning) {
            self.logger.warn(err.to_string());
        } else {
            debug!("Task {} still {}: {}", self.logger.index(), warning.key(), err);
        }
    }

    /// Supported images in the watch folder not yet handled by this loop,
    /// in directory listing order.
    async fn pending_files(&self, task: &Task) -> WatchResult<Vec<(String, PathBuf)>> {
        let mut entries = tokio::fs::read_dir(&task.watch_folder).await?;
        let mut pending = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_supported_image(&name) || self.processed.contains(&name) {
                continue;
            }
            // follows symlinks, like a plain "is this a file" check should
            let is_file = tokio::fs::metadata(entry.path())
                .await
                .is_ok_and(|m| m.is_file());
            if is_file {
                pending.push((name, entry.path()));
            }
        }

        Ok(pending)
    }

    async fn process_file(&mut self, task: &Task, name: &str, source: PathBuf) {
        let generated = random_name(&task.output_extension());

        match self.convert_one(task, &source, &generated).await {
            Ok(conversion) => {
                if let Err(e) = (self.remove_source)(&source) {
                    let err = WatchError::DeleteFailure {
                        file: name.to_string(),
                        reason: e.to_string(),
                    };
                    self.logger.warn(err.to_string());
                }
                self.processed.insert(name.to_string());
                debug!(
                    "{} → {} ({} bytes)",
                    conversion.source.display(),
                    conversion.output.display(),
                    conversion.bytes_written
                );
                self.logger.info(format!("✔ {name} → {generated}"));
            }
            Err(WatchError::Verification(_)) => {
                self.logger.error(format!("Failed to save {name}, original not deleted"));
            }
            Err(e) => {
                self.logger.error(format!("Error processing {name}: {e}"));
            }
        }
    }

    async fn convert_one(&self, task: &Task, source: &Path, generated: &str) -> WatchResult<Conversion> {
        let source = source.to_path_buf();
        let destination = task.output_folder.join(generated);
        let (width, height, format) = (task.width, task.height, task.output_format());

        let conversion = tokio::task::spawn_blocking(move || {
            convert(&source, &destination, width, height, format)
        })
        .await??;

        Ok(conversion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemorySink;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        watch: PathBuf,
        output: PathBuf,
        task: SharedTask,
        sink: Arc<MemorySink>,
        watcher: WatchLoop,
    }

    fn fixture(width: u32, height: u32, format: &str) -> Fixture {
        let root = TempDir::new().unwrap();
        let watch = root.path().join("watch");
        let output = root.path().join("output");
        std::fs::create_dir_all(&watch).unwrap();

        let task = Task::new("test", &watch, &output, width, height, format).into_shared();
        let sink = Arc::new(MemorySink::new());
        let watcher = WatchLoop::new(
            task.clone(),
            TaskLogger::new(1, sink.clone()),
            PollSettings::default(),
        );

        Fixture { _root: root, watch, output, task, sink, watcher }
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 180]))
            .save(dir.join(name))
            .unwrap();
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn converts_rgba_png_to_jpeg_and_removes_the_source() {
        let mut f = fixture(100, 50, "jpg");
        write_png(&f.watch, "photo.png", 200, 200);

        let pause = f.watcher.run_cycle().await;

        assert_eq!(pause, PollSettings::default().poll_interval);
        assert!(files_in(&f.watch).is_empty());

        let outputs = files_in(&f.output);
        assert_eq!(outputs.len(), 1);
        let output = &outputs[0];
        assert_eq!(output.extension().unwrap(), "jpg");
        assert_eq!(output.file_stem().unwrap().len(), 8);

        let image = image::open(output).unwrap();
        assert_eq!((image.width(), image.height()), (100, 50));
        assert!(!image.color().has_alpha());

        let generated = output.file_name().unwrap().to_str().unwrap();
        assert_eq!(
            f.sink.lines(),
            vec![format!("[Task 1] ✔ photo.png → {generated}")]
        );
    }

    #[tokio::test]
    async fn ignores_unsupported_files_and_directories() {
        let mut f = fixture(10, 10, "png");
        std::fs::write(f.watch.join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(f.watch.join("nested.png")).unwrap();

        f.watcher.run_cycle().await;

        assert!(files_in(&f.output).is_empty());
        assert!(f.sink.lines().is_empty());
        assert_eq!(files_in(&f.watch).len(), 2);
    }

    #[tokio::test]
    async fn failed_file_is_kept_and_retried_every_cycle() {
        let mut f = fixture(10, 10, "png");
        std::fs::write(f.watch.join("broken.jpg"), b"not an image").unwrap();

        f.watcher.run_cycle().await;
        f.watcher.run_cycle().await;

        assert!(f.watch.join("broken.jpg").exists());
        assert!(files_in(&f.output).is_empty());
        assert_eq!(f.sink.count_containing("Error processing broken.jpg"), 2);
        assert!(!f.watcher.processed.contains("broken.jpg"));
    }

    #[tokio::test]
    async fn processed_name_is_not_converted_again() {
        let mut f = fixture(16, 16, "png");
        write_png(&f.watch, "shot.png", 32, 32);
        f.watcher.run_cycle().await;
        assert_eq!(files_in(&f.output).len(), 1);

        // same name shows up again in the same loop lifetime
        write_png(&f.watch, "shot.png", 32, 32);
        f.watcher.run_cycle().await;

        assert_eq!(files_in(&f.output).len(), 1);
        assert!(f.watch.join("shot.png").exists());
        assert_eq!(f.sink.count_containing("✔ shot.png"), 1);
    }

    #[tokio::test]
    async fn undeletable_source_is_still_marked_processed() {
        let mut f = fixture(12, 12, "png");
        f.watcher.remove_source = |_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        write_png(&f.watch, "stuck.png", 24, 24);

        f.watcher.run_cycle().await;
        f.watcher.run_cycle().await;

        assert!(f.watch.join("stuck.png").exists());
        assert!(f.watcher.processed.contains("stuck.png"));
        assert_eq!(files_in(&f.output).len(), 1);
        assert_eq!(
            f.sink.count_containing("Could not remove source stuck.png: read-only"),
            1
        );
        assert_eq!(f.sink.count_containing("✔ stuck.png"), 1);
        assert_eq!(f.sink.lines().len(), 2);
    }

    #[tokio::test]
    async fn missing_watch_folder_warns_once_per_absence() {
        let mut f = fixture(10, 10, "png");
        std::fs::remove_dir(&f.watch).unwrap();

        for _ in 0..3 {
            let pause = f.watcher.run_cycle().await;
            assert_eq!(pause, PollSettings::default().missing_folder_interval);
        }
        assert_eq!(f.sink.count_containing("Watch folder is missing"), 1);
        assert_eq!(f.sink.lines().len(), 1);

        // folder comes back, then goes away again: a new onset
        std::fs::create_dir(&f.watch).unwrap();
        f.watcher.run_cycle().await;
        std::fs::remove_dir(&f.watch).unwrap();
        f.watcher.run_cycle().await;

        assert_eq!(f.sink.count_containing("Watch folder is missing"), 2);
    }

    #[tokio::test]
    async fn output_folder_is_created_on_demand() {
        let mut f = fixture(10, 10, "bmp");
        write_png(&f.watch, "a.png", 20, 20);
        assert!(!f.output.exists());

        f.watcher.run_cycle().await;

        assert!(f.output.is_dir());
        assert_eq!(files_in(&f.output).len(), 1);
    }

    #[tokio::test]
    async fn uncreatable_output_folder_warns_once() {
        let mut f = fixture(10, 10, "png");
        // a file where the output folder's parent should be
        let blocker = f.output.parent().unwrap().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        f.task.write().output_folder = blocker.join("out");
        write_png(&f.watch, "a.png", 20, 20);

        f.watcher.run_cycle().await;
        f.watcher.run_cycle().await;

        assert_eq!(
            f.sink.count_containing("Output folder is missing and cannot be created"),
            1
        );
        assert!(f.watch.join("a.png").exists());
    }

    #[tokio::test]
    async fn disabled_task_idles_without_touching_files() {
        let mut f = fixture(10, 10, "png");
        write_png(&f.watch, "wait.png", 20, 20);
        f.task.write().enabled = false;

        let pause = f.watcher.run_cycle().await;

        assert_eq!(pause, PollSettings::default().idle_interval);
        assert_eq!(f.watcher.control.state(), LoopState::Idle);
        assert!(f.watch.join("wait.png").exists());
        assert!(!f.output.exists());

        f.task.write().enabled = true;
        f.watcher.run_cycle().await;
        assert!(!f.watch.join("wait.png").exists());
    }

    #[tokio::test]
    async fn edits_apply_on_the_next_cycle() {
        let mut f = fixture(10, 10, "png");
        write_png(&f.watch, "first.png", 20, 20);
        f.watcher.run_cycle().await;

        {
            let mut task = f.task.write();
            task.width = 30;
            task.height = 12;
            task.format = "webp".into();
        }
        write_png(&f.watch, "second.png", 20, 20);
        f.watcher.run_cycle().await;

        let webp: Vec<_> = files_in(&f.output)
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "webp"))
            .collect();
        assert_eq!(webp.len(), 1);
        let image = image::open(&webp[0]).unwrap();
        assert_eq!((image.width(), image.height()), (30, 12));
    }

    #[tokio::test]
    async fn spawned_loop_logs_start_and_stop() {
        let f = fixture(10, 10, "png");
        let sink = f.sink.clone();
        let handle = f.watcher.spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.is_running());
        assert!(handle.stop(Duration::from_secs(5)).await);

        assert_eq!(
            sink.lines(),
            vec![
                "[Task 1] Watcher started (enabled=true)".to_string(),
                "[Task 1] Stopped watching".to_string(),
            ]
        );
    }
}
