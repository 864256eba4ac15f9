//! Task list persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::core::Task;
use crate::utils::{FetchError, FetchResult};

/// Default config file name, relative to the working directory
pub const CONFIG_FILE: &str = "fetchx_config.json";

/// On-disk shape of the config: `{"tasks": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ConfigFile {
    /// Pretty JSON with four-space indentation
    pub fn to_json(&self) -> FetchResult<String> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| FetchError::config(e.to_string()))
    }

    pub fn from_json(json: &str) -> FetchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where the supervisor loads its task list from and saves it to.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> FetchResult<Vec<Task>>;
    fn save(&self, tasks: &[Task]) -> FetchResult<()>;
}

/// Stores the task list as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    /// A missing file is an empty task list.
    fn load(&self) -> FetchResult<Vec<Task>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(FetchError::config(format!(
                    "Cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        Ok(ConfigFile::from_json(&json)?.tasks)
    }

    fn save(&self, tasks: &[Task]) -> FetchResult<()> {
        let json = ConfigFile { tasks: tasks.to_vec() }.to_json()?;
        std::fs::write(&self.path, json)
            .map_err(|e| FetchError::config(format!("Cannot write {}: {e}", self.path.display())))?;
        debug!("Saved {} task(s) to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

/// Keeps the task list in memory. Counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> FetchResult<Vec<Task>> {
        Ok(self.snapshot())
    }

    fn save(&self, tasks: &[Task]) -> FetchResult<()> {
        *self.tasks.lock() = tasks.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(dir.path().join(CONFIG_FILE));
        assert_eq!(store.load().unwrap(), Vec::<Task>::new());
    }

    #[test]
    fn saved_tasks_load_back() {
        let dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(dir.path().join(CONFIG_FILE));
        let tasks = vec![
            Task::new("one", "/a", "/b", 100, 50, "jpg"),
            Task::new("two", "/c", "/d", 1920, 1080, "webp").with_enabled(false),
        ];

        store.save(&tasks).unwrap();

        assert_eq!(store.load().unwrap(), tasks);
        let written = std::fs::read_to_string(store.path()).unwrap();
        assert!(written.starts_with("{\n    \"tasks\": ["));
    }

    #[test]
    fn partial_records_fill_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"tasks": [{"name": "old", "watch_folder": "/in", "output_folder": "/out"}]}"#,
        )
        .unwrap();

        let tasks = JsonConfigStore::new(&path).load().unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!((tasks[0].width, tasks[0].height), (1366, 768));
        assert_eq!(tasks[0].format, "png");
        assert!(tasks[0].enabled);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonConfigStore::new(&path).load(),
            Err(FetchError::Config(_))
        ));
    }

    #[test]
    fn object_without_tasks_is_empty() {
        assert_eq!(ConfigFile::from_json("{}").unwrap(), ConfigFile::default());
    }
}
