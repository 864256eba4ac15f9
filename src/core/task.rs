//! Watch task definition.

use std::path::PathBuf;
use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use crate::processing::OutputFormat;

pub const DEFAULT_WIDTH: u32 = 1366;
pub const DEFAULT_HEIGHT: u32 = 768;
pub const DEFAULT_FORMAT: &str = "png";

/// A task shared between the supervisor (writer) and its watch loop (reader).
///
/// The loop clones a snapshot at the top of every cycle, so edits apply from
/// the next cycle on.
pub type SharedTask = Arc<RwLock<Task>>;

/// One configured watch folder → output folder mapping.
///
/// This is the persisted shape; runtime state (whether a loop is running and
/// its handle) lives with the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Folder scanned for new images
    #[serde(default)]
    pub watch_folder: PathBuf,
    /// Folder converted images are written to
    #[serde(default)]
    pub output_folder: PathBuf,
    /// Target width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Target height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Whether the loop picks up files
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Output format name (png, jpg, jpeg, webp, bmp, tiff)
    #[serde(default = "default_format", alias = "fmt", deserialize_with = "format_or_default")]
    pub format: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_enabled() -> bool {
    true
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn format_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let format = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if format.trim().is_empty() {
        Ok(default_format())
    } else {
        Ok(format)
    }
}

impl Task {
    /// Creates an enabled task.
    pub fn new(
        name: impl Into<String>,
        watch_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        width: u32,
        height: u32,
        format: impl Into<String>,
    ) -> Self {
        let format = format.into();
        Self {
            name: name.into(),
            watch_folder: watch_folder.into(),
            output_folder: output_folder.into(),
            width,
            height,
            enabled: true,
            format: if format.is_empty() { default_format() } else { format },
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Encoder used for this task's output
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_name(&self.format)
    }

    /// Extension given to generated files.
    ///
    /// The format name itself when supported (so `jpeg` stays `jpeg`),
    /// otherwise `jpg`: an unknown name encodes as JPEG, and the file is named
    /// after its content rather than after the raw format string.
    pub fn output_extension(&self) -> String {
        let name = self.format.to_lowercase();
        if crate::utils::is_supported_format(&name) {
            name
        } else {
            self.output_format().primary_extension().to_string()
        }
    }

    /// True when switching from `self` to `other` needs the loop restarted
    pub fn needs_restart(&self, other: &Task) -> bool {
        self.watch_folder != other.watch_folder
            || self.output_folder != other.output_folder
            || self.width != other.width
            || self.height != other.height
            || self.format != other.format
    }

    pub fn into_shared(self) -> SharedTask {
        Arc::new(RwLock::new(self))
    }
}
