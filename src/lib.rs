// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod config;
pub mod processing;
pub mod worker;

// Public exports for external consumers
pub use crate::core::{LogEvent, LogLevel, LogSink, MemorySink, SharedTask, Task, TracingSink};
pub use crate::config::{ConfigStore, JsonConfigStore, MemoryStore, PollSettings};
pub use crate::processing::{OutputFormat, convert, random_name};
pub use crate::utils::{FetchError, FetchResult, ValidationError};
pub use crate::worker::{LoopState, Supervisor, WatchError};
