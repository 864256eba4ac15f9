//! Persisted task list and runtime tunables.

mod settings;
mod store;

pub use settings::PollSettings;
pub use store::{CONFIG_FILE, ConfigFile, ConfigStore, JsonConfigStore, MemoryStore};
