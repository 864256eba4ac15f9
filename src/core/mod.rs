//! Core types shared by the converter, the watch loops and the supervisor.
//!
//! - [`Task`]: one configured watch → output mapping
//! - [`SharedTask`]: a task as read live by its watch loop
//! - [`LogEvent`] / [`LogSink`]: the `[Task n] ...` activity stream

mod task;
mod events;

pub use task::{Task, SharedTask, DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_FORMAT};
pub use events::{LogEvent, LogLevel, LogSink, TracingSink, MemorySink, TaskLogger};
