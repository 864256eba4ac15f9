use std::fmt;
use std::sync::Arc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

/// Severity of a task log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of task activity.
///
/// Displays as `[Task <index>] <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// 1-based position of the task when its loop was started
    pub task_index: usize,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Task {}] {}", self.task_index, self.message)
    }
}

/// Receives task activity lines. Implementations must be cheap and must not block.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &LogEvent);
}

/// Forwards task activity to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: &LogEvent) {
        match event.level {
            LogLevel::Info => info!("{event}"),
            LogLevel::Warn => warn!("{event}"),
            LogLevel::Error => error!("{event}"),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Formatted lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    /// Number of lines containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.to_string().contains(needle))
            .count()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Tags lines with a task index before handing them to the sink.
#[derive(Clone)]
pub struct TaskLogger {
    index: usize,
    sink: Arc<dyn LogSink>,
}

impl TaskLogger {
    pub fn new(index: usize, sink: Arc<dyn LogSink>) -> Self {
        Self { index, sink }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message.into());
    }

    fn log(&self, level: LogLevel, message: String) {
        self.sink.emit(&LogEvent {
            task_index: self.index,
            level,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_the_task_index() {
        let sink = Arc::new(MemorySink::new());
        let logger = TaskLogger::new(3, sink.clone());

        logger.info("Watcher started (enabled=true)");
        logger.error("Error processing a.png: bad header");

        assert_eq!(
            sink.lines(),
            vec![
                "[Task 3] Watcher started (enabled=true)".to_string(),
                "[Task 3] Error processing a.png: bad header".to_string(),
            ]
        );
        assert_eq!(sink.events()[1].level, LogLevel::Error);
        assert_eq!(sink.count_containing("a.png"), 1);
    }

    #[test]
    fn event_serialises_for_frontends() {
        let event = LogEvent {
            task_index: 1,
            level: LogLevel::Warn,
            message: "Watch folder is missing: /in".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["taskIndex"], 1);
        assert_eq!(json["level"], "warn");
    }
}
