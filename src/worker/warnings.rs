use std::collections::HashSet;

/// Conditions whose warning is logged once per onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    WatchFolderMissing,
    OutputFolderMissing,
}

impl Warning {
    pub fn key(&self) -> &'static str {
        match self {
            Self::WatchFolderMissing => "watch_folder_missing",
            Self::OutputFolderMissing => "output_folder_missing",
        }
    }
}

/// Currently active warnings for one loop.
#[derive(Debug, Default)]
pub struct WarningState {
    active: HashSet<Warning>,
}

impl WarningState {
    /// Marks `warning` active. Returns true only on onset, i.e. when it should be logged.
    pub fn raise(&mut self, warning: Warning) -> bool {
        self.active.insert(warning)
    }

    /// The condition resolved; the next occurrence is a new onset.
    pub fn clear(&mut self, warning: Warning) {
        self.active.remove(&warning);
    }
}
