mod error;
mod handle;
mod supervisor;
mod warnings;
mod watch_loop;

pub use error::{WatchError, WatchResult};
pub use handle::{LoopControl, LoopHandle, LoopState};
pub use supervisor::Supervisor;
pub use warnings::{Warning, WarningState};
pub use watch_loop::WatchLoop;
