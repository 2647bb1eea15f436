//! Synchronization engine: polling, history loading and session lifecycle.

pub mod gate;
pub mod history;
pub mod ledger;
pub mod poller;
pub mod session;

// Re-export commonly used types
pub use gate::{EventGate, EventReceiver, SyncEvent};
pub use history::HistoryController;
pub use ledger::{create_shared_ledger, SharedLedger, SyncLedger, SyncLedgerStats};
pub use poller::{Poller, PollerState};
pub use session::{SessionSettings, SyncSession};

/// Errors from starting scheduled work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// `start` on a poller that is already running
    AlreadyRunning,
    /// A poll period of zero
    ZeroInterval,
    /// Called outside a Tokio runtime
    NoRuntime,
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::AlreadyRunning => write!(f, "Poller is already running"),
            ScheduleError::ZeroInterval => write!(f, "Poll interval must be greater than zero"),
            ScheduleError::NoRuntime => write!(f, "No Tokio runtime is active"),
        }
    }
}

impl std::error::Error for ScheduleError {}
