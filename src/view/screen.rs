//! Presentation state for the live and history screens.
//!
//! Screens fold [`SyncEvent`]s into renderable state in the order they are
//! received. Events meant for the other screen are ignored.

use crate::api::HistoryWindow;
use crate::sync::SyncEvent;
use crate::view::reducers::{history_rows, realtime_view, stats_view, HistoryRow, RealtimeView, StatsView};

/// State behind the live screen.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveScreen {
    pub realtime: RealtimeView,
    /// `None` until the first stats response
    pub stats: Option<StatsView>,
    /// Latest user-visible failure, cleared by the next successful prediction
    pub notice: Option<String>,
    /// Number of events that changed this screen
    pub updates: u64,
}

impl LiveScreen {
    pub fn new() -> Self {
        Self {
            realtime: RealtimeView::waiting(),
            stats: None,
            notice: None,
            updates: 0,
        }
    }

    /// Apply one event. Returns true if the screen changed.
    pub fn apply(&mut self, event: &SyncEvent) -> bool {
        match event {
            SyncEvent::Realtime(prediction) => {
                self.realtime = realtime_view(prediction);
                self.notice = None;
            }
            SyncEvent::RealtimeFailed(error) => {
                self.notice = Some(format!("Error: {error}"));
            }
            SyncEvent::Stats(stats) => {
                self.stats = Some(stats_view(stats));
            }
            SyncEvent::HistoryLoaded { .. }
            | SyncEvent::HistoryEmpty { .. }
            | SyncEvent::HistoryFailed { .. } => return false,
        }
        self.updates += 1;
        true
    }
}

impl Default for LiveScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Load status of the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStatus {
    Idle,
    Loading,
    Loaded,
    /// Window has no records ("No records found")
    Empty,
    Failed(String),
}

/// State behind the history screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryScreen {
    pub window: HistoryWindow,
    pub rows: Vec<HistoryRow>,
    pub status: HistoryStatus,
}

impl HistoryScreen {
    pub fn new(window: HistoryWindow) -> Self {
        Self {
            window,
            rows: Vec::new(),
            status: HistoryStatus::Idle,
        }
    }

    /// Mark a load of `window` as started (the refresh spinner).
    pub fn begin_load(&mut self, window: HistoryWindow) {
        self.window = window;
        self.status = HistoryStatus::Loading;
    }

    pub fn is_loading(&self) -> bool {
        self.status == HistoryStatus::Loading
    }

    /// Apply one event. Returns true if the screen changed.
    pub fn apply(&mut self, event: &SyncEvent) -> bool {
        match event {
            SyncEvent::HistoryLoaded { window, result } => {
                self.window = *window;
                self.rows = history_rows(result);
                self.status = HistoryStatus::Loaded;
            }
            SyncEvent::HistoryEmpty { window } => {
                self.window = *window;
                self.rows.clear();
                self.status = HistoryStatus::Empty;
            }
            SyncEvent::HistoryFailed { window, error } => {
                // Keep the rows already on screen.
                self.window = *window;
                self.status = HistoryStatus::Failed(format!("Error: {error}"));
            }
            SyncEvent::Realtime(_) | SyncEvent::RealtimeFailed(_) | SyncEvent::Stats(_) => {
                return false
            }
        }
        true
    }
}
